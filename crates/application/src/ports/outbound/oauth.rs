//! External OAuth provider port.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Client credentials registered with the provider.
#[derive(Clone, Default)]
pub struct OAuthCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Token returned by the provider for an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAccessToken {
    pub access_token: String,
    /// Lifetime in seconds, `0` for a non-expiring token.
    pub expires_in: u64,
    /// Provider-side user id.
    pub user_id: String,
    pub email: Option<String>,
}

/// Port for exchanging an authorization code with an OAuth provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange `code` for an access token.
    ///
    /// All credential fields are present when this is called.
    async fn get_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
        cancellation: &CancellationToken,
    ) -> Result<ExternalAccessToken>;
}
