//! Interface for credential issuance.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domain::identity::ip::IpAddress;

use crate::error::Result;

/// Claims carried by an access token, by name.
///
/// An empty set means the token is not authenticated.
pub type Claims = BTreeMap<String, String>;

/// Claim holding the user id.
pub const SUBJECT_CLAIM: &str = "sub";
/// Claim holding the user email.
pub const EMAIL_CLAIM: &str = "email";

/// Freshly generated refresh token, not yet attached to a user.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshTokenMaterial {
    pub token: String,
    pub expires: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub created_by_ip: IpAddress,
}

impl std::fmt::Debug for RefreshTokenMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenMaterial")
            .field("token", &"[REDACTED]")
            .field("expires", &self.expires)
            .field("created", &self.created)
            .field("created_by_ip", &self.created_by_ip)
            .finish()
    }
}

/// Port for signing and validating access tokens and generating refresh
/// tokens.
pub trait CredentialIssuer: Send + Sync {
    /// Sign an access token valid strictly between `not_before` and
    /// `expires`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ApplicationError::PrivateKeyMissing`] if no
    /// signing key is configured.
    fn generate_access_token(
        &self,
        not_before: DateTime<Utc>,
        expires: DateTime<Utc>,
        claims: &Claims,
    ) -> Result<String>;

    /// Verify an access token and return its claims.
    ///
    /// Never fails: malformed, forged, expired or not yet valid tokens all
    /// yield an empty set.
    fn validate_access_token(&self, token: &str) -> Claims;

    /// Generate a new random refresh token.
    fn generate_refresh_token(
        &self,
        expires: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<RefreshTokenMaterial>;
}
