//! VK authorization code exchange over HTTPS.

use std::time::Duration;

use application::error::{ApplicationError, Result, ToInternal};
use application::ports::outbound::{ExternalAccessToken, OAuthProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

const DEFAULT_ENDPOINT: &str = "https://oauth.vk.com/access_token";
const TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct AccessTokenPayload {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: u64,
    user_id: i64,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenError {
    error: Option<String>,
    error_description: Option<String>,
}

/// VK OAuth client.
pub struct VkOAuthClient {
    http: Client,
    endpoint: String,
}

impl VkOAuthClient {
    /// Create a new [`VkOAuthClient`] talking to VK.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client for another token endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(TIMEOUT).build().catch()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
    ) -> Result<ExternalAccessToken> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", redirect_uri),
                ("code", code),
            ])
            .send()
            .await
            .catch()?;

        let status = response.status();
        let body = response.bytes().await.catch()?;

        interpret(status, &body)
    }
}

/// Turn a token endpoint response into a token or a provider error.
fn interpret(status: StatusCode, body: &[u8]) -> Result<ExternalAccessToken> {
    if !status.is_success() {
        let error: AccessTokenError = serde_json::from_slice(body).catch()?;
        tracing::warn!(%status, ?error, "vk refused authorization code");

        return Err(ApplicationError::OAuthProvider {
            error: error.error.unwrap_or_else(|| status.to_string()),
            description: error
                .error_description
                .unwrap_or_else(|| "empty error description".into()),
        });
    }

    let payload: AccessTokenPayload = serde_json::from_slice(body).catch()?;
    let access_token = payload.access_token.ok_or_else(|| {
        ApplicationError::OAuthProvider {
            error: "invalid_response".into(),
            description: "access_token missing".into(),
        }
    })?;

    Ok(ExternalAccessToken {
        access_token,
        expires_in: payload.expires_in,
        user_id: payload.user_id.to_string(),
        email: payload.email.filter(|email| !email.trim().is_empty()),
    })
}

#[async_trait]
impl OAuthProvider for VkOAuthClient {
    #[tracing::instrument(skip_all)]
    async fn get_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
        cancellation: &CancellationToken,
    ) -> Result<ExternalAccessToken> {
        let exchange =
            self.exchange(client_id, client_secret, redirect_uri, code);

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(ApplicationError::Cancelled),
            result = exchange => result,
        }
    }
}
