//! Access token validation use case implementation.

use crate::ports::inbound::ValidateAccessToken;
use crate::ports::outbound::{Claims, CredentialIssuer};

/// Access token validation use case service.
pub struct ValidateAccessTokenUseCase {
    issuer: Box<dyn CredentialIssuer>,
}

impl ValidateAccessTokenUseCase {
    pub fn new(issuer: Box<dyn CredentialIssuer>) -> Self {
        Self { issuer }
    }
}

impl ValidateAccessToken for ValidateAccessTokenUseCase {
    fn execute(&self, token: &str) -> Claims {
        let claims = self.issuer.validate_access_token(token);
        if claims.is_empty() {
            tracing::debug!("rejected access token");
        }
        claims
    }
}
