//! Data Transfer Objects for the application layer.
//!
//! DTOs are used to transfer data between layers without exposing domain
//! entities.

use chrono::{DateTime, Utc};
use domain::identity::user::User;
use serde::Serialize;

/// Request DTO for account registration.
#[derive(Debug, Clone)]
pub struct RegisterRequestDto {
    /// Login (5 to 255 characters).
    pub login: String,
    /// Plain-text password, hashed before storage.
    pub password: String,
    /// Email address.
    pub email: String,
}

/// Request DTO for password authentication.
#[derive(Debug, Clone)]
pub struct AuthorizeRequestDto {
    pub login: String,
    pub password: String,
    /// Client IP address.
    pub ip_address: Option<String>,
}

/// Refresh token handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenPayload {
    /// Opaque token value.
    pub token: String,
    /// Expiration date, used for the cookie lifetime.
    pub expires: DateTime<Utc>,
}

/// Response DTO for any flow issuing a new pair of tokens.
#[derive(Debug, Clone)]
pub struct TokenPairDto {
    /// Access token (JWT).
    pub access_token: String,
    /// Access token expiration date.
    pub access_token_expires: DateTime<Utc>,
    /// New refresh token.
    pub refresh_token: RefreshTokenPayload,
}

/// Request DTO for refresh token rotation.
#[derive(Debug, Clone)]
pub struct RefreshTokensRequestDto {
    /// The presented refresh token.
    pub refresh_token: String,
    /// Client IP address.
    pub ip_address: Option<String>,
}

/// Request DTO for explicit refresh token revocation (logout).
#[derive(Debug, Clone)]
pub struct RevokeRefreshTokenRequestDto {
    pub refresh_token: String,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Free-form reason, `not_specified` if absent.
    pub reason: Option<String>,
}

/// Request DTO for the VK authorization code exchange.
#[derive(Debug, Clone)]
pub struct ObtainExternalTokenRequestDto {
    /// Authorization code returned by VK to the redirect URI.
    pub code: String,
}

/// Response DTO for the VK authorization code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObtainExternalTokenResponseDto {
    /// Access token issued by VK.
    pub access_token: String,
    /// Whether a user was created by this exchange.
    pub is_new: bool,
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub login: Option<String>,
    pub registration_date: DateTime<Utc>,
    pub authorization_date: DateTime<Utc>,
    /// Whether a VK account is linked.
    pub vk_linked: bool,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().to_string(),
            login: user.login().map(ToString::to_string),
            registration_date: user.registration_date().value(),
            authorization_date: user.authorization_date().value(),
            vk_linked: user.vk_user().is_some(),
        }
    }
}
