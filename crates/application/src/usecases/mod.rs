//! Application services implementing business logic.

use chrono::{DateTime, Duration, Utc};
use domain::auth::refresh_token::{RefreshToken, RefreshTokenId};
use domain::identity::user::User;

use crate::dto::{RefreshTokenPayload, TokenPairDto};
use crate::error::Result;
use crate::ports::outbound::{
    Claims, CredentialIssuer, EMAIL_CLAIM, SUBJECT_CLAIM,
};

pub mod authorize;
pub mod get_user;
pub mod obtain_external_token;
pub mod refresh_tokens;
pub mod register;
pub mod revoke_refresh_token;
pub mod validate_token;

#[cfg(test)]
pub(crate) mod fakes;

pub use authorize::*;
pub use get_user::*;
pub use obtain_external_token::*;
pub use refresh_tokens::*;
pub use register::*;
pub use revoke_refresh_token::*;
pub use validate_token::*;

/// Lifetimes of issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::hours(24),
        }
    }
}

/// Mint an access token and a refresh token for `user`.
///
/// The refresh token is returned as an entity, not yet owned by the user.
pub(crate) fn issue_token_pair(
    issuer: &dyn CredentialIssuer,
    user: &User,
    now: DateTime<Utc>,
    lifetimes: TokenLifetimes,
    ip: Option<&str>,
) -> Result<(TokenPairDto, RefreshToken)> {
    let claims = Claims::from([
        (SUBJECT_CLAIM.to_owned(), user.id().to_string()),
        (EMAIL_CLAIM.to_owned(), user.email().to_string()),
    ]);
    let access_token_expires = now + lifetimes.access;
    let access_token =
        issuer.generate_access_token(now, access_token_expires, &claims)?;

    let material =
        issuer.generate_refresh_token(now + lifetimes.refresh, ip)?;
    let refresh_token = RefreshToken::create(
        RefreshTokenId::create(material.token.clone())?,
        material.expires,
        material.created,
        material.created_by_ip,
    );

    let pair = TokenPairDto {
        access_token,
        access_token_expires,
        refresh_token: RefreshTokenPayload {
            token: material.token,
            expires: material.expires,
        },
    };

    Ok((pair, refresh_token))
}
