use application::dto::RevokeRefreshTokenRequestDto;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::{
    ClientIp, REFRESH_COOKIE, cancellation, removal_cookie,
};

/// Optional body. Without one, the refresh cookie is revoked.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub refresh_token: Option<String>,
    pub reason: Option<String>,
}

/// Handler to revoke a refresh token (logout).
pub async fn handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, StatusCode)> {
    let body: Body = if body.is_empty() {
        Body::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ServerError::ParsingForm(Box::new(err)))?
    };

    let refresh_token = body
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned()))
        .unwrap_or_default();
    let (cancellation, _guard) = cancellation();

    state
        .revoke_refresh_token
        .execute(
            RevokeRefreshTokenRequestDto {
                refresh_token,
                ip_address,
                reason: body.reason,
            },
            &cancellation,
        )
        .await?;

    Ok((jar.remove(removal_cookie()), StatusCode::NO_CONTENT))
}
