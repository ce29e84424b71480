use application::dto::RefreshTokensRequestDto;
use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;

use super::AccessTokenResponse;
use crate::AppState;
use crate::error::{Result, ServerError};
use crate::router::{ClientIp, REFRESH_COOKIE, cancellation, refresh_cookie};

/// Handler to rotate the refresh token cookie.
pub async fn handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AccessTokenResponse>)> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(ServerError::MissingRefreshToken)?;
    let (cancellation, _guard) = cancellation();

    let tokens = state
        .refresh_tokens
        .execute(
            RefreshTokensRequestDto {
                refresh_token,
                ip_address,
            },
            &cancellation,
        )
        .await?;

    Ok((
        jar.add(refresh_cookie(&tokens.refresh_token)),
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}
