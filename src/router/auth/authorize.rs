use application::dto::AuthorizeRequestDto;
use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AccessTokenResponse;
use crate::AppState;
use crate::error::Result;
use crate::router::{ClientIp, Valid, cancellation, refresh_cookie};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    pub login: String,
    #[validate(length(max = 1024, message = "Password is too long."))]
    pub password: String,
}

/// Handler to sign in with login and password.
pub async fn handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    jar: CookieJar,
    Valid(body): Valid<Body>,
) -> Result<(CookieJar, Json<AccessTokenResponse>)> {
    let (cancellation, _guard) = cancellation();

    let tokens = state
        .authorize
        .execute(
            AuthorizeRequestDto {
                login: body.login,
                password: body.password,
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

#[cfg(test)]
pub(crate) mod tests {
    use application::ports::outbound::SUBJECT_CLAIM;
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::json;
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::router::REFRESH_COOKIE;
    use crate::router::auth::register::tests::{PASSWORD, register};
    use crate::*;

    /// Value of the refresh cookie set by `response`.
    pub fn cookie_value(
        response: &axum::http::Response<axum::body::Body>,
    ) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| {
                axum_extra::extract::cookie::Cookie::parse(value.to_owned())
                    .ok()
            })
            .find(|cookie| cookie.name() == REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_owned())
    }

    /// Sign `login` in and return the access token and refresh cookie.
    pub async fn sign_in(app: axum::Router, login: &str) -> (String, String) {
        let response = make_request(
            app,
            Method::POST,
            "/api/auth/authorize",
            json!({ "login": login, "password": PASSWORD }).to_string(),
            &[],
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let refresh = cookie_value(&response).unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: AccessTokenResponse = serde_json::from_slice(&body).unwrap();

        (body.access_token, refresh)
    }

    #[sqlx::test]
    async fn test_authorize_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);
        assert_eq!(
            register(app(state.clone()), "alice01").await,
            StatusCode::CREATED
        );

        let (access_token, refresh) =
            sign_in(app(state.clone()), " ALICE01 ").await;

        assert!(!refresh.is_empty());
        let claims = state.validate_token.execute(&access_token);
        assert!(claims.contains_key(SUBJECT_CLAIM));
    }

    #[sqlx::test]
    async fn test_authorize_sets_cookie_attributes(pool: Pool<Postgres>) {
        let state = router::state(pool);
        register(app(state.clone()), "alice01").await;

        let response = make_request(
            app(state),
            Method::POST,
            "/api/auth/authorize",
            json!({ "login": "alice01", "password": PASSWORD }).to_string(),
            &[],
        )
        .await;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/api/auth"));
    }

    #[sqlx::test]
    async fn test_authorize_wrong_password(pool: Pool<Postgres>) {
        let state = router::state(pool);
        register(app(state.clone()), "alice01").await;

        let response = make_request(
            app(state),
            Method::POST,
            "/api/auth/authorize",
            json!({ "login": "alice01", "password": "wrong" }).to_string(),
            &[],
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(cookie_value(&response).is_none());
    }
}
