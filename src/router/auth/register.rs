use application::dto::RegisterRequestDto;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, cancellation};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    pub login: String,
    #[validate(length(max = 1024, message = "Password is too long."))]
    pub password: String,
    pub email: String,
}

/// Handler to create a password account.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode> {
    let (cancellation, _guard) = cancellation();

    state
        .register
        .execute(
            RegisterRequestDto {
                login: body.login,
                password: body.password,
                email: body.email,
            },
            &cancellation,
        )
        .await?;

    Ok(StatusCode::CREATED)
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::http::Method;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use sqlx::{Pool, Postgres};

    use super::*;
    use crate::*;

    pub const PASSWORD: &str = "correct horse battery";

    /// Register `login` with a derived email.
    pub async fn register(app: axum::Router, login: &str) -> StatusCode {
        let body = Body {
            login: login.into(),
            password: PASSWORD.into(),
            email: format!("{login}@passage.local"),
        };

        make_request(
            app,
            Method::POST,
            "/api/auth/register",
            json!(body).to_string(),
            &[],
        )
        .await
        .status()
    }

    #[sqlx::test]
    async fn test_register_handler(pool: Pool<Postgres>) {
        let state = router::state(pool);

        assert_eq!(
            register(app(state.clone()), "alice01").await,
            StatusCode::CREATED
        );
        assert_eq!(
            register(app(state), "alice01").await,
            StatusCode::CONFLICT
        );
    }

    #[sqlx::test]
    async fn test_register_lists_every_violation(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/register",
            json!({ "login": "abc", "password": " ", "email": "nope" })
                .to_string(),
            &[],
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|err| err["field"].as_str())
            .collect();
        assert!(fields.contains(&"login"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[sqlx::test]
    async fn test_register_rejects_huge_password(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/register",
            json!({
                "login": "alice01",
                "password": "a".repeat(2048),
                "email": "alice@passage.local",
            })
            .to_string(),
            &[],
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
