use application::dto::ObtainExternalTokenRequestDto;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::{Valid, cancellation};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 2048, message = "Code is too long."))]
    pub code: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub access_token: String,
    pub is_new: bool,
}

/// Handler to exchange a VK authorization code.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let (cancellation, _guard) = cancellation();

    let response = state
        .obtain_external_token
        .execute(ObtainExternalTokenRequestDto { code: body.code }, &cancellation)
        .await?;

    Ok(Json(Response {
        access_token: response.access_token,
        is_new: response.is_new,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use sqlx::{Pool, Postgres};

    use crate::*;

    #[sqlx::test]
    async fn test_vk_without_credentials(pool: Pool<Postgres>) {
        let app = app(router::state(pool));

        let response = make_request(
            app,
            Method::POST,
            "/api/auth/token/vk",
            json!({ "code": "" }).to_string(),
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
        assert_eq!(
            fields,
            ["code", "client_id", "client_secret", "redirect_uri"]
        );
    }
}
