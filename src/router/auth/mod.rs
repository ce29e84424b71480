//! Authentication HTTP API, mounted on `/api/auth`.
pub mod authorize;
pub mod refresh;
pub mod register;
pub mod revoke;
pub mod vk;

use axum::Router;
use axum::routing::post;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Body returned by every route issuing an access token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /api/auth/register` goes to `register`.
        .route("/register", post(register::handler))
        // `POST /api/auth/authorize` goes to `authorize`.
        .route("/authorize", post(authorize::handler))
        // `POST /api/auth/refresh` rotates the refresh token cookie.
        .route("/refresh", post(refresh::handler))
        .route("/revoke_refresh_token", post(revoke::handler))
        // `POST /api/auth/token/vk` exchanges a VK authorization code.
        .route("/token/vk", post(vk::handler))
}
