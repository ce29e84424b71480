//! Users-related HTTP API.

use application::dto::UserDto;
use application::ports::outbound::SUBJECT_CLAIM;
use axum::extract::{Path, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};

use crate::AppState;
use crate::error::{Result, ServerError};

const BEARER: &str = "Bearer ";

/// Subject of the validated access token.
#[derive(Debug, Clone)]
pub struct Subject(pub String);

/// Custom middleware for authentification.
async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix(BEARER))
        .ok_or(ServerError::Unauthorized)?;

    let mut claims = state.validate_token.execute(token.trim());
    let subject = claims
        .remove(SUBJECT_CLAIM)
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert(Subject(subject));
    Ok(next.run(req).await)
}

/// Handler returning the authenticated user.
async fn me(
    State(state): State<AppState>,
    Extension(Subject(id)): Extension<Subject>,
) -> Result<Json<UserDto>> {
    let user = state.get_user.execute(&id).await?;
    Ok(Json(user))
}

/// Handler returning any user by id.
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>> {
    let user = state
        .get_user
        .execute(&id)
        .await
        .map_err(ServerError::lookup)?;
    Ok(Json(user))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /api/users/me` goes to `me`. Authorization required.
        .route("/me", get(me))
        // `GET /api/users/{id}` goes to `get_by_id`. Authorization required.
        .route("/{id}", get(get_by_id))
        .route_layer(middleware::from_fn_with_state(state, auth))
}
