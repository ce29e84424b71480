//! Error handler for passage.

use application::error::ApplicationError;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use domain::error::{DomainError, Violations};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("error parsing form data")]
    ParsingForm(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("user not found")]
    NotFound,

    #[error("invalid 'Authorization' header")]
    Unauthorized,

    #[error("missing refresh token cookie")]
    MissingRefreshToken,
}

impl ServerError {
    /// Same as `From<ApplicationError>`, but an unknown user is a 404 rather
    /// than an authentication failure.
    pub fn lookup(err: ApplicationError) -> Self {
        match err {
            ApplicationError::UserNotFound => Self::NotFound,
            err => Self::Application(err),
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// List every domain rule broken by the request.
    pub fn violations<'a>(
        mut self,
        violations: impl IntoIterator<Item = &'a DomainError>,
    ) -> Self {
        self.errors = Some(
            violations
                .into_iter()
                .map(|err| FieldError {
                    field: err.field().to_owned(),
                    message: err.to_string(),
                })
                .collect(),
        );
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/problem+json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

fn unauthorized(detail: &str) -> ResponseError {
    ResponseError::default()
        .title("Authentication failed.")
        .details(detail)
        .status(StatusCode::UNAUTHORIZED)
}

fn conflict(detail: &str) -> ResponseError {
    ResponseError::default()
        .title("The request conflicts with the current state.")
        .details(detail)
        .status(StatusCode::CONFLICT)
}

fn application_response(err: &ApplicationError) -> ResponseError {
    let detail = err.to_string();
    let invalid = ResponseError::default()
        .title("There were validation errors with your request.")
        .details(&detail)
        .status(StatusCode::BAD_REQUEST);

    match err {
        ApplicationError::Validation(violations) => {
            with_violations(invalid, violations)
        },
        ApplicationError::Domain(DomainError::RevokingTokenNotFound) => {
            unauthorized(&detail)
        },
        ApplicationError::Domain(err) if err.is_conflict() => {
            conflict(&detail).violations([err])
        },
        ApplicationError::Domain(err) => invalid.violations([err]),

        ApplicationError::UserNotFound
        | ApplicationError::InvalidCredentials
        | ApplicationError::RefreshTokenReused
        | ApplicationError::RefreshTokenExpired => unauthorized(&detail),

        ApplicationError::ConcurrentRevocation => conflict(&detail),

        ApplicationError::Cancelled => ResponseError::default()
            .title("Request cancelled.")
            .details(&detail)
            .status(StatusCode::REQUEST_TIMEOUT),

        ApplicationError::OAuthProvider { .. } => ResponseError::default()
            .title("OAuth provider rejected the exchange.")
            .details(&detail)
            .status(StatusCode::BAD_GATEWAY),

        ApplicationError::PrivateKeyMissing
        | ApplicationError::Internal(_) => {
            tracing::error!(err = %detail, "server returned 500 status");
            ResponseError::default()
        },
    }
}

fn with_violations(
    response: ResponseError,
    violations: &Violations,
) -> ResponseError {
    let response = response.violations(violations.iter());
    if violations.has_conflict() {
        response
            .title("The request conflicts with the current state.")
            .status(StatusCode::CONFLICT)
    } else {
        response
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Application(err) => application_response(err),

            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::ParsingForm(err) => response
                .title("Server error during data parsing.")
                .details(&err.to_string()),

            ServerError::Axum(rejection) => response
                .details(&rejection.body_text())
                .status(rejection.status()),

            ServerError::NotFound => response
                .title("Resource not found.")
                .status(StatusCode::NOT_FOUND),

            ServerError::Unauthorized => response
                .title("Missing or invalid 'Authorization' header.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::MissingRefreshToken => {
                unauthorized(&self.to_string())
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/problem+json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
