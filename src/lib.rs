//! Passage issues JWT access tokens and rotates opaque refresh tokens.
#![forbid(unsafe_code)]

pub mod database;
mod router;

pub mod config;
pub mod error;
pub mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adapters::outbound::clock::SystemClock;
use adapters::outbound::crypto::Argon2PasswordHasher;
use adapters::outbound::jwt::JwtCredentialIssuer;
use adapters::outbound::oauth::VkOAuthClient;
use adapters::outbound::persistence::postgres::{
    PgUsersCommands, PgUsersQueries,
};
use adapters::outbound::telemetry::TracingTelemetry;
use application::error::ApplicationError;
use application::ports::inbound::{
    Authorize, GetUserById, ObtainExternalToken, RefreshTokens, Register,
    RevokeRefreshToken, ValidateAccessToken,
};
use application::ports::outbound::OAuthCredentials;
use application::usecases::{
    AuthorizeUseCase, GetUserByIdUseCase, ObtainExternalTokenUseCase,
    RefreshTokensUseCase, RegisterUseCase, RevokeRefreshTokenUseCase,
    ValidateAccessTokenUseCase,
};
use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::config::Configuration;
use crate::database::Database;

/// Environment variable overriding the `config.yaml` location.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
    headers: &[(header::HeaderName, &str)],
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        request = request.header(name, *value);
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub db: Database,
    pub register: Arc<dyn Register>,
    pub authorize: Arc<dyn Authorize>,
    pub refresh_tokens: Arc<dyn RefreshTokens>,
    pub revoke_refresh_token: Arc<dyn RevokeRefreshToken>,
    pub obtain_external_token: Arc<dyn ObtainExternalToken>,
    pub get_user: Arc<dyn GetUserById>,
    pub validate_token: Arc<dyn ValidateAccessToken>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire every use case to its adapters.
    ///
    /// Fails if the `token` section is missing or its keys are unreadable.
    pub fn new(
        config: Arc<Configuration>,
        db: Database,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let Some(token) = &config.token else {
            return Err("missing `token` entry on `config.yaml` file".into());
        };
        let public_key = token.public_key()?;
        let private_key = token.private_key()?;
        if private_key.is_none() {
            tracing::warn!("no private key configured, tokens cannot be issued");
        }

        let issuer = || -> Result<Box<JwtCredentialIssuer>, ApplicationError> {
            let mut issuer =
                JwtCredentialIssuer::new(&public_key, private_key.as_deref())?;
            if let Some(kid) = &token.key_id {
                issuer = issuer.with_key_id(kid);
            }
            if let Some(iss) = &token.issuer {
                issuer = issuer.with_issuer(iss);
            }
            if let Some(aud) = &token.audience {
                issuer = issuer.with_audience(aud);
            }
            Ok(Box::new(issuer))
        };
        let argon2 = config.argon2.clone().unwrap_or_default();
        let hasher = || {
            Argon2PasswordHasher::new(
                argon2.memory_cost,
                argon2.iterations,
                argon2.parallelism,
            )
            .map(Box::new)
        };
        let pool = &db.postgres;
        let queries = || Box::new(PgUsersQueries::new(pool.clone()));
        let commands = || Box::new(PgUsersCommands::new(pool.clone()));
        let clock = || Box::new(SystemClock::new());
        let telemetry = || Box::new(TracingTelemetry::new());
        let lifetimes = token.lifetimes();

        let vk = config.vk.clone().unwrap_or_default();
        let provider = match &vk.endpoint {
            Some(endpoint) => VkOAuthClient::with_endpoint(endpoint.as_str())?,
            None => VkOAuthClient::new()?,
        };

        Ok(Self {
            register: Arc::new(RegisterUseCase::new(
                queries(),
                commands(),
                hasher()?,
                clock(),
                telemetry(),
            )),
            authorize: Arc::new(AuthorizeUseCase::new(
                queries(),
                commands(),
                hasher()?,
                issuer()?,
                clock(),
                telemetry(),
                lifetimes,
            )),
            refresh_tokens: Arc::new(RefreshTokensUseCase::new(
                queries(),
                commands(),
                issuer()?,
                clock(),
                telemetry(),
                lifetimes,
            )),
            revoke_refresh_token: Arc::new(RevokeRefreshTokenUseCase::new(
                queries(),
                commands(),
                clock(),
            )),
            obtain_external_token: Arc::new(ObtainExternalTokenUseCase::new(
                queries(),
                commands(),
                Box::new(provider),
                OAuthCredentials::from(&vk),
                clock(),
                telemetry(),
            )),
            get_user: Arc::new(GetUserByIdUseCase::new(queries())),
            validate_token: Arc::new(ValidateAccessTokenUseCase::new(
                issuer()?,
            )),
            config,
            db,
            metrics,
        })
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(
                    |chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                        tracing::trace!(
                            size_bytes = chunk.len(),
                            latency = ?latency,
                            "sending body chunk"
                        )
                    },
                )
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(true)
                        .level(tracing::Level::INFO),
                )
                .on_request(DefaultOnRequest::new())
                .on_response(
                    DefaultOnResponse::new()
                        .include_headers(true)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
            header::SET_COOKIE,
        ]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::handler))
        // `GET /metrics` is the Prometheus scrape endpoint.
        .route("/metrics", get(telemetry::metrics))
        .nest("/api/auth", router::auth::router())
        .nest("/api/users", router::users::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let path = std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_default();
    let config = Configuration::default().path(path).read()?;

    let Some(postgres) = &config.postgres else {
        tracing::error!("missing `postgres` entry on `config.yaml` file");
        return Err("missing postgres configuration".into());
    };
    let db = Database::new(postgres).await?;

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    let metrics = if config.telemetry.prometheus {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    AppState::new(config, db, metrics)
}
