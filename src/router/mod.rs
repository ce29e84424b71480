//! HTTP routes and their shared extractors.

pub mod auth;
pub mod status;
pub mod users;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use application::dto::RefreshTokenPayload;
use axum::Json;
use axum::extract::{
    ConnectInfo, FromRef, FromRequest, FromRequestParts, Request,
};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tokio_util::sync::{CancellationToken, DropGuard};
use validator::Validate;

use crate::config::Configuration;
use crate::error::ServerError;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";
/// The refresh cookie is only sent to the auth routes.
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// JSON body validated with [`validator`].
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;

        Ok(Self(value))
    }
}

/// Address of the client.
///
/// The first `X-Forwarded-For` hop is only read when the peer is one of the
/// configured `trusted_proxies`; otherwise the peer address is used, if the
/// server was started with connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    Arc<Configuration>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let config = Arc::<Configuration>::from_ref(state);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let forwarded = peer
            .filter(|ip| config.trusted_proxies.contains(ip))
            .and_then(|_| parts.headers.get(FORWARDED_FOR))
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        Ok(Self(forwarded.or_else(|| peer.map(|ip| ip.to_string()))))
    }
}

/// Token cancelled when the guard is dropped, that is when the handler
/// finishes or its future is dropped by a timeout or a closed connection.
pub fn cancellation() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// Refresh token cookie, expiring with the token.
pub fn refresh_cookie(token: &RefreshTokenPayload) -> Cookie<'static> {
    let mut cookie = Cookie::build((REFRESH_COOKIE, token.token.clone()))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict);

    if let Ok(expires) =
        OffsetDateTime::from_unix_timestamp(token.expires.timestamp())
    {
        cookie = cookie.expires(expires);
    }

    cookie.build()
}

/// Cookie matching [`refresh_cookie`], used to remove it.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path(REFRESH_COOKIE_PATH)
        .build()
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub fn state(pool: sqlx::PgPool) -> crate::AppState {
    use crate::config::{Argon2, Token};

    const PRIVATE_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/crates/adapters/testdata/es256_private.pem"
    ));
    const PUBLIC_KEY: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/crates/adapters/testdata/es256_public.pem"
    ));

    let config = Configuration {
        name: "passage".into(),
        url: "https://passage.local/".into(),
        token: Some(Token {
            key_id: Some("test".into()),
            public_key_pem: PUBLIC_KEY.into(),
            private_key_pem: Some(PRIVATE_KEY.into()),
            issuer: Some("https://passage.local/".into()),
            audience: None,
            access_lifetime: None,
            refresh_lifetime: None,
        }),
        argon2: Some(Argon2 {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
        }),
        ..Default::default()
    };

    crate::AppState::new(Arc::new(config), pool.into(), None)
        .expect("cannot build test state")
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use axum::http::HeaderValue;
    use chrono::{TimeZone, Utc};

    use super::*;

    const PROXY: [u8; 4] = [10, 0, 0, 1];

    async fn client_ip(
        request: axum::http::Request<()>,
        trusted_proxies: &[IpAddr],
    ) -> ClientIp {
        let config = Arc::new(Configuration {
            trusted_proxies: trusted_proxies.to_vec(),
            ..Default::default()
        });
        let (mut parts, _) = request.into_parts();
        ClientIp::from_request_parts(&mut parts, &config)
            .await
            .unwrap()
    }

    fn forwarded_from(peer: [u8; 4]) -> axum::http::Request<()> {
        let mut request = axum::http::Request::new(());
        request.headers_mut().insert(
            FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        request
    }

    #[tokio::test]
    async fn test_client_ip_takes_first_hop_behind_trusted_proxy() {
        let trusted = [IpAddr::from(PROXY)];

        assert_eq!(
            client_ip(forwarded_from(PROXY), &trusted).await,
            ClientIp(Some("203.0.113.7".into()))
        );
    }

    #[tokio::test]
    async fn test_client_ip_ignores_forwarded_from_untrusted_peer() {
        let trusted = [IpAddr::from(PROXY)];

        assert_eq!(
            client_ip(forwarded_from([198, 51, 100, 4]), &trusted).await,
            ClientIp(Some("198.51.100.4".into()))
        );
        assert_eq!(
            client_ip(forwarded_from(PROXY), &[]).await,
            ClientIp(Some("10.0.0.1".into()))
        );

        let mut request = axum::http::Request::new(());
        request
            .headers_mut()
            .insert(FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));
        assert_eq!(client_ip(request, &trusted).await, ClientIp(None));
    }

    #[tokio::test]
    async fn test_client_ip_falls_back_to_peer() {
        let mut request = axum::http::Request::new(());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 4000))));

        assert_eq!(
            client_ip(request, &[]).await,
            ClientIp(Some("192.168.1.20".into()))
        );
        assert_eq!(
            client_ip(axum::http::Request::new(()), &[]).await,
            ClientIp(None)
        );
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let cookie = refresh_cookie(&RefreshTokenPayload {
            token: "abc".into(),
            expires,
        });

        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some(REFRESH_COOKIE_PATH));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(
            cookie.expires_datetime().map(|e| e.unix_timestamp()),
            Some(expires.timestamp())
        );
    }

    #[test]
    fn test_cancellation_follows_guard() {
        let (token, guard) = cancellation();
        assert!(!token.is_cancelled());

        drop(guard);

        assert!(token.is_cancelled());
    }
}
