//! Configuration manager for Passage.

use std::fs::File;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use application::ports::outbound::OAuthCredentials;
use application::usecases::TokenLifetimes;
use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const PEM_HEADER: &str = "-----BEGIN";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of the instance.
    pub url: String,
    #[serde(default)]
    pub(crate) version: String,
    #[serde(skip)]
    pub(crate) path: PathBuf,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to VK OAuth configuration.
    #[serde(skip_serializing)]
    pub vk: Option<Vk>,
    #[serde(skip_serializing, default)]
    pub telemetry: Telemetry,
    /// Peers allowed to set `X-Forwarded-For`.
    #[serde(skip_serializing, default)]
    pub trusted_proxies: Vec<IpAddr>,
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing, in KiB.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
        }
    }
}

/// Json Web Token configuration.
///
/// Keys are either inline PEM or a path to a PEM file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    pub key_id: Option<String>,
    pub public_key_pem: String,
    /// Without it, tokens can be validated but not issued.
    pub private_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Access token lifetime, in seconds.
    pub access_lifetime: Option<u32>,
    /// Refresh token lifetime, in seconds.
    pub refresh_lifetime: Option<u32>,
}

impl Token {
    pub fn public_key(&self) -> std::io::Result<String> {
        read_pem(&self.public_key_pem)
    }

    pub fn private_key(&self) -> std::io::Result<Option<String>> {
        self.private_key_pem.as_deref().map(read_pem).transpose()
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        let default = TokenLifetimes::default();
        let seconds = |value: Option<u32>| {
            value.map(|secs| chrono::Duration::seconds(secs.into()))
        };

        TokenLifetimes {
            access: seconds(self.access_lifetime).unwrap_or(default.access),
            refresh: seconds(self.refresh_lifetime).unwrap_or(default.refresh),
        }
    }
}

fn read_pem(value: &str) -> std::io::Result<String> {
    if value.trim_start().starts_with(PEM_HEADER) {
        Ok(value.to_owned())
    } else {
        std::fs::read_to_string(value)
    }
}

/// VK OAuth application configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Vk {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Override of the token exchange endpoint.
    pub endpoint: Option<String>,
}

impl From<&Vk> for OAuthCredentials {
    fn from(vk: &Vk) -> Self {
        Self {
            client_id: vk.client_id.clone(),
            client_secret: vk.client_secret.clone(),
            redirect_uri: vk.redirect_uri.clone(),
        }
    }
}

/// Telemetry configuration.
///
/// OTLP export is driven by the standard `OTEL_EXPORTER_OTLP_ENDPOINT`
/// environment variable.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// Expose Prometheus metrics on `GET /metrics`.
    #[serde(default)]
    pub prometheus: bool,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(Arc::new(self.error(err)));
                        },
                    };

                config.version = VERSION.to_owned();
                if !config.url.is_empty() {
                    config.url = self.normalize_url(&config.url)?;
                }
                if let Some(vk) = config.vk.as_mut() {
                    vk.redirect_uri = vk
                        .redirect_uri
                        .as_deref()
                        .map(|uri| self.normalize_url(uri))
                        .transpose()?;
                }

                Ok(Arc::new(config))
            },
            Err(err) => Ok(Arc::new(self.error(err))),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifetimes_default() {
        let token: Token = serde_yaml::from_str(
            "public_key_pem: \"-----BEGIN PUBLIC KEY-----\"",
        )
        .unwrap();

        assert_eq!(token.lifetimes(), TokenLifetimes::default());
        assert!(token.private_key().unwrap().is_none());
        assert!(token.public_key().unwrap().starts_with(PEM_HEADER));
    }

    #[test]
    fn test_token_lifetimes_override() {
        let token: Token = serde_yaml::from_str(
            r#"
            public_key_pem: "-----BEGIN PUBLIC KEY-----"
            access_lifetime: 60
            refresh_lifetime: 3600
            "#,
        )
        .unwrap();

        let lifetimes = token.lifetimes();
        assert_eq!(lifetimes.access, chrono::Duration::minutes(1));
        assert_eq!(lifetimes.refresh, chrono::Duration::hours(1));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Configuration::default()
            .path(PathBuf::from("does/not/exist.yaml"))
            .read()
            .unwrap();

        assert_eq!(config.version(), VERSION);
        assert!(config.token.is_none());
        assert!(!config.telemetry.prometheus);
    }

    #[test]
    fn test_trusted_proxies_parse() {
        let config: Configuration = serde_yaml::from_str(
            r#"
            name: passage
            url: https://passage.local
            trusted_proxies: ["10.0.0.1", "::1"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.trusted_proxies,
            vec![
                IpAddr::from([10, 0, 0, 1]),
                IpAddr::from(std::net::Ipv6Addr::LOCALHOST),
            ]
        );
        assert!(Configuration::default().trusted_proxies.is_empty());
    }

    #[test]
    fn test_normalize_url() {
        let config = Configuration::default();

        assert_eq!(
            config.normalize_url("passage.local").unwrap(),
            "https://passage.local/"
        );
        assert_eq!(
            config.normalize_url("http://localhost:8888").unwrap(),
            "http://localhost:8888/"
        );
    }
}
