//! JWT signing and verification using ES256 (ECDSA P-256), and refresh token
//! generation.

use application::error::{ApplicationError, Result, ToInternal};
use application::ports::outbound::{
    Claims, Clock, CredentialIssuer, RefreshTokenMaterial, SecureRandom,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use domain::identity::ip::IpAddress;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde_json::{Map, Value};

use crate::outbound::clock::SystemClock;
use crate::outbound::crypto::OsRngRandom;

/// Random bytes behind one refresh token.
const REFRESH_TOKEN_BYTES: usize = 64;

const NOT_BEFORE: &str = "nbf";
const EXPIRES: &str = "exp";
const ISSUED_AT: &str = "iat";
const ISSUER: &str = "iss";
const AUDIENCE: &str = "aud";

/// ES256 credential issuer.
///
/// The public key is always required. Without a private key the issuer can
/// still validate tokens, but minting one fails.
pub struct JwtCredentialIssuer {
    kid: Option<String>,
    issuer: Option<String>,
    audience: Option<String>,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    clock: Box<dyn Clock>,
    random: Box<dyn SecureRandom>,
}

impl JwtCredentialIssuer {
    /// Create a new [`JwtCredentialIssuer`] from PEM encoded keys.
    pub fn new(
        public_key_pem: &str,
        private_key_pem: Option<&str>,
    ) -> Result<Self> {
        let decoding_key =
            DecodingKey::from_ec_pem(public_key_pem.as_bytes()).catch()?;
        let encoding_key = private_key_pem
            .filter(|pem| !pem.trim().is_empty())
            .map(|pem| EncodingKey::from_ec_pem(pem.as_bytes()))
            .transpose()
            .catch()?;

        Ok(Self {
            kid: None,
            issuer: None,
            audience: None,
            encoding_key,
            decoding_key,
            clock: Box::new(SystemClock::new()),
            random: Box::new(OsRngRandom::new()),
        })
    }

    /// Set `kid` header on JWT.
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set `iss` field on JWT, and require it on validation.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set `aud` field on JWT, and require it on validation.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Replace the time source used for lifetimes.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::ES256);
        // Lifetime is checked by hand: the library accepts `now == nbf` and
        // applies a leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&[EXPIRES, NOT_BEFORE]);

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        validation
    }

    fn decode(&self, token: &str) -> Option<Map<String, Value>> {
        let data = decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation(),
        )
        .inspect_err(|err| tracing::debug!(%err, "invalid access token"))
        .ok()?;

        let instant = |name: &str| {
            data.claims
                .get(name)
                .and_then(Value::as_i64)
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        };
        let not_before = instant(NOT_BEFORE)?;
        let expires = instant(EXPIRES)?;

        let now = self.clock.now();
        if not_before < now && now < expires {
            Some(data.claims)
        } else {
            tracing::debug!(
                %not_before,
                %expires,
                "access token out of lifetime"
            );
            None
        }
    }
}

impl CredentialIssuer for JwtCredentialIssuer {
    fn generate_access_token(
        &self,
        not_before: DateTime<Utc>,
        expires: DateTime<Utc>,
        claims: &Claims,
    ) -> Result<String> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or(ApplicationError::PrivateKeyMissing)?;

        let mut header = Header::new(Algorithm::ES256);
        header.kid.clone_from(&self.kid);

        let mut payload: Map<String, Value> = claims
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.as_str())))
            .collect();
        payload.insert(NOT_BEFORE.into(), not_before.timestamp().into());
        payload.insert(EXPIRES.into(), expires.timestamp().into());
        payload.insert(ISSUED_AT.into(), self.clock.now().timestamp().into());
        if let Some(issuer) = &self.issuer {
            payload.insert(ISSUER.into(), issuer.as_str().into());
        }
        if let Some(audience) = &self.audience {
            payload.insert(AUDIENCE.into(), audience.as_str().into());
        }

        encode(&header, &payload, encoding_key).catch()
    }

    fn validate_access_token(&self, token: &str) -> Claims {
        let Some(claims) = self.decode(token) else {
            return Claims::new();
        };

        claims
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(value) => (name, value),
                other => (name, other.to_string()),
            })
            .collect()
    }

    fn generate_refresh_token(
        &self,
        expires: DateTime<Utc>,
        ip: Option<&str>,
    ) -> Result<RefreshTokenMaterial> {
        let bytes = self.random.random_bytes(REFRESH_TOKEN_BYTES)?;

        Ok(RefreshTokenMaterial {
            token: STANDARD.encode(bytes),
            expires,
            created: self.clock.now(),
            created_by_ip: IpAddress::parse_or_unspecified(ip),
        })
    }
}
