//! Interface for observability.

/// Port for telemetry/observability operations.
pub trait TelemetryPort: Send + Sync {
    /// Record a successful authentication.
    fn record_auth_success(&self, user_id: &str, method: &str);

    /// Record a failed authentication attempt.
    fn record_auth_failure(&self, reason: &str);

    /// Record a new account creation.
    fn record_account_created(&self, user_id: &str, method: &str);

    /// Record the presentation of an already revoked refresh token and the
    /// number of downstream tokens revoked because of it.
    fn record_token_reuse(&self, user_id: &str, revoked: usize);
}
