//! Telemetry adapters - Observability implementations.

use application::ports::outbound::TelemetryPort;

/// Tracing-based telemetry adapter.
///
/// Every record is also counted through the `metrics` facade, exported by
/// whichever recorder the server installed.
#[derive(Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    /// Create a new [`TracingTelemetry`].
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryPort for TracingTelemetry {
    fn record_auth_success(&self, user_id: &str, method: &str) {
        tracing::info!(
            user_id = user_id,
            method = method,
            "authentication successful"
        );
        metrics::counter!("auth_success_total", "method" => method.to_owned())
            .increment(1);
    }

    fn record_auth_failure(&self, reason: &str) {
        tracing::info!(reason = reason, "authentication failed");
        metrics::counter!("auth_failure_total", "reason" => reason.to_owned())
            .increment(1);
    }

    fn record_account_created(&self, user_id: &str, method: &str) {
        tracing::info!(user_id = user_id, method = method, "account created");
        metrics::counter!(
            "accounts_created_total",
            "method" => method.to_owned()
        )
        .increment(1);
    }

    fn record_token_reuse(&self, user_id: &str, revoked: usize) {
        tracing::warn!(
            user_id = user_id,
            revoked = revoked,
            "refresh token reuse detected"
        );
        metrics::counter!("refresh_token_reuse_total").increment(1);
        metrics::histogram!("refresh_token_reuse_revoked").record(revoked as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_without_recorder() {
        let telemetry = TracingTelemetry::new();

        telemetry.record_auth_success("user", "password");
        telemetry.record_auth_failure("invalid_password");
        telemetry.record_account_created("user", "vk");
        telemetry.record_token_reuse("user", 3);
    }
}
