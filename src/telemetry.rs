use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;
use crate::types::SessionId;

/// Install the global subscriber: JSON (or plain) fmt layer plus an env filter
/// that falls back to the configured level when RUST_LOG is unset
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))?;

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?;
    }

    tracing::info!("Onboarding telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span carrying the common onboarding session attributes
pub fn create_workflow_span(operation: &str, session_id: &SessionId, subject_id: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "onboarding_workflow",
        operation = operation,
        session.id = %session_id,
        subject.id = subject_id,
    )
}

/// Span for one dispatch attempt
pub fn create_dispatch_span(correlation_id: &str, subject_id: &str, role: &str, manual: bool) -> tracing::Span {
    tracing::info_span!(
        "trigger_dispatch",
        correlation.id = correlation_id,
        subject.id = subject_id,
        role = role,
        manual = manual,
    )
}

/// Shutdown telemetry gracefully
pub fn shutdown_telemetry() {
    tracing::info!("Onboarding telemetry shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let first = generate_correlation_id();
        let second = generate_correlation_id();
        assert_ne!(first, second);
        assert_eq!(first.len(), 36);
    }
}
