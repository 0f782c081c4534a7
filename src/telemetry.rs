use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured JSON logging. Correlation ids tie the events of one
/// guided exchange together across intake, queueing, and review.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(filter)
        .init();

    tracing::info!("mod-triage telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation id for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common dispatch attributes
pub fn create_dispatch_span(operation: &str, identity: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "dispatch",
        operation = operation,
        actor.id = identity,
        otel.kind = "internal"
    )
}
