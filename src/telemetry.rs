use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `level` when set. JSON output carries span context,
/// so every line of a cycle shows its correlation id.
pub fn init_telemetry(json: bool, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!(json = json, level = level, "Telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one evaluation cycle
pub fn create_cycle_span(tick: u64, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "directive_cycle",
        tick = tick,
        correlation.id = correlation_id
    )
}

/// Span covering work done for a single directive
pub fn create_directive_span(directive: &str, colony: Option<&str>) -> tracing::Span {
    tracing::debug_span!("directive", directive.name = directive, colony = colony)
}
