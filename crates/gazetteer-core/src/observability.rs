//! Observability infrastructure for Gazetteer.
//!
//! Structured logging with consistent spans across all components. This
//! module provides the initialization helper and span constructors used by
//! the pipeline so every operation logs the same fields.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at process start. Safe to call multiple times; subsequent
/// calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: controls log levels (e.g., `info`, `gazetteer_pipeline=debug`)
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for pipeline operations with standard fields.
///
/// # Example
///
/// ```rust
/// use gazetteer_core::observability::pipeline_span;
///
/// let span = pipeline_span("request_fetch", "france");
/// let _guard = span.enter();
/// // ... do pipeline operation
/// ```
#[must_use]
pub fn pipeline_span(operation: &str, country: &str) -> Span {
    tracing::info_span!(
        "pipeline",
        op = operation,
        country = country,
    )
}

/// Creates a span for batch consumer work with standard fields.
#[must_use]
pub fn consumer_span(queue: &str, batch_len: usize) -> Span {
    tracing::info_span!(
        "consumer",
        queue = queue,
        batch_len = batch_len,
    )
}
