// Logging module for the crate's own diagnostics
//
// Sink I/O failures, file announcements and similar call-site diagnostics go
// through `tracing`. Structured request/response records do not; they are
// emitted through the explicit sink set given to the pipeline.

use std::error::Error;
use tracing_subscriber::EnvFilter;

/// Output format of the diagnostics subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, for development
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

/// Initialize the tracing subscriber for diagnostics
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Output goes to stderr
/// so it never interleaves with a stream sink writing to stdout.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```
/// use openapi_logging::logging::{init_subscriber, LogFormat};
///
/// let _ = init_subscriber(LogFormat::Pretty);
/// tracing::info!("diagnostics ready");
/// ```
pub fn init_subscriber(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
