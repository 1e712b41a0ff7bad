// Error types module

use thiserror::Error;

/// Boxed error produced by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while buffering a body stream for logging.
///
/// Returned by [`crate::body::capture`] and converted into the caller's error
/// type by the pipeline. Nothing is cached for a retry: once a read fails the
/// body is gone.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The stream yielded more bytes than the policy allows
    #[error("body exceeded the {limit} byte capture limit")]
    LengthLimitExceeded { limit: usize },

    /// The underlying stream failed while being read
    #[error("failed to read body stream: {0}")]
    Read(#[source] BoxError),
}

/// Sink I/O errors.
///
/// Sinks recover from these locally during `emit`; they only surface from
/// constructors and the explicit load/append helpers.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
