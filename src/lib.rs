// OpenAPI Logging Library
//
// Request/response logging middleware for OpenAPI clients and servers:
// policy-driven body capture, structured records, and pluggable sinks
// (standard output, JSON file, plain-text file).

pub mod body;
pub mod config;
pub mod constants;
pub mod error;
pub mod headers;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod sink;

pub use body::{BodyLogOutcome, BodyLoggingPolicy};
pub use config::{LogFileNames, MiddlewareConfig};
pub use error::{CaptureError, ConfigError, SinkError};
pub use pipeline::{CallContext, HttpRequest, HttpResponse, LoggingMiddleware, ServerRequestMetadata};
pub use record::{Level, MetadataKey, RecordMetadata};
pub use sink::{JsonFileSink, LogSink, MultiplexSink, StreamSink, WriteGuard};
