//! Log sinks
//!
//! A sink accepts structured records and emits or persists them. Sinks are
//! composed explicitly and handed to the pipeline at construction; there is
//! no global logger.
//!
//! ```text
//! LoggingMiddleware
//!     └─ MultiplexSink
//!          ├─ StreamSink     (stdout, one line per metadata entry)
//!          ├─ JsonFileSink   (_<stem>.json, read-modify-write)
//!          └─ StreamSink     (_<stem>.log, optional)
//! ```

use async_trait::async_trait;

use crate::record::{Level, RecordMetadata};

pub mod json_file;
pub mod multiplex;
pub mod stream;

pub use json_file::{JsonFileSink, PersistedEntry, WriteGuard};
pub use multiplex::MultiplexSink;
pub use stream::StreamSink;

/// Destination for structured records.
///
/// The level is a threshold for callers: records below it should not be
/// emitted. Sink metadata is a persistent set of tags merged ahead of the
/// per-call metadata of every record. I/O failures are handled inside
/// `emit`; they never reach the caller.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Current threshold level
    fn level(&self) -> Level;

    fn set_level(&mut self, level: Level);

    /// Persistent metadata attached to every record
    fn metadata(&self) -> RecordMetadata;

    fn set_metadata(&mut self, metadata: RecordMetadata);

    fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata().get(key).map(str::to_string)
    }

    /// Set (`Some`) or clear (`None`) one persistent metadata entry
    fn set_metadata_value(&mut self, key: &str, value: Option<String>) {
        let mut metadata = self.metadata();
        match value {
            Some(value) => metadata.insert(key, value),
            None => {
                metadata.remove(key);
            }
        }
        self.set_metadata(metadata);
    }

    /// Emit one record
    async fn emit(&self, level: Level, message: &str, metadata: &RecordMetadata);
}
