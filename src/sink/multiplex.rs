//! Fan-out over several sinks
//!
//! Getters answer from the first sink (a representative, not an aggregate);
//! setters and `emit` go to every sink in list order. Sinks are not isolated
//! from each other beyond the fact that `emit` never fails: each sink reports
//! its own I/O problems and the remaining sinks still receive the record.

use async_trait::async_trait;

use super::LogSink;
use crate::record::{Level, RecordMetadata};

#[derive(Default)]
pub struct MultiplexSink {
    sinks: Vec<Box<dyn LogSink>>,
}

impl MultiplexSink {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl LogSink for MultiplexSink {
    fn level(&self) -> Level {
        self.sinks
            .first()
            .map(|sink| sink.level())
            .unwrap_or_default()
    }

    fn set_level(&mut self, level: Level) {
        for sink in &mut self.sinks {
            sink.set_level(level);
        }
    }

    fn metadata(&self) -> RecordMetadata {
        self.sinks
            .first()
            .map(|sink| sink.metadata())
            .unwrap_or_default()
    }

    fn set_metadata(&mut self, metadata: RecordMetadata) {
        for sink in &mut self.sinks {
            sink.set_metadata(metadata.clone());
        }
    }

    fn metadata_value(&self, key: &str) -> Option<String> {
        self.sinks.first().and_then(|sink| sink.metadata_value(key))
    }

    fn set_metadata_value(&mut self, key: &str, value: Option<String>) {
        for sink in &mut self.sinks {
            sink.set_metadata_value(key, value.clone());
        }
    }

    async fn emit(&self, level: Level, message: &str, metadata: &RecordMetadata) {
        for sink in &self.sinks {
            sink.emit(level, message, metadata).await;
        }
    }
}
