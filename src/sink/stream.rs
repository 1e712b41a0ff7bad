//! Human-readable stream sink
//!
//! Writes one line per metadata entry to a character destination (stdout by
//! default). Header-bearing entries are decoded and written one line per
//! header. Every line carries the sink's prefix so interleaved output from
//! several pipelines can be told apart.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::LogSink;
use crate::error::SinkError;
use crate::headers::{array_text_to_map, json_text_to_map};
use crate::record::{HeaderForm, Level, MetadataKey, RecordMetadata};

pub struct StreamSink {
    label: String,
    prefix: String,
    level: Level,
    metadata: RecordMetadata,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl StreamSink {
    /// Sink writing to the process's standard output
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_writer(label, tokio::io::stdout())
    }

    /// Sink writing to an arbitrary destination
    pub fn with_writer(
        label: impl Into<String>,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            prefix: String::new(),
            level: Level::default(),
            metadata: RecordMetadata::new(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Sink appending to a plain-text file, created if absent
    pub async fn append_to_file(
        label: impl Into<String>,
        path: &Path,
    ) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self::with_writer(label, file))
    }

    /// Prefix written at the start of every line
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines written for one record's metadata
    pub fn render_lines(&self, metadata: &RecordMetadata) -> Vec<String> {
        let prefix = &self.prefix;
        let mut lines = Vec::with_capacity(metadata.len());

        for (key, value) in metadata.iter() {
            match MetadataKey::header_slot(key) {
                Some((_, HeaderForm::Array)) => {
                    lines.push(format!("{}{} Headers:", prefix, key));
                    for (name, header_value) in array_text_to_map(value) {
                        lines.push(format!("{}header: `{}` = `{}`", prefix, name, header_value));
                    }
                }
                Some((_, HeaderForm::Json)) => match json_text_to_map(value) {
                    Ok(headers) => {
                        for (name, header_value) in headers {
                            lines.push(format!(
                                "{}{} Header: `{}` = `{}`",
                                prefix, key, name, header_value
                            ));
                        }
                    }
                    Err(_) => lines.push(format!("{}`{}` = `{}`", prefix, key, value)),
                },
                None => lines.push(format!("{}`{}` = `{}`", prefix, key, value)),
            }
        }

        lines
    }

    async fn write_lines(&self, lines: &[String]) -> io::Result<()> {
        let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await
    }
}

#[async_trait]
impl LogSink for StreamSink {
    fn level(&self) -> Level {
        self.level
    }

    fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    fn metadata(&self) -> RecordMetadata {
        self.metadata.clone()
    }

    fn set_metadata(&mut self, metadata: RecordMetadata) {
        self.metadata = metadata;
    }

    async fn emit(&self, _level: Level, _message: &str, metadata: &RecordMetadata) {
        let merged = self.metadata.merged(metadata);
        if merged.is_empty() {
            return;
        }

        let lines = self.render_lines(&merged);
        if let Err(e) = self.write_lines(&lines).await {
            tracing::error!(
                label = %self.label,
                prefix = %self.prefix,
                error = %e,
                "Failed to write log lines"
            );
        }
    }
}
