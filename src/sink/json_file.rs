//! JSON file sink
//!
//! Persists every record into a single JSON array on disk. Each `emit` reads
//! the whole file, appends one object and atomically replaces the file
//! (temp file + rename). A missing or unparseable file counts as an empty
//! history; a failed write drops that record.
//!
//! Read-modify-write is not coordinated between writers by default: two sinks
//! (or processes) sharing a backing file can lose each other's records, the
//! last writer's array wins. [`WriteGuard::Exclusive`] serialises sinks within
//! one process that share a path; it does nothing across processes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use super::LogSink;
use crate::constants::{TIMESTAMP_FIELD, TIMESTAMP_FORMAT};
use crate::error::SinkError;
use crate::headers::{array_text_to_map, json_text_to_map, HeaderMapText};
use crate::record::{HeaderForm, Level, MetadataKey, RecordMetadata};

/// One persisted record: a timestamp plus one field per metadata key
pub type PersistedEntry = Map<String, Value>;

/// Coordination of the read-modify-write cycle on the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteGuard {
    /// No coordination; concurrent writers may lose records
    #[default]
    Unsynchronized,
    /// Process-wide mutual exclusion per backing file path
    Exclusive,
}

type PathLocks = parking_lot::Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>;

fn path_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<PathLocks> = OnceLock::new();
    let locks = LOCKS.get_or_init(Default::default);
    locks
        .lock()
        .entry(path.to_path_buf())
        .or_default()
        .clone()
}

pub struct JsonFileSink {
    label: String,
    prefix: String,
    path: PathBuf,
    level: Level,
    metadata: RecordMetadata,
    guard: WriteGuard,
}

impl JsonFileSink {
    /// Create a sink backed by `path`.
    ///
    /// Creates the file (and its parent directories) when absent and
    /// announces the resolved path once.
    pub fn new(
        label: impl Into<String>,
        path: impl AsRef<Path>,
        prefix: impl Into<String>,
    ) -> Result<Self, SinkError> {
        let label = label.into();
        let prefix = prefix.into();
        let path = path.as_ref();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path)?;
        }
        let path = std::fs::canonicalize(path)?;

        tracing::info!(
            label = %label,
            path = %path.display(),
            "{}JSON log file created at path: {}",
            prefix,
            path.display()
        );

        Ok(Self {
            label,
            prefix,
            path,
            level: Level::default(),
            metadata: RecordMetadata::new(),
            guard: WriteGuard::default(),
        })
    }

    pub fn with_write_guard(mut self, guard: WriteGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Resolved backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_guard(&self) -> WriteGuard {
        self.guard
    }

    /// Build the persisted object for one record's metadata.
    ///
    /// Header-bearing keys become nested objects under `request headers` /
    /// `response headers`; a header text that fails to decode is kept as a
    /// string under its own key.
    pub fn build_entry(metadata: &RecordMetadata) -> PersistedEntry {
        let mut entry = PersistedEntry::new();
        entry.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(loggable_timestamp()),
        );

        for (key, value) in metadata.iter() {
            let Some((source, form)) = MetadataKey::header_slot(key) else {
                entry.insert(key.to_string(), Value::String(value.to_string()));
                continue;
            };

            let decoded = match form {
                HeaderForm::Array => Some(array_text_to_map(value)),
                HeaderForm::Json => json_text_to_map(value).ok(),
            };
            match decoded {
                Some(headers) => {
                    entry.insert(source.field_name().to_string(), header_object(headers));
                }
                None => {
                    entry.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }

        entry
    }

    /// Read the persisted array, treating a missing, empty or unparseable
    /// file as no history.
    pub async fn load_entries(&self) -> Vec<PersistedEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    label = %self.label,
                    path = %self.path.display(),
                    error = %e,
                    "Discarding unreadable log history"
                );
                Vec::new()
            }
        }
    }

    async fn try_load(&self) -> Result<Vec<PersistedEntry>, SinkError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&data)?)
    }

    /// Append one entry to the persisted array
    pub async fn append(&self, entry: PersistedEntry) -> Result<(), SinkError> {
        let lock = match self.guard {
            WriteGuard::Exclusive => Some(path_lock(&self.path)),
            WriteGuard::Unsynchronized => None,
        };
        let _held = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut entries = self.load_entries().await;
        entries.push(entry);
        let json = serde_json::to_vec_pretty(&entries)?;
        write_file_atomic(&self.path, &json).await
    }
}

#[async_trait]
impl LogSink for JsonFileSink {
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
        let entry = Self::build_entry(&self.metadata.merged(metadata));
        if let Err(e) = self.append(entry).await {
            tracing::error!(
                label = %self.label,
                path = %self.path.display(),
                error = %e,
                "{}Error saving log",
                self.prefix
            );
        }
    }
}

fn header_object(headers: HeaderMapText) -> Value {
    Value::Object(
        headers
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect(),
    )
}

/// Current local time in the persisted timestamp format
pub fn loggable_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

async fn write_file_atomic(path: &Path, data: &[u8]) -> Result<(), SinkError> {
    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    if let Err(e) = tokio::fs::write(&temp_path, data).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
