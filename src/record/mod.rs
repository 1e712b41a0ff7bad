//! Structured log records
//!
//! A record is a severity plus an ordered sequence of key/value pairs. Values
//! are pre-rendered descriptions; header maps travel as text (see
//! [`crate::headers`]) and are decoded again by the sinks, which use
//! [`MetadataKey::header_slot`] to find out which form a key carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a record
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Notice,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Well-known metadata keys written by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Method,
    Path,
    FullPath,
    BaseUrl,
    ResponseHeadersArray,
    ResponseHeadersJson,
    RequestHeadersArray,
    RequestHeadersJson,
    RequestBody,
    ResponseBody,
    OperationId,
    StatusCode,
    StatusReason,
    Error,
    UniqueKey,
}

/// Which side of the exchange a header-bearing key describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSource {
    Request,
    Response,
}

impl HeaderSource {
    /// Field name used for the decoded header object in persisted records
    pub fn field_name(self) -> &'static str {
        match self {
            HeaderSource::Request => "request headers",
            HeaderSource::Response => "response headers",
        }
    }
}

/// Textual form a header-bearing key carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    /// `name=value, name=value` (display-only, lossy)
    Array,
    /// JSON object string
    Json,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 15] = [
        MetadataKey::Method,
        MetadataKey::Path,
        MetadataKey::FullPath,
        MetadataKey::BaseUrl,
        MetadataKey::ResponseHeadersArray,
        MetadataKey::ResponseHeadersJson,
        MetadataKey::RequestHeadersArray,
        MetadataKey::RequestHeadersJson,
        MetadataKey::RequestBody,
        MetadataKey::ResponseBody,
        MetadataKey::OperationId,
        MetadataKey::StatusCode,
        MetadataKey::StatusReason,
        MetadataKey::Error,
        MetadataKey::UniqueKey,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetadataKey::Method => "method",
            MetadataKey::Path => "path",
            MetadataKey::FullPath => "fullPath",
            MetadataKey::BaseUrl => "baseURL",
            MetadataKey::ResponseHeadersArray => "responseHeadersArray",
            MetadataKey::ResponseHeadersJson => "responseHeadersJSON",
            MetadataKey::RequestHeadersArray => "requestHeadersArray",
            MetadataKey::RequestHeadersJson => "requestHeadersJSON",
            MetadataKey::RequestBody => "requestBody",
            MetadataKey::ResponseBody => "responseBody",
            MetadataKey::OperationId => "operationID",
            MetadataKey::StatusCode => "statusCode",
            MetadataKey::StatusReason => "statusReason",
            MetadataKey::Error => "error",
            MetadataKey::UniqueKey => "uniqueKey",
        }
    }

    pub fn parse(key: &str) -> Option<MetadataKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    /// Header source and form carried by `key`, if it is header-bearing.
    pub fn header_slot(key: &str) -> Option<(HeaderSource, HeaderForm)> {
        match Self::parse(key)? {
            MetadataKey::RequestHeadersArray => Some((HeaderSource::Request, HeaderForm::Array)),
            MetadataKey::RequestHeadersJson => Some((HeaderSource::Request, HeaderForm::Json)),
            MetadataKey::ResponseHeadersArray => Some((HeaderSource::Response, HeaderForm::Array)),
            MetadataKey::ResponseHeadersJson => Some((HeaderSource::Response, HeaderForm::Json)),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value pairs of one record.
///
/// Inserting an existing key replaces its value in place, so a key keeps the
/// position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMetadata {
    entries: Vec<(String, String)>,
}

impl RecordMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`RecordMetadata::insert`] for well-known keys
    pub fn with(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.insert(key.as_str(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `self` followed by `overlay`; overlay values win on shared keys.
    pub fn merged(&self, overlay: &RecordMetadata) -> RecordMetadata {
        let mut merged = self.clone();
        for (key, value) in overlay.iter() {
            merged.insert(key, value);
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecordMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = RecordMetadata::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

impl IntoIterator for RecordMetadata {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
