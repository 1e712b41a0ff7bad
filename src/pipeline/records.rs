// Record builders for the three pipeline events
//
// Pure functions of their inputs apart from the fresh `uniqueKey`.

use http::response;
use uuid::Uuid;

use super::context::join_url;
use crate::body::BodyLogOutcome;
use crate::constants::FIELD_NIL;
use crate::headers::headers_to_json_text;
use crate::record::{MetadataKey, RecordMetadata};

/// Request fields shared by every record of one call, taken before the
/// request is handed to the continuation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: String,
    pub path: Option<String>,
    pub base_url: Option<String>,
    pub headers_json: String,
}

impl RequestSummary {
    pub fn new<B>(request: &http::Request<B>, base_url: Option<String>) -> Self {
        Self {
            method: request.method().to_string(),
            path: request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string()),
            base_url,
            headers_json: headers_to_json_text(request.headers()),
        }
    }

    fn path_text(&self) -> &str {
        self.path.as_deref().unwrap_or(FIELD_NIL)
    }

    fn full_path(&self) -> Option<String> {
        self.base_url
            .as_deref()
            .map(|base| join_url(base, self.path.as_deref().unwrap_or("")))
    }

    fn identifying_fields(&self) -> RecordMetadata {
        RecordMetadata::new()
            .with(MetadataKey::Method, self.method.as_str())
            .with(MetadataKey::Path, self.path_text())
            .with(
                MetadataKey::BaseUrl,
                self.base_url.as_deref().unwrap_or(FIELD_NIL),
            )
            .with(
                MetadataKey::FullPath,
                self.full_path().unwrap_or_else(|| FIELD_NIL.to_string()),
            )
    }
}

fn unique_key() -> String {
    Uuid::new_v4().to_string()
}

/// Record emitted before the continuation runs
pub fn request_record(
    summary: &RequestSummary,
    body: &BodyLogOutcome,
    operation_id: &str,
) -> RecordMetadata {
    summary
        .identifying_fields()
        .with(MetadataKey::RequestHeadersJson, summary.headers_json.as_str())
        .with(MetadataKey::RequestBody, body.render())
        .with(MetadataKey::OperationId, operation_id)
        .with(MetadataKey::UniqueKey, unique_key())
}

/// Record emitted after the continuation returned a response
pub fn response_record(
    summary: &RequestSummary,
    response: &response::Parts,
    body: &BodyLogOutcome,
    operation_id: &str,
) -> RecordMetadata {
    summary
        .identifying_fields()
        .with(
            MetadataKey::ResponseHeadersJson,
            headers_to_json_text(&response.headers),
        )
        .with(MetadataKey::ResponseBody, body.render())
        .with(MetadataKey::OperationId, operation_id)
        .with(MetadataKey::StatusCode, response.status.as_u16().to_string())
        .with(
            MetadataKey::StatusReason,
            response.status.canonical_reason().unwrap_or(""),
        )
        .with(MetadataKey::UniqueKey, unique_key())
}

/// Record emitted when the call failed
pub fn failure_record(summary: &RequestSummary, error: &str, operation_id: &str) -> RecordMetadata {
    RecordMetadata::new()
        .with(MetadataKey::Method, summary.method.as_str())
        .with(MetadataKey::Path, summary.path_text())
        .with(MetadataKey::Error, error)
        .with(MetadataKey::OperationId, operation_id)
        .with(MetadataKey::UniqueKey, unique_key())
}
