//! Header text codecs
//!
//! Record values are plain descriptions, so header collections are carried
//! as text and decoded again by the sinks. Two paired forms exist:
//!
//! - **array text**: `name=value` pairs joined by `", "`. Display-only and
//!   lossy: an entry whose value contains `", "` is split apart, and an entry
//!   whose value contains `=` is ambiguous and dropped on decode.
//! - **JSON text**: a JSON object string. This is the structured path the
//!   pipeline writes.
//!
//! Both encoders deduplicate by header name; the last value wins.

use http::{HeaderMap, HeaderValue};
use std::collections::BTreeMap;

/// Decoded header collection (name -> value)
pub type HeaderMapText = BTreeMap<String, String>;

const ARRAY_SEPARATOR: &str = ", ";

fn header_value_text(value: &HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

/// Deduplicated view of `headers`, last value per name wins
pub fn unique_headers(headers: &HeaderMap) -> HeaderMapText {
    let mut unique = HeaderMapText::new();
    for (name, value) in headers.iter() {
        unique.insert(name.as_str().to_string(), header_value_text(value));
    }
    unique
}

/// Render headers as `name=value` pairs joined by `", "`.
pub fn headers_to_array_text(headers: &HeaderMap) -> String {
    unique_headers(headers)
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(ARRAY_SEPARATOR)
}

/// Best-effort parse of array text.
///
/// Accepts both the bare form produced by [`headers_to_array_text`] and the
/// bracketed, quoted form (`["a=b", "c=d"]`). Entries without `=` or with more
/// than one `=` are skipped.
pub fn array_text_to_map(text: &str) -> HeaderMapText {
    let trimmed = text.trim().trim_matches(|c| c == '[' || c == ']');
    let mut map = HeaderMapText::new();

    for entry in trimmed.split(ARRAY_SEPARATOR) {
        let Some((name, value)) = entry.split_once('=') else {
            continue;
        };
        if value.contains('=') {
            continue;
        }
        let name = name.trim().trim_matches('"');
        let value = value.trim().trim_matches('"');
        if name.is_empty() {
            continue;
        }
        map.insert(name.to_string(), value.to_string());
    }

    map
}

/// Render headers as a pretty-printed JSON object string.
pub fn headers_to_json_text(headers: &HeaderMap) -> String {
    match serde_json::to_string_pretty(&unique_headers(headers)) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to convert headers to JSON");
            String::new()
        }
    }
}

/// Parse a JSON object string into a header map.
///
/// Non-string values are kept as their JSON rendering.
pub fn json_text_to_map(text: &str) -> Result<HeaderMapText, serde_json::Error> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
    Ok(object
        .into_iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(s) => (name, s),
            other => (name, other.to_string()),
        })
        .collect())
}
