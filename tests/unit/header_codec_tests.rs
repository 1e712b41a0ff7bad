// Header codec unit tests

use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use openapi_logging::headers::{
    array_text_to_map, headers_to_array_text, headers_to_json_text, json_text_to_map,
    unique_headers, HeaderMapText,
};

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.append(*name, HeaderValue::from_static(*value));
    }
    map
}

// Test: Array text round-trips plain names and values
#[test]
fn test_array_text_round_trip() {
    let original = headers(&[
        ("content-type", "application/json"),
        ("x-request-id", "7f3c"),
        ("accept-language", "en-US"),
    ]);

    let text = headers_to_array_text(&original);
    assert_eq!(
        text,
        "accept-language=en-US, content-type=application/json, x-request-id=7f3c"
    );
    assert_eq!(array_text_to_map(&text), unique_headers(&original));
}

// Test: Values containing "=" do not survive the array form
#[test]
fn test_array_text_drops_values_with_equals() {
    let original = headers(&[
        ("authorization", "Basic dXNlcjpwYXNz=="),
        ("x-trace", "on"),
    ]);

    let decoded = array_text_to_map(&headers_to_array_text(&original));

    assert_eq!(decoded.len(), 1);
    assert!(!decoded.contains_key("authorization"));
    assert_eq!(decoded["x-trace"], "on");
}

// Test: Values containing ", " are split apart by the array form
#[test]
fn test_array_text_splits_values_with_separator() {
    let original = headers(&[("accept", "text/html, application/json")]);

    let decoded = array_text_to_map(&headers_to_array_text(&original));

    assert_eq!(decoded["accept"], "text/html");
    assert_ne!(decoded, unique_headers(&original));
}

// Test: JSON text keeps the values the array form loses
#[test]
fn test_json_text_round_trip_is_lossless() {
    let original = headers(&[
        ("accept", "text/html, application/json"),
        ("authorization", "Basic dXNlcjpwYXNz=="),
    ]);

    let decoded = json_text_to_map(&headers_to_json_text(&original)).unwrap();
    assert_eq!(decoded, unique_headers(&original));
}

// Test: Repeated header names keep the last value
#[test]
fn test_repeated_headers_keep_last_value() {
    let original = headers(&[("x-forwarded-for", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);

    let mut expected = HeaderMapText::new();
    expected.insert("x-forwarded-for".to_string(), "10.0.0.2".to_string());
    assert_eq!(unique_headers(&original), expected);
}

// Test: Bracketed, quoted array text is accepted
#[test]
fn test_bracketed_array_text() {
    let decoded = array_text_to_map(r#"["content-type=text/plain", "x-id=1"]"#);
    assert_eq!(decoded["content-type"], "text/plain");
    assert_eq!(decoded["x-id"], "1");
}

// Test: Invalid JSON text is an error, not an empty map
#[test]
fn test_invalid_json_text() {
    assert!(json_text_to_map("not json").is_err());
    assert!(json_text_to_map("[1, 2]").is_err());

    let empty = headers_to_json_text(&HeaderMap::new());
    assert!(json_text_to_map(&empty).unwrap().is_empty());

    let mut single = HeaderMap::new();
    single.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    assert!(headers_to_json_text(&single).contains("\"content-type\": \"text/csv\""));
}
