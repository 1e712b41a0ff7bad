// Interception pipeline end-to-end tests
//
// Drive the middleware with a real sink set (stream sink over a buffer plus
// a JSON file sink) and check what a reader of the log files would see.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, Uri};
use http_body_util::BodyExt;
use openapi_logging::body::{from_stream, full, Body};
use openapi_logging::record::{Level, RecordMetadata};
use openapi_logging::sink::{JsonFileSink, LogSink, MultiplexSink, StreamSink};
use openapi_logging::{
    BodyLoggingPolicy, CaptureError, HttpRequest, LoggingMiddleware, MiddlewareConfig,
    ServerRequestMetadata,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::AsyncWrite;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Sink that keeps every record it receives
#[derive(Clone, Default)]
struct CollectingSink {
    records: Arc<Mutex<Vec<(String, RecordMetadata)>>>,
}

#[async_trait]
impl LogSink for CollectingSink {
    fn level(&self) -> Level {
        Level::Trace
    }

    fn set_level(&mut self, _level: Level) {}

    fn metadata(&self) -> RecordMetadata {
        RecordMetadata::new()
    }

    fn set_metadata(&mut self, _metadata: RecordMetadata) {}

    async fn emit(&self, _level: Level, message: &str, metadata: &RecordMetadata) {
        self.records
            .lock()
            .push((message.to_string(), metadata.clone()));
    }
}

struct Harness {
    _temp_dir: TempDir,
    json_path: std::path::PathBuf,
    stdout: SharedBuffer,
    middleware: LoggingMiddleware,
}

impl Harness {
    fn new(policy: BodyLoggingPolicy) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = MiddlewareConfig {
            body_logging: policy,
            app_name: Some("petstore".to_string()),
            log_prefix: "client".to_string(),
            log_directory: temp_dir.path().to_path_buf(),
            ..MiddlewareConfig::default()
        };

        let stdout = SharedBuffer::default();
        let json = JsonFileSink::new("test", config.json_log_path(), "[client] ").unwrap();
        let json_path = json.path().to_path_buf();

        let stream: Box<dyn LogSink> =
            Box::new(StreamSink::with_writer("test", stdout.clone()).with_prefix("[client] "));
        let mut sinks = MultiplexSink::new(vec![stream, Box::new(json)]);
        sinks.set_level(config.level);

        Self {
            _temp_dir: temp_dir,
            json_path,
            stdout,
            middleware: LoggingMiddleware::with_sink(&config, Box::new(sinks)),
        }
    }

    fn entries(&self) -> Vec<Value> {
        let json = std::fs::read_to_string(&self.json_path).unwrap();
        serde_json::from_str(&json).unwrap()
    }
}

fn base_url() -> Uri {
    "https://petstore.example.com/v1".parse().unwrap()
}

fn get(path: &str) -> HttpRequest {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .header("accept", "application/json")
        .body(None)
        .unwrap()
}

async fn read(body: Option<Body>) -> Bytes {
    body.unwrap().collect().await.unwrap().to_bytes()
}

// Test: A body-less GET under Never logs a redacted request body and a unique key
#[tokio::test]
async fn test_request_record_under_never_policy() {
    let harness = Harness::new(BodyLoggingPolicy::Never);

    harness
        .middleware
        .intercept_client(get("/items"), base_url(), "listItems", |request, _| async move {
            assert!(request.body().is_none());
            Ok::<_, anyhow::Error>(Response::new(None))
        })
        .await
        .unwrap();

    let entries = harness.entries();
    let request = &entries[0];
    assert_eq!(request["method"], "GET");
    assert_eq!(request["path"], "/items");
    assert_eq!(request["operationID"], "listItems");
    assert_eq!(request["requestBody"], "<redacted>");
    assert_eq!(request["fullPath"], "https://petstore.example.com/v1/items");
    assert_eq!(request["request headers"]["accept"], "application/json");
    assert!(!request["uniqueKey"].as_str().unwrap().is_empty());
}

// Test: A 200 response with a 10-byte body under UpTo(1024) logs the body text
#[tokio::test]
async fn test_response_record_with_captured_body() {
    let harness = Harness::new(BodyLoggingPolicy::up_to(1024));

    let response = harness
        .middleware
        .intercept_client(get("/items"), base_url(), "listItems", |_, _| async move {
            Ok::<_, anyhow::Error>(
                Response::builder()
                    .status(StatusCode::OK)
                    .header("content-type", "application/json")
                    .body(Some(full("[1,2,3,45]")))
                    .unwrap(),
            )
        })
        .await
        .unwrap();

    assert_eq!(read(response.into_body()).await, "[1,2,3,45]");

    let entries = harness.entries();
    assert_eq!(entries.len(), 2);
    let response = &entries[1];
    assert_eq!(response["responseBody"], "[1,2,3,45]");
    assert_eq!(response["statusCode"], "200");
    assert_eq!(response["statusReason"], "OK");
    assert_eq!(response["response headers"]["content-type"], "application/json");
    assert_ne!(entries[0]["uniqueKey"], response["uniqueKey"]);

    let stdout = harness.stdout.text();
    assert!(stdout.contains("[client] `statusCode` = `200`"));
    assert!(stdout.contains("[client] responseHeadersJSON Header: `content-type` = `application/json`"));
}

// Test: A failing continuation yields one error record and the original error
#[tokio::test]
async fn test_failure_record_and_error_identity() {
    #[derive(Debug, thiserror::Error)]
    #[error("upstream unavailable: {0}")]
    struct Upstream(u16);

    let harness = Harness::new(BodyLoggingPolicy::default());

    let err = harness
        .middleware
        .intercept_client(get("/items/9"), base_url(), "getItem", |_, _| async move {
            Err::<Response<Option<Body>>, anyhow::Error>(Upstream(503).into())
        })
        .await
        .unwrap_err();

    let upstream = err.downcast_ref::<Upstream>().expect("original error");
    assert_eq!(upstream.0, 503);

    let entries = harness.entries();
    let errors: Vec<_> = entries
        .iter()
        .filter(|entry| entry.get("error").is_some())
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["error"], "upstream unavailable: 503");
    assert_eq!(errors[0]["operationID"], "getItem");
    assert!(entries.iter().all(|entry| entry.get("statusCode").is_none()));
}

// Test: Request bodies reach the continuation unchanged under every policy
#[tokio::test]
async fn test_request_body_forwarded_under_each_policy() {
    for policy in [
        BodyLoggingPolicy::Never,
        BodyLoggingPolicy::up_to(2),
        BodyLoggingPolicy::up_to(1024),
    ] {
        let sink = CollectingSink::default();
        let middleware = LoggingMiddleware::with_sink(
            &MiddlewareConfig {
                body_logging: policy,
                ..MiddlewareConfig::default()
            },
            Box::new(sink.clone()),
        );

        let request = Request::post("/items")
            .body(Some(full("{\"name\":\"rex\"}")))
            .unwrap();

        middleware
            .intercept_client(request, base_url(), "createItem", |request, _| async move {
                assert_eq!(read(request.into_body()).await, "{\"name\":\"rex\"}");
                Ok::<_, anyhow::Error>(Response::new(None))
            })
            .await
            .unwrap();

        let records = sink.records.lock();
        let (request_body, response_body) = match policy {
            BodyLoggingPolicy::Never => ("<redacted>", "<redacted>"),
            BodyLoggingPolicy::UpTo { max_bytes: 2 } => ("<14 bytes>", "<none>"),
            BodyLoggingPolicy::UpTo { .. } => ("{\"name\":\"rex\"}", "<none>"),
        };
        assert_eq!(records[0].1.get("requestBody"), Some(request_body));
        assert_eq!(records[1].1.get("responseBody"), Some(response_body));
    }
}

// Test: Server calls on a shared middleware can run on spawned tasks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_intercept_server_on_spawned_tasks() {
    let sink = CollectingSink::default();
    let middleware = Arc::new(LoggingMiddleware::with_sink(
        &MiddlewareConfig::default(),
        Box::new(sink.clone()),
    ));

    let mut handles = Vec::new();
    for id in 0..4 {
        let middleware = Arc::clone(&middleware);
        handles.push(tokio::spawn(async move {
            let request = Request::put(format!("/pets/{}", id))
                .body(Some(from_stream(futures::stream::iter(vec![
                    Ok::<_, io::Error>(Bytes::from_static(b"{\"name\":")),
                    Ok(Bytes::from_static(b"\"rex\"}")),
                ]))))
                .unwrap();
            let metadata = ServerRequestMetadata::new().with_path_parameter("id", id.to_string());

            middleware
                .intercept_server(request, metadata, "updatePet", |request, metadata| async move {
                    assert!(metadata.path_parameters.contains_key("id"));
                    assert_eq!(read(request.into_body()).await, "{\"name\":\"rex\"}");
                    Ok::<_, anyhow::Error>(Response::new(Some(full("ok"))))
                })
                .await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(read(response.into_body()).await, "ok");
    }

    let records = sink.records.lock();
    assert_eq!(records.len(), 8);
    for pair in records.chunks(2) {
        assert_eq!(pair[0].0, "Request");
        assert_eq!(pair[0].1.get("requestBody"), Some("{\"name\":\"rex\"}"));
        assert_eq!(pair[0].1.get("baseURL"), Some("<nil>"));
        assert_eq!(pair[1].0, "Response");
        assert_eq!(pair[0].1.get("path"), pair[1].1.get("path"));
    }
}

// Test: An over-limit request stream fails the call before the continuation runs
#[tokio::test]
async fn test_request_capture_failure_skips_continuation() {
    let sink = CollectingSink::default();
    let middleware = LoggingMiddleware::with_sink(
        &MiddlewareConfig {
            body_logging: BodyLoggingPolicy::up_to(3),
            ..MiddlewareConfig::default()
        },
        Box::new(sink.clone()),
    );

    let request = Request::post("/items")
        .body(Some(from_stream(futures::stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"def")),
        ]))))
        .unwrap();

    let called = AtomicBool::new(false);
    let err = middleware
        .intercept_client(request, base_url(), "createItem", |_, _| async {
            called.store(true, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(Response::new(None))
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "body exceeded the 3 byte capture limit");
    assert!(matches!(
        err.downcast_ref::<CaptureError>(),
        Some(CaptureError::LengthLimitExceeded { limit: 3 })
    ));
    assert!(!called.load(Ordering::SeqCst));
    assert!(sink.records.lock().is_empty());
}
