// Interception pipeline module - logs one request/response cycle around a continuation
//
// Each intercepted call goes through BeforeCall -> AfterSuccess | AfterFailure:
// the request body is captured and a "Request" record emitted, the
// continuation runs, then either the response body is captured and a
// "Response" record emitted, or a "Request error" record is emitted and the
// continuation's error is returned unchanged.

use std::fmt;
use std::future::Future;

use http::Uri;
use tokio::sync::Mutex;

use crate::body::{Body, BodyLoggingPolicy};
use crate::config::{LogFileNames, MiddlewareConfig};
use crate::constants::DEFAULT_LOGGER_LABEL;
use crate::error::{CaptureError, SinkError};
use crate::record::{Level, RecordMetadata};
use crate::sink::{JsonFileSink, LogSink, MultiplexSink, StreamSink};

pub mod context;
pub mod records;

pub use context::{join_url, CallContext, ServerRequestMetadata};
pub use records::{failure_record, request_record, response_record, RequestSummary};

pub type HttpRequest = http::Request<Option<Body>>;
pub type HttpResponse = http::Response<Option<Body>>;

/// Level every pipeline record is emitted at
const RECORD_LEVEL: Level = Level::Debug;

const REQUEST_MESSAGE: &str = "Request";
const RESPONSE_MESSAGE: &str = "Response";
const FAILURE_MESSAGE: &str = "Request error";

/// Logging middleware for client and server calls
///
/// One instance is a serialized execution domain: concurrent calls are queued
/// on an internal gate and each runs to completion, continuation included,
/// before the next begins. Calling back into the same instance from inside a
/// continuation therefore deadlocks.
pub struct LoggingMiddleware {
    sink: Box<dyn LogSink>,
    policy: BodyLoggingPolicy,
    log_prefix: String,
    app_name: Option<String>,
    file_names: LogFileNames,
    gate: Mutex<()>,
}

impl LoggingMiddleware {
    /// Create a middleware writing to the default sink set of `config`
    pub async fn new(config: &MiddlewareConfig) -> Result<Self, SinkError> {
        let sink = Self::default_sink(config).await?;
        Ok(Self::with_sink(config, Box::new(sink)))
    }

    /// Create a middleware writing to an explicit sink
    pub fn with_sink(config: &MiddlewareConfig, sink: Box<dyn LogSink>) -> Self {
        Self {
            sink,
            policy: config.body_logging,
            log_prefix: config.log_prefix.clone(),
            app_name: config.app_name.clone(),
            file_names: config.file_names(),
            gate: Mutex::new(()),
        }
    }

    /// Standard output, the derived JSON file and, if enabled, the derived
    /// text file, all at the configured level.
    pub async fn default_sink(config: &MiddlewareConfig) -> Result<MultiplexSink, SinkError> {
        let mut multiplex = MultiplexSink::default();

        multiplex.push(Box::new(
            StreamSink::new(DEFAULT_LOGGER_LABEL).with_prefix(config.log_prefix.clone()),
        ));
        multiplex.push(Box::new(
            JsonFileSink::new(
                DEFAULT_LOGGER_LABEL,
                config.json_log_path(),
                config.log_prefix.clone(),
            )?
            .with_write_guard(config.file_writes),
        ));
        if config.text_log {
            multiplex.push(Box::new(
                StreamSink::append_to_file(DEFAULT_LOGGER_LABEL, &config.text_log_path())
                    .await?
                    .with_prefix(config.log_prefix.clone()),
            ));
        }

        multiplex.set_level(config.level);
        Ok(multiplex)
    }

    pub fn policy(&self) -> BodyLoggingPolicy {
        self.policy
    }

    pub fn log_prefix(&self) -> &str {
        &self.log_prefix
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn file_names(&self) -> &LogFileNames {
        &self.file_names
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub fn sink_mut(&mut self) -> &mut dyn LogSink {
        self.sink.as_mut()
    }

    pub fn level(&self) -> Level {
        self.sink.level()
    }

    /// Records are emitted only while `level` is at or below debug
    pub fn set_level(&mut self, level: Level) {
        self.sink.set_level(level);
    }

    /// Client side: `base_url` is the server the request is sent to
    pub async fn intercept_client<F, Fut, E>(
        &self,
        request: HttpRequest,
        base_url: Uri,
        operation_id: &str,
        next: F,
    ) -> Result<HttpResponse, E>
    where
        F: FnOnce(HttpRequest, Uri) -> Fut + Send,
        Fut: Future<Output = Result<HttpResponse, E>> + Send,
        E: From<CaptureError> + fmt::Display + Send,
    {
        self.intercept(request, base_url, operation_id, next).await
    }

    /// Server side: `metadata` is the routing information of the request
    pub async fn intercept_server<F, Fut, E>(
        &self,
        request: HttpRequest,
        metadata: ServerRequestMetadata,
        operation_id: &str,
        next: F,
    ) -> Result<HttpResponse, E>
    where
        F: FnOnce(HttpRequest, ServerRequestMetadata) -> Fut + Send,
        Fut: Future<Output = Result<HttpResponse, E>> + Send,
        E: From<CaptureError> + fmt::Display + Send,
    {
        self.intercept(request, metadata, operation_id, next).await
    }

    /// Run `next` with `request` and `context`, logging both sides.
    ///
    /// Bodies reach `next` and the caller with their exact bytes. An error
    /// from `next` is returned as the same value after it has been logged. A
    /// body that cannot be captured fails the call with the converted
    /// [`CaptureError`]; on the response side a failure record is emitted
    /// first. Dropping the returned future while `next` is pending emits
    /// nothing further.
    pub async fn intercept<C, F, Fut, E>(
        &self,
        request: HttpRequest,
        context: C,
        operation_id: &str,
        next: F,
    ) -> Result<HttpResponse, E>
    where
        C: CallContext,
        F: FnOnce(HttpRequest, C) -> Fut + Send,
        Fut: Future<Output = Result<HttpResponse, E>> + Send,
        E: From<CaptureError> + fmt::Display + Send,
    {
        let _gate = self.gate.lock().await;

        let summary = RequestSummary::new(&request, context.base_url());
        let (parts, body) = request.into_parts();
        let (request_body, body) = self.policy.apply(body).await?;

        self.emit(
            REQUEST_MESSAGE,
            &request_record(&summary, &request_body, operation_id),
        )
        .await;

        match next(HttpRequest::from_parts(parts, body), context).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                let (response_body, body) = match self.policy.apply(body).await {
                    Ok(captured) => captured,
                    Err(e) => {
                        tracing::warn!(
                            operation_id = %operation_id,
                            error = %e,
                            "{}Failed to capture response body",
                            self.log_prefix
                        );
                        self.emit(
                            FAILURE_MESSAGE,
                            &failure_record(&summary, &e.to_string(), operation_id),
                        )
                        .await;
                        return Err(e.into());
                    }
                };

                self.emit(
                    RESPONSE_MESSAGE,
                    &response_record(&summary, &parts, &response_body, operation_id),
                )
                .await;
                Ok(HttpResponse::from_parts(parts, body))
            }
            Err(error) => {
                self.emit(
                    FAILURE_MESSAGE,
                    &failure_record(&summary, &error.to_string(), operation_id),
                )
                .await;
                Err(error)
            }
        }
    }

    async fn emit(&self, message: &str, metadata: &RecordMetadata) {
        if RECORD_LEVEL >= self.sink.level() {
            self.sink.emit(RECORD_LEVEL, message, metadata).await;
        }
    }
}
