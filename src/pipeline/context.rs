//! Call context shapes
//!
//! The pipeline runs one routine for both client and server calls; the
//! context is what differs. A client call carries the base URL it is sent
//! to, a server call carries the routing metadata of the matched operation.

use http::Uri;
use std::collections::BTreeMap;

/// Context handed through the pipeline to the continuation
pub trait CallContext: Send {
    /// Base URL the request is resolved against, if the call has one
    fn base_url(&self) -> Option<String>;
}

/// Client side: the server's base URL
impl CallContext for Uri {
    fn base_url(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Routing metadata of a request received by a server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerRequestMetadata {
    /// Path parameters extracted by the router (name -> raw value)
    pub path_parameters: BTreeMap<String, String>,
}

impl ServerRequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }
}

impl CallContext for ServerRequestMetadata {
    fn base_url(&self) -> Option<String> {
        None
    }
}

/// Join a base URL and a request path with exactly one `/` between them
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
