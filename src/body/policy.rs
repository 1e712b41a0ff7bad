//! Body logging policy
//!
//! Decides, per body, whether it may be captured for logging and returns the
//! body the next consumer must read instead. A body is either passed through
//! unread or fully buffered and replaced by a body over the buffer; the
//! original bytes always reach the downstream consumer exactly once.

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Collected, LengthLimitError, Limited};
use hyper::body::Body as _;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::{full, Body};
use crate::constants::{
    BODY_NONE, BODY_NON_TEXTUAL, BODY_REDACTED, BODY_UNKNOWN_LENGTH, DEFAULT_MAX_BODY_BYTES,
};
use crate::error::CaptureError;

/// Whether and how much of a body may be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BodyLoggingPolicy {
    /// Never capture bodies
    Never,
    /// Capture bodies of at most `max_bytes`. Bodies of unknown length are
    /// buffered up to the limit and fail the call if they exceed it.
    UpTo { max_bytes: usize },
}

impl BodyLoggingPolicy {
    pub fn up_to(max_bytes: usize) -> Self {
        BodyLoggingPolicy::UpTo { max_bytes }
    }

    /// Apply the policy to `body`, see [`capture`]
    pub async fn apply(
        &self,
        body: Option<Body>,
    ) -> Result<(BodyLogOutcome, Option<Body>), CaptureError> {
        capture(self, body).await
    }
}

impl Default for BodyLoggingPolicy {
    fn default() -> Self {
        BodyLoggingPolicy::up_to(DEFAULT_MAX_BODY_BYTES)
    }
}

/// Loggable representation of one body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLogOutcome {
    /// There is no body
    None,
    /// The policy forbids capturing the body
    Redacted,
    /// The body's length could not be determined
    UnknownLength,
    /// The declared length exceeds the policy limit
    TooLarge(u64),
    /// The body was buffered in full
    Captured(Bytes),
}

impl BodyLogOutcome {
    /// Display text of the outcome.
    ///
    /// Captured bytes are shown as text when they are valid UTF-8 (which
    /// covers plain ASCII) and replaced by a placeholder otherwise. Rendering
    /// never affects the bytes forwarded downstream.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            BodyLogOutcome::None => Cow::Borrowed(BODY_NONE),
            BodyLogOutcome::Redacted => Cow::Borrowed(BODY_REDACTED),
            BodyLogOutcome::UnknownLength => Cow::Borrowed(BODY_UNKNOWN_LENGTH),
            BodyLogOutcome::TooLarge(size) => Cow::Owned(format!("<{} bytes>", size)),
            BodyLogOutcome::Captured(data) => {
                Cow::Borrowed(std::str::from_utf8(data).unwrap_or(BODY_NON_TEXTUAL))
            }
        }
    }
}

impl fmt::Display for BodyLogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Apply `policy` to `body`.
///
/// Returns the outcome together with the body to hand to the next consumer:
/// the original body when it was not read, or a new body over the buffered
/// bytes when it was captured. Bodies with a declared length above the limit
/// are never read.
///
/// `Never` redacts whether or not a body is present, so the record does not
/// reveal its presence.
pub async fn capture(
    policy: &BodyLoggingPolicy,
    body: Option<Body>,
) -> Result<(BodyLogOutcome, Option<Body>), CaptureError> {
    let max_bytes = match *policy {
        BodyLoggingPolicy::Never => return Ok((BodyLogOutcome::Redacted, body)),
        BodyLoggingPolicy::UpTo { max_bytes } => max_bytes,
    };

    let Some(body) = body else {
        return Ok((BodyLogOutcome::None, None));
    };

    if let Some(length) = body.size_hint().exact() {
        if length > max_bytes as u64 {
            return Ok((BodyLogOutcome::TooLarge(length), Some(body)));
        }
    }

    let data = collect_up_to(body, max_bytes).await?;
    Ok((BodyLogOutcome::Captured(data.clone()), Some(full(data))))
}

async fn collect_up_to(body: Body, max_bytes: usize) -> Result<Bytes, CaptureError> {
    // Boxed so callers' futures stay `Send` for any borrow of the middleware.
    let collected: BoxFuture<'static, Result<Collected<Bytes>, _>> =
        Box::pin(Limited::new(body, max_bytes).collect());
    match collected.await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            Err(CaptureError::LengthLimitExceeded { limit: max_bytes })
        }
        Err(e) => Err(CaptureError::Read(e)),
    }
}
