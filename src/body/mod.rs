// Body module - boxed message bodies and the capture policy applied to them

pub mod policy;

pub use policy::*;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;

use crate::error::BoxError;

/// A one-shot message body.
///
/// The declared length, when known, is exposed through the body's exact
/// size hint. Stream-backed bodies have no exact hint.
pub type Body = BoxBody<Bytes, BoxError>;

/// Body over an in-memory buffer, with a known length
pub fn full(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Zero-length body
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body over a chunk stream, with an unknown length
pub fn from_stream<S, E>(stream: S) -> Body
where
    S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    StreamBody::new(stream.map_ok(Frame::data).map_err(|e| -> BoxError { e.into() })).boxed()
}
