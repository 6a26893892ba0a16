//! The wire response body.
//!
//! [`ReplyBody`] is what the dispatcher hands back to the transport: a
//! fully buffered payload for JSON replies, or the handler's byte stream
//! for streaming replies, forwarded chunk by chunk as produced.
//!
//! The body also carries the request's [`ScopeGuard`]. Whatever the
//! transport does with the response — drain it, error out, or drop it on
//! client disconnect — dropping the body runs the scope's disposer
//! exactly once. That is how disposal stays unconditional even when a
//! stream is abandoned halfway through.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use http_body::{Body, Frame, SizeHint};
use switchboard_core::ScopeGuard;

use crate::reply::{BoxError, ByteStream};

enum BodyKind {
    /// Buffered payload, yielded as a single frame.
    Full(Option<Bytes>),
    /// Forwarded byte stream.
    Stream(ByteStream),
}

/// Response body for dispatched requests.
pub struct ReplyBody {
    kind: BodyKind,
    _scope: Option<ScopeGuard>,
}

impl ReplyBody {
    /// Creates a buffered body.
    #[must_use]
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self {
            kind: BodyKind::Full(Some(bytes.into())),
            _scope: None,
        }
    }

    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }

    /// Creates a streaming body.
    #[must_use]
    pub fn streaming(stream: ByteStream) -> Self {
        Self {
            kind: BodyKind::Stream(stream),
            _scope: None,
        }
    }

    /// Attaches the request's scope guard; its disposer runs when this
    /// body is dropped.
    #[must_use]
    pub(crate) fn with_scope(mut self, guard: ScopeGuard) -> Self {
        self._scope = Some(guard);
        self
    }

    /// Returns `true` for streaming bodies.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self.kind, BodyKind::Stream(_))
    }
}

impl Body for ReplyBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match &mut this.kind {
            BodyKind::Full(chunk) => Poll::Ready(chunk.take().map(|bytes| Ok(Frame::data(bytes)))),
            BodyKind::Stream(stream) => match stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
                Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        matches!(self.kind, BodyKind::Full(None))
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            BodyKind::Full(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            BodyKind::Full(None) => SizeHint::with_exact(0),
            BodyKind::Stream(_) => SizeHint::default(),
        }
    }
}

impl fmt::Debug for ReplyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            BodyKind::Full(Some(bytes)) => format!("full({} bytes)", bytes.len()),
            BodyKind::Full(None) => "full(drained)".to_string(),
            BodyKind::Stream(_) => "stream".to_string(),
        };
        f.debug_struct("ReplyBody")
            .field("kind", &kind)
            .field("scoped", &self._scope.is_some())
            .finish()
    }
}
