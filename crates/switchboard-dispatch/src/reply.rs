//! The handler result model.
//!
//! A [`Reply`] is what every handler returns: either a buffered JSON
//! payload or a streamed byte sequence, each carrying an HTTP status.
//! Exactly one of the two shapes is active per response, and the
//! dispatcher consumes it exactly once.
//!
//! The wire format keeps the status on the transport response only; the
//! JSON payload is the body value itself, with one consistent error
//! envelope (`{"error": {"code", "message", "field_errors"?}}`) across
//! all failure classes.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use switchboard_bind::FieldError;
use switchboard_core::ScopeGuard;

use crate::body::ReplyBody;

/// Body emitted when a reply's JSON value itself refuses to serialize.
const SERIALIZATION_FALLBACK: &[u8] =
    br#"{"error":{"code":"SERIALIZATION_FAILED","message":"failed to serialize response body"}}"#;

/// Boxed error type carried by streaming bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A byte-sequence producer for streaming replies.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A handler's response: buffered JSON or a byte stream.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use serde_json::json;
/// use switchboard_dispatch::Reply;
///
/// let created = Reply::json_with_status(StatusCode::CREATED, json!({"id": 7}));
/// assert_eq!(created.status(), StatusCode::CREATED);
///
/// let default = Reply::json(json!({"id": 7}));
/// assert_eq!(default.status(), StatusCode::OK);
/// ```
pub enum Reply {
    /// A buffered JSON payload.
    Json {
        /// Transport status code.
        status: StatusCode,
        /// The serialized body value.
        body: Value,
    },
    /// A streamed byte sequence.
    Stream {
        /// Transport status code.
        status: StatusCode,
        /// Declared content type of the stream.
        content_type: String,
        /// The byte-sequence producer, read until exhausted.
        stream: ByteStream,
    },
}

impl Reply {
    /// Creates a 200 JSON reply from any serializable body.
    ///
    /// A body that fails to serialize (a non-string map key, a failing
    /// `Serialize` impl) degrades into a 500 error reply; handlers that
    /// need to observe that case should serialize up front.
    #[must_use]
    pub fn json(body: impl Serialize) -> Self {
        Self::json_with_status(StatusCode::OK, body)
    }

    /// Creates a JSON reply with an explicit status.
    ///
    /// Statuses set by the handler always take precedence; the 200
    /// default only applies through [`json`](Self::json) and [`ok`](Self::ok).
    #[must_use]
    pub fn json_with_status(status: StatusCode, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self::Json { status, body },
            Err(e) => Self::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_FAILED",
                e.to_string(),
            ),
        }
    }

    /// Creates an empty 200 JSON reply.
    #[must_use]
    pub fn ok() -> Self {
        Self::Json {
            status: StatusCode::OK,
            body: Value::Null,
        }
    }

    /// Creates an error reply carrying the uniform error envelope.
    #[must_use]
    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self::Json {
            status,
            body: json!({
                "error": {
                    "code": code,
                    "message": message.into(),
                }
            }),
        }
    }

    /// Creates a 400 reply listing every field-level validation failure.
    #[must_use]
    pub fn validation_failure(errors: Vec<FieldError>) -> Self {
        Self::Json {
            status: StatusCode::BAD_REQUEST,
            body: json!({
                "error": {
                    "code": "VALIDATION_FAILED",
                    "message": "request validation failed",
                    "field_errors": serde_json::to_value(&errors).unwrap_or(Value::Null),
                }
            }),
        }
    }

    /// Creates a 200 streaming reply with the given content type.
    #[must_use]
    pub fn stream(
        content_type: impl Into<String>,
        stream: impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    ) -> Self {
        Self::stream_with_status(StatusCode::OK, content_type, stream)
    }

    /// Creates a streaming reply with an explicit status.
    #[must_use]
    pub fn stream_with_status(
        status: StatusCode,
        content_type: impl Into<String>,
        stream: impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    ) -> Self {
        Self::Stream {
            status,
            content_type: content_type.into(),
            stream: Box::pin(stream),
        }
    }

    /// Creates a 200 streaming reply with the conventional
    /// `application/octet-stream` content type.
    #[must_use]
    pub fn octet_stream(
        stream: impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    ) -> Self {
        Self::stream("application/octet-stream", stream)
    }

    /// Returns the reply's status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Json { status, .. } | Self::Stream { status, .. } => *status,
        }
    }

    /// Returns `true` for streaming replies.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }

    /// Converts the reply into a wire response.
    ///
    /// JSON replies serialize their value with
    /// `Content-Type: application/json`; streaming replies forward their
    /// byte sequence under the declared content type. The status is set
    /// on the transport response only.
    #[must_use]
    pub fn into_response(self) -> Response<ReplyBody> {
        self.into_response_scoped(None)
    }

    /// Converts the reply, attaching the request's scope guard to the
    /// response body so disposal follows the body's lifetime.
    pub(crate) fn into_response_scoped(self, guard: Option<ScopeGuard>) -> Response<ReplyBody> {
        let (status, content_type, body) = match self {
            Self::Json { status, body } => {
                let (status, bytes) = match serde_json::to_vec(&body) {
                    Ok(bytes) => (status, Bytes::from(bytes)),
                    Err(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Bytes::from_static(SERIALIZATION_FALLBACK),
                    ),
                };
                (
                    status,
                    HeaderValue::from_static("application/json"),
                    ReplyBody::full(bytes),
                )
            }
            Self::Stream {
                status,
                content_type,
                stream,
            } => {
                let content_type = HeaderValue::from_str(&content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
                (status, content_type, ReplyBody::streaming(stream))
            }
        };

        let body = match guard {
            Some(guard) => body.with_scope(guard),
            None => body,
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        response
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { status, body } => f
                .debug_struct("Reply::Json")
                .field("status", status)
                .field("body", body)
                .finish(),
            Self::Stream {
                status,
                content_type,
                ..
            } => f
                .debug_struct("Reply::Stream")
                .field("status", status)
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}

/// Error returned by [`StreamSender`] when the consumer is gone.
#[derive(Debug, Error)]
#[error("stream receiver dropped")]
pub struct StreamClosed;

/// Producer half of [`stream_channel`].
///
/// Cloneable; handlers hand it to a spawned task that pushes chunks while
/// the dispatcher forwards them to the client.
#[derive(Debug, Clone)]
pub struct StreamSender {
    tx: mpsc::Sender<Result<Bytes, BoxError>>,
}

impl StreamSender {
    /// Sends one chunk, waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StreamClosed`] when the consuming side has been dropped
    /// (the client disconnected or the response was abandoned).
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<(), StreamClosed> {
        self.tx
            .send(Ok(chunk.into()))
            .await
            .map_err(|_| StreamClosed)
    }

    /// Sends one chunk without waiting; fails when full or closed.
    pub fn try_send(&self, chunk: impl Into<Bytes>) -> Result<(), StreamClosed> {
        self.tx.try_send(Ok(chunk.into())).map_err(|_| StreamClosed)
    }

    /// Terminates the stream with an error.
    pub async fn fail(&self, error: impl Into<BoxError>) -> Result<(), StreamClosed> {
        self.tx
            .send(Err(error.into()))
            .await
            .map_err(|_| StreamClosed)
    }

    /// Checks whether the consuming side is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct ChannelStream {
    rx: mpsc::Receiver<Result<Bytes, BoxError>>,
}

impl Stream for ChannelStream {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Creates a channel-backed byte stream.
///
/// Returns the sender for the producing task and the stream to hand to
/// [`Reply::stream`]. Dropping all senders ends the stream cleanly.
///
/// # Example
///
/// ```rust
/// use switchboard_dispatch::{stream_channel, Reply};
///
/// # async fn example() {
/// let (tx, stream) = stream_channel(8);
/// tokio::spawn(async move {
///     let _ = tx.send("chunk one\n").await;
///     let _ = tx.send("chunk two\n").await;
/// });
/// let reply = Reply::stream("text/plain", stream);
/// assert!(reply.is_stream());
/// # }
/// ```
#[must_use]
pub fn stream_channel(capacity: usize) -> (StreamSender, ByteStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (StreamSender { tx }, Box::pin(ChannelStream { rx }))
}
