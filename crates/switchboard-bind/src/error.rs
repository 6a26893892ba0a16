//! Binding error types.

use http::StatusCode;
use std::fmt;

/// The request source a binding failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindSource {
    /// The structured request body.
    Body,
    /// An HTTP header.
    Header,
    /// A multipart file part.
    File,
}

impl fmt::Display for BindSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "body"),
            Self::Header => write!(f, "header"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A failure while reconstructing a typed value from a request.
///
/// Binding errors are recovered locally: the dispatcher converts them to a
/// 400-class JSON response carrying the message, and the handler never
/// runs. They are never fatal to the process.
///
/// # Example
///
/// ```rust
/// use switchboard_bind::{BindError, BindSource};
/// use http::StatusCode;
///
/// let err = BindError::part_too_large("avatar", 1024, 1025);
/// assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
/// assert!(err.to_string().contains("1024"));
/// ```
#[derive(Debug)]
pub struct BindError {
    source: BindSource,
    kind: BindErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindErrorKind {
    /// The body could not be decoded into the target type.
    MalformedBody,
    /// The request carries a content type the binder does not decode.
    UnsupportedMediaType,
    /// A required header is absent.
    MissingHeader,
    /// A header value failed its scalar conversion.
    InvalidHeader,
    /// A required file part is absent.
    MissingPart,
    /// A file part exceeds its declared size limit.
    PartTooLarge,
    /// The multipart payload itself is malformed.
    MalformedMultipart,
}

impl BindError {
    /// Creates an error for a body that could not be decoded.
    #[must_use]
    pub fn malformed_body(details: impl Into<String>) -> Self {
        Self {
            source: BindSource::Body,
            kind: BindErrorKind::MalformedBody,
            message: format!("malformed body: {}", details.into()),
        }
    }

    /// Creates an error for an undecodable content type.
    #[must_use]
    pub fn unsupported_media_type(actual: &str) -> Self {
        Self {
            source: BindSource::Body,
            kind: BindErrorKind::UnsupportedMediaType,
            message: format!("unsupported content type '{actual}'"),
        }
    }

    /// Creates an error for a required header that is absent.
    #[must_use]
    pub fn missing_header(name: &str) -> Self {
        Self {
            source: BindSource::Header,
            kind: BindErrorKind::MissingHeader,
            message: format!("missing required header '{name}'"),
        }
    }

    /// Creates an error for a header value that failed conversion.
    #[must_use]
    pub fn invalid_header(name: &str, details: impl Into<String>) -> Self {
        Self {
            source: BindSource::Header,
            kind: BindErrorKind::InvalidHeader,
            message: format!("invalid header '{name}': {}", details.into()),
        }
    }

    /// Creates an error for a required file part that is absent.
    #[must_use]
    pub fn missing_part(name: &str) -> Self {
        Self {
            source: BindSource::File,
            kind: BindErrorKind::MissingPart,
            message: format!("missing required file part '{name}'"),
        }
    }

    /// Creates an error for a file part over its size limit.
    ///
    /// The message names the limit, so clients learn the bound they broke.
    #[must_use]
    pub fn part_too_large(name: &str, limit: usize, actual: usize) -> Self {
        Self {
            source: BindSource::File,
            kind: BindErrorKind::PartTooLarge,
            message: format!(
                "file part '{name}' exceeds size limit: max {limit} bytes, got {actual} bytes"
            ),
        }
    }

    /// Creates an error for a malformed multipart payload.
    #[must_use]
    pub fn malformed_multipart(details: impl Into<String>) -> Self {
        Self {
            source: BindSource::Body,
            kind: BindErrorKind::MalformedMultipart,
            message: format!("malformed multipart payload: {}", details.into()),
        }
    }

    /// Returns the source the failure originated from.
    #[must_use]
    pub fn bind_source(&self) -> BindSource {
        self.source
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            BindErrorKind::MalformedBody
            | BindErrorKind::MissingHeader
            | BindErrorKind::InvalidHeader
            | BindErrorKind::MissingPart
            | BindErrorKind::MalformedMultipart => StatusCode::BAD_REQUEST,
            BindErrorKind::PartTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            BindErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Returns the machine-readable code used in error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            BindErrorKind::MalformedBody => "MALFORMED_BODY",
            BindErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            BindErrorKind::MissingHeader => "MISSING_HEADER",
            BindErrorKind::InvalidHeader => "INVALID_HEADER",
            BindErrorKind::MissingPart => "MISSING_FILE_PART",
            BindErrorKind::PartTooLarge => "FILE_PART_TOO_LARGE",
            BindErrorKind::MalformedMultipart => "MALFORMED_MULTIPART",
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BindError {}
