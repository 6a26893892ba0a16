//! Multipart payload collection.
//!
//! The binder looks file parts up by their declared form name, so the
//! whole `multipart/form-data` payload is parsed once into a [`PartMap`]:
//! text parts keyed by name (they feed body-tagged fields), file parts
//! keyed by name as [`UploadedFile`]s. When a name repeats, the first
//! part wins.

use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use http::{header, HeaderMap};

use crate::BindError;

/// A file received through a `multipart/form-data` part.
///
/// Carries the part's metadata and its fully buffered content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    file_name: Option<String>,
    content_type: Option<mime::Mime>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates an uploaded file from its components.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        file_name: Option<String>,
        content_type: Option<mime::Mime>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name,
            content_type,
            data,
        }
    }

    /// Returns the form part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the part's MIME type.
    #[must_use]
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// Returns the file content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// All parts of one multipart payload, indexed by form name.
#[derive(Debug, Default)]
pub struct PartMap {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl PartMap {
    /// Returns a text part's value by form name.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// Iterates over text parts as `(name, value)` pairs.
    pub fn texts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.texts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Removes and returns a file part by form name.
    #[must_use]
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// Checks whether a file part exists under the name.
    #[must_use]
    pub fn has_file(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Returns the number of file parts.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns the number of text parts.
    #[must_use]
    pub fn text_count(&self) -> usize {
        self.texts.len()
    }
}

/// Parses a buffered multipart payload into a [`PartMap`].
///
/// Parts with a `filename` in their disposition are collected as files;
/// the rest are decoded as UTF-8 text. Parts without a form name are
/// skipped.
///
/// # Errors
///
/// Returns a [`BindError`] when the Content-Type header is missing or
/// carries no boundary, or when the payload itself is malformed.
pub async fn collect_parts(headers: &HeaderMap, body: Bytes) -> Result<PartMap, BindError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| BindError::malformed_multipart("missing content-type header"))?;

    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| BindError::malformed_multipart("missing or invalid boundary"))?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = PartMap::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BindError::malformed_multipart(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let file_name = field.file_name().map(String::from);
            let content_type = field.content_type().cloned();
            let data = field
                .bytes()
                .await
                .map_err(|e| BindError::malformed_multipart(e.to_string()))?;

            parts
                .files
                .entry(name.clone())
                .or_insert_with(|| UploadedFile::new(name, file_name, content_type, data));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| BindError::malformed_multipart(e.to_string()))?;
            parts.texts.entry(name).or_insert(text);
        }
    }

    Ok(parts)
}
