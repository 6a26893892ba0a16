//! Binding declarations and their compiled form.
//!
//! A [`BindingDescriptor`] is the explicit, per-type table of non-body
//! sources: which headers and which multipart file parts feed which
//! fields. Descriptors are declared once per target type (via [`Bind`])
//! and compiled at registration time into a [`BindingPlan`] — size specs
//! parsed, duplicates rejected — so nothing is inspected per request.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use switchboard_core::ConfigError;

use crate::multipart::UploadedFile;

/// Scalar conversion applied to a header value before it reaches a field.
type HeaderApply<T> = Box<dyn Fn(&mut T, &str) -> Result<(), String> + Send + Sync>;

/// Setter attaching an uploaded file to a field.
type FileApply<T> = Box<dyn Fn(&mut T, UploadedFile) + Send + Sync>;

/// A type that can be bound from a request.
///
/// Body-tagged fields are the type's own `serde` fields; anything sourced
/// from headers or file parts is declared in [`descriptor`]. The default
/// descriptor is empty, so plain `Deserialize` types bind from the body
/// alone with no extra declaration.
///
/// [`descriptor`]: Bind::descriptor
pub trait Bind: DeserializeOwned + Sized {
    /// Declares this type's non-body sources.
    #[must_use]
    fn descriptor() -> BindingDescriptor<Self> {
        BindingDescriptor::new()
    }
}

/// Parses a header value into any [`FromStr`] scalar, with a readable
/// error for the binding failure message.
///
/// # Example
///
/// ```rust
/// use switchboard_bind::parse_scalar;
///
/// let port: u16 = parse_scalar("8080").unwrap();
/// assert_eq!(port, 8080);
/// assert!(parse_scalar::<u16>("eighty").is_err());
/// ```
pub fn parse_scalar<F>(value: &str) -> Result<F, String>
where
    F: FromStr,
    F::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: F::Err| e.to_string())
}

struct HeaderSpec<T> {
    name: String,
    required: bool,
    apply: HeaderApply<T>,
}

struct FileSpec<T> {
    part: String,
    required: bool,
    limit: Option<String>,
    apply: FileApply<T>,
}

/// Declarative table of a type's header and file bindings.
///
/// Built fluently, consumed by [`compile`]. A field may be fed by at most
/// one binding; duplicate names are rejected at compile time.
///
/// [`compile`]: BindingDescriptor::compile
pub struct BindingDescriptor<T> {
    headers: Vec<HeaderSpec<T>>,
    files: Vec<FileSpec<T>>,
}

impl<T> BindingDescriptor<T> {
    /// Creates an empty descriptor (body-only binding).
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Declares an optional header binding.
    ///
    /// When the header is absent the field keeps whatever the body decode
    /// left in it; when present, `apply` runs the scalar conversion and
    /// its `Err` becomes the binding failure message.
    #[must_use]
    pub fn header(
        mut self,
        name: impl Into<String>,
        apply: impl Fn(&mut T, &str) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.headers.push(HeaderSpec {
            name: name.into(),
            required: false,
            apply: Box::new(apply),
        });
        self
    }

    /// Declares a required header binding; absence is a binding failure.
    #[must_use]
    pub fn required_header(
        mut self,
        name: impl Into<String>,
        apply: impl Fn(&mut T, &str) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.headers.push(HeaderSpec {
            name: name.into(),
            required: true,
            apply: Box::new(apply),
        });
        self
    }

    /// Declares an optional file binding.
    ///
    /// `limit` is a byte-size spec (`"1024"`, `"64KB"`, `"2MB"`), parsed
    /// when the descriptor is compiled; a malformed spec is a
    /// configuration error, never a per-request one. A missing part is
    /// silently skipped.
    #[must_use]
    pub fn file(
        mut self,
        part: impl Into<String>,
        limit: Option<&str>,
        apply: impl Fn(&mut T, UploadedFile) + Send + Sync + 'static,
    ) -> Self {
        self.files.push(FileSpec {
            part: part.into(),
            required: false,
            limit: limit.map(str::to_string),
            apply: Box::new(apply),
        });
        self
    }

    /// Declares a required file binding; a missing part is a binding
    /// failure.
    #[must_use]
    pub fn required_file(
        mut self,
        part: impl Into<String>,
        limit: Option<&str>,
        apply: impl Fn(&mut T, UploadedFile) + Send + Sync + 'static,
    ) -> Self {
        self.files.push(FileSpec {
            part: part.into(),
            required: true,
            limit: limit.map(str::to_string),
            apply: Box::new(apply),
        });
        self
    }

    /// Compiles the descriptor into a fixed per-request plan.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a duplicate header or part name, or
    /// for a size limit that is not a valid non-negative byte count.
    pub fn compile(self) -> Result<BindingPlan<T>, ConfigError> {
        let mut seen_headers = HashSet::new();
        for spec in &self.headers {
            if !seen_headers.insert(spec.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateBinding {
                    kind: "header",
                    name: spec.name.clone(),
                });
            }
        }

        let mut seen_parts = HashSet::new();
        let mut files = Vec::with_capacity(self.files.len());
        for spec in self.files {
            if !seen_parts.insert(spec.part.clone()) {
                return Err(ConfigError::DuplicateBinding {
                    kind: "file",
                    name: spec.part,
                });
            }
            let limit = match &spec.limit {
                Some(raw) => {
                    Some(
                        parse_size_spec(raw).map_err(|reason| ConfigError::InvalidSizeLimit {
                            part: spec.part.clone(),
                            spec: raw.clone(),
                            reason,
                        })?,
                    )
                }
                None => None,
            };
            files.push(CompiledFile {
                part: spec.part,
                required: spec.required,
                limit,
                apply: spec.apply,
            });
        }

        Ok(BindingPlan {
            headers: self
                .headers
                .into_iter()
                .map(|spec| CompiledHeader {
                    name: spec.name,
                    required: spec.required,
                    apply: spec.apply,
                })
                .collect(),
            files,
        })
    }
}

impl<T> Default for BindingDescriptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BindingDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("headers", &self.headers.iter().map(|h| &h.name).collect::<Vec<_>>())
            .field("files", &self.files.iter().map(|p| &p.part).collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) struct CompiledHeader<T> {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) apply: HeaderApply<T>,
}

pub(crate) struct CompiledFile<T> {
    pub(crate) part: String,
    pub(crate) required: bool,
    pub(crate) limit: Option<usize>,
    pub(crate) apply: FileApply<T>,
}

/// A compiled binding plan: the fixed table the binder walks per request.
///
/// Produced once per target type by [`BindingDescriptor::compile`] at
/// registration time, then shared for the endpoint's lifetime.
pub struct BindingPlan<T> {
    pub(crate) headers: Vec<CompiledHeader<T>>,
    pub(crate) files: Vec<CompiledFile<T>>,
}

impl<T> BindingPlan<T> {
    /// Returns the number of declared header bindings.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns the number of declared file bindings.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the plan binds any file parts.
    #[must_use]
    pub fn expects_files(&self) -> bool {
        !self.files.is_empty()
    }
}

impl<T> fmt::Debug for BindingPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingPlan")
            .field("headers", &self.headers.iter().map(|h| &h.name).collect::<Vec<_>>())
            .field("files", &self.files.iter().map(|p| &p.part).collect::<Vec<_>>())
            .finish()
    }
}

/// Parses a byte-size spec: a bare count (`"1024"`) or a count with a
/// `B`/`KB`/`MB`/`GB` suffix, case-insensitive.
fn parse_size_spec(spec: &str) -> Result<usize, String> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err("empty size spec".to_string());
    }

    let upper = trimmed.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(prefix) = upper.strip_suffix("GB") {
        (prefix, 1024 * 1024 * 1024)
    } else if let Some(prefix) = upper.strip_suffix("MB") {
        (prefix, 1024 * 1024)
    } else if let Some(prefix) = upper.strip_suffix("KB") {
        (prefix, 1024)
    } else if let Some(prefix) = upper.strip_suffix('B') {
        (prefix, 1)
    } else {
        (upper.as_str(), 1)
    };

    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not a non-negative integer".to_string());
    }

    let count: usize = digits
        .parse()
        .map_err(|_| "byte count out of range".to_string())?;

    count
        .checked_mul(multiplier)
        .ok_or_else(|| "byte count out of range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    struct Upload {
        #[serde(default)]
        label: String,
        #[serde(skip)]
        priority: u32,
        #[serde(skip)]
        file: Option<UploadedFile>,
    }

    impl Bind for Upload {
        fn descriptor() -> BindingDescriptor<Self> {
            BindingDescriptor::new()
                .header("x-priority", |u: &mut Self, v| {
                    u.priority = parse_scalar(v)?;
                    Ok(())
                })
                .file("file", Some("1024"), |u, f| u.file = Some(f))
        }
    }

    #[test]
    fn test_descriptor_compiles() {
        let plan = Upload::descriptor().compile().unwrap();
        assert_eq!(plan.header_count(), 1);
        assert_eq!(plan.file_count(), 1);
        assert!(plan.expects_files());
        assert_eq!(plan.files[0].limit, Some(1024));
    }

    #[test]
    fn test_default_descriptor_is_body_only() {
        #[derive(Deserialize)]
        struct Plain {
            #[allow(dead_code)]
            name: String,
        }
        impl Bind for Plain {}

        let plan = Plain::descriptor().compile().unwrap();
        assert_eq!(plan.header_count(), 0);
        assert!(!plan.expects_files());
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let descriptor = BindingDescriptor::<Upload>::new()
            .header("x-a", |_, _| Ok(()))
            .header("X-A", |_, _| Ok(()));

        let err = descriptor.compile().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateBinding { kind: "header", .. }
        ));
    }

    #[test]
    fn test_duplicate_file_rejected() {
        let descriptor = BindingDescriptor::<Upload>::new()
            .file("doc", None, |_, _| {})
            .required_file("doc", None, |_, _| {});

        let err = descriptor.compile().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateBinding { kind: "file", .. }
        ));
    }

    #[test]
    fn test_invalid_size_spec_is_config_error() {
        for bad in ["ten", "-1", "10XB", "", "KB"] {
            let descriptor =
                BindingDescriptor::<Upload>::new().file("doc", Some(bad), |_, _| {});
            let err = descriptor.compile().unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidSizeLimit { .. }),
                "spec {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_size_spec_forms() {
        assert_eq!(parse_size_spec("0").unwrap(), 0);
        assert_eq!(parse_size_spec("1024").unwrap(), 1024);
        assert_eq!(parse_size_spec("512B").unwrap(), 512);
        assert_eq!(parse_size_spec("64KB").unwrap(), 64 * 1024);
        assert_eq!(parse_size_spec("64kb").unwrap(), 64 * 1024);
        assert_eq!(parse_size_spec("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size_spec("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size_spec(" 16 KB ").unwrap(), 16 * 1024);
    }

    #[test]
    fn test_parse_scalar() {
        let n: u32 = parse_scalar("42").unwrap();
        assert_eq!(n, 42);

        let result: Result<u32, _> = parse_scalar("forty-two");
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptor_debug_lists_names() {
        let descriptor = Upload::descriptor();
        let debug = format!("{descriptor:?}");
        assert!(debug.contains("x-priority"));
        assert!(debug.contains("file"));
    }
}
