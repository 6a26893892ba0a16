//! Registration-time configuration errors.

use thiserror::Error;

/// A configuration error detected while registering endpoints.
///
/// Configuration errors are fatal: they are raised before any request is
/// served and are never converted into per-request responses. Callers
/// typically propagate them out of startup with `?`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The endpoint declares a method outside the supported verb set.
    #[error(
        "unsupported HTTP method '{method}' for '{path}': endpoints accept GET, POST, PUT, DELETE, PATCH"
    )]
    UnsupportedMethod {
        /// The offending method.
        method: String,
        /// The endpoint path it was declared for.
        path: String,
    },

    /// A file binding declares a size limit that is not a valid
    /// non-negative byte count.
    #[error("invalid size limit '{spec}' for file part '{part}': {reason}")]
    InvalidSizeLimit {
        /// The form part name carrying the limit.
        part: String,
        /// The raw limit spec as declared.
        spec: String,
        /// Why the spec failed to parse.
        reason: String,
    },

    /// Two bindings in one descriptor claim the same source name.
    #[error("duplicate {kind} binding '{name}' in one descriptor")]
    DuplicateBinding {
        /// The binding source kind ("header" or "file").
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },
}
