//! # Switchboard
//!
//! **Typed HTTP endpoint dispatch for Rust services**
//!
//! Switchboard lets a service declare handlers as strongly-typed async
//! functions over a request payload and a per-request dependency scope,
//! and wires them into any router through one registration step:
//!
//! - **Typed binding** – one value reconstructed from body, headers, and
//!   multipart file parts, driven by a per-type plan compiled at
//!   registration time
//! - **Structural validation** – every field failure reported, not just
//!   the first
//! - **Two reply shapes** – buffered JSON or a streamed byte sequence,
//!   through one endpoint API
//! - **Guaranteed disposal** – the request scope is released exactly once
//!   on every path, including mid-stream client disconnects
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http::Method;
//! use serde::Deserialize;
//! use serde_json::json;
//! use switchboard::prelude::*;
//! use validator::Validate;
//!
//! #[derive(Deserialize, Validate)]
//! struct CreateNote {
//!     #[validate(length(min = 1))]
//!     text: String,
//! }
//! impl Bind for CreateNote {}
//!
//! # fn main() -> Result<(), switchboard::core::ConfigError> {
//! let registrar = Registrar::from_factory(
//!     |_parts: &RequestParts| -> Result<(Scope, Disposer), ResolveError> {
//!         Ok((Scope::empty(), Box::new(|| {}) as Disposer))
//!     },
//! );
//!
//! let create = Endpoint::json(Method::POST, "/notes", |_scope: Scope, note: CreateNote| async move {
//!     Reply::json_with_status(http::StatusCode::CREATED, json!({"text": note.text}))
//! })?;
//!
//! let mut table = RouteTable::new();
//! registrar.mount(&mut table, [create])?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/switchboard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use switchboard_core as core;

// Re-export binding types
pub use switchboard_bind as bind;

// Re-export dispatch types
pub use switchboard_dispatch as dispatch;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    pub use switchboard_core::{
        ConfigError, Disposer, RequestId, RequestParts, ResolveError, Scope, ScopeFactory,
        ScopeGuard,
    };

    // Re-export binding declarations and the validation adapter
    pub use switchboard_bind::{
        check, parse_scalar, Bind, BindError, BindingDescriptor, FieldError, UploadedFile,
    };

    // Re-export endpoint and dispatch types
    pub use switchboard_dispatch::{
        stream_channel, Endpoint, Registrar, Reply, ReplyBody, RouteRegistry, RouteTable,
        StreamSender,
    };
}
