//! # Switchboard Core
//!
//! Core types for the Switchboard endpoint-dispatch layer.
//!
//! This crate defines the vocabulary shared by the binder and the
//! dispatcher:
//!
//! - [`RequestParts`] — the immutable per-request view (method, URI,
//!   headers, buffered body) handed to binders and passthrough handlers.
//! - [`Scope`] — the per-request dependency scope, acquired through a
//!   [`ScopeFactory`] and released exactly once via [`ScopeGuard`].
//! - [`ConfigError`] — registration-time configuration failures, which are
//!   fatal and never surface as per-request errors.
//!
//! Nothing in this crate performs I/O; transport is an external
//! collaborator.

#![doc(html_root_url = "https://docs.rs/switchboard-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod scope;

pub use error::ConfigError;
pub use request::{RequestParts, RequestPartsBuilder};
pub use scope::{Disposer, RequestId, ResolveError, Scope, ScopeBuilder, ScopeFactory, ScopeGuard};
