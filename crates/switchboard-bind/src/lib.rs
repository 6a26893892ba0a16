//! # Switchboard Bind
//!
//! Typed request binding for the Switchboard endpoint-dispatch layer.
//!
//! Binding reconstructs a typed value from the untyped parts of one HTTP
//! request: the structured body, individual headers, and multipart file
//! parts. Each target type declares its non-body sources once, in a
//! [`BindingDescriptor`]; the descriptor is compiled into a
//! [`BindingPlan`] at registration time, so per-request work is a lookup
//! over a fixed table rather than any form of type inspection.
//!
//! | Source | Declared via | Decoded by |
//! |--------|--------------|------------|
//! | Body | the type's own `serde` fields | `serde_json` / `serde_urlencoded` / multipart text parts |
//! | Header | [`BindingDescriptor::header`] | the binding's scalar conversion |
//! | File | [`BindingDescriptor::file`] | multipart lookup by form name, size-checked |
//!
//! ## Example
//!
//! ```rust
//! use serde::Deserialize;
//! use switchboard_bind::{parse_scalar, Bind, BindingDescriptor, UploadedFile};
//!
//! #[derive(Deserialize, Default)]
//! struct CreateDocument {
//!     title: String,
//!     #[serde(skip)]
//!     trace_id: String,
//!     #[serde(skip)]
//!     attachment: Option<UploadedFile>,
//! }
//!
//! impl Bind for CreateDocument {
//!     fn descriptor() -> BindingDescriptor<Self> {
//!         BindingDescriptor::new()
//!             .header("x-trace-id", |doc: &mut Self, value| {
//!                 doc.trace_id = value.to_string();
//!                 Ok(())
//!             })
//!             .file("attachment", Some("1MB"), |doc, file| {
//!                 doc.attachment = Some(file);
//!             })
//!     }
//! }
//!
//! let plan = CreateDocument::descriptor().compile().unwrap();
//! assert_eq!(plan.file_count(), 1);
//! ```
//!
//! Validation is a separate, pass-through concern: [`check`] runs the
//! `validator` engine over a bound value and flattens its report into
//! ordered [`FieldError`]s.

#![doc(html_root_url = "https://docs.rs/switchboard-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod descriptor;
mod error;
mod multipart;
mod validate;

pub use binder::bind;
pub use descriptor::{parse_scalar, Bind, BindingDescriptor, BindingPlan};
pub use error::{BindError, BindSource};
pub use multipart::{PartMap, UploadedFile};
pub use validate::{check, FieldError};
