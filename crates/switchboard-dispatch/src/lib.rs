//! # Switchboard Dispatch
//!
//! Endpoint descriptors, registration, and the per-request dispatch
//! sequence.
//!
//! A service declares its surface as [`Endpoint`] values — a method, a
//! path, and a handler behind a response-mode tag — and a [`Registrar`]
//! wires them into any [`RouteRegistry`]. Each registered route runs one
//! fixed sequence per request:
//!
//! ```text
//! acquire scope → [bind → validate] → invoke handler → write reply → dispose
//! ```
//!
//! Handlers return a [`Reply`]: a buffered JSON payload or a streamed
//! byte sequence. Failures before the handler (scope acquisition,
//! binding, validation) become structured error responses; the
//! dependency scope is disposed exactly once on every path.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use serde::Deserialize;
//! use serde_json::json;
//! use switchboard_bind::Bind;
//! use switchboard_core::{Disposer, RequestParts, ResolveError, Scope};
//! use switchboard_dispatch::{Endpoint, Registrar, Reply, RouteTable};
//! use validator::Validate;
//!
//! #[derive(Deserialize, Validate)]
//! struct Greet {
//!     #[validate(length(min = 1, message = "name must not be empty"))]
//!     name: String,
//! }
//! impl Bind for Greet {}
//!
//! # async fn example() {
//! let registrar = Registrar::from_factory(
//!     |_parts: &RequestParts| -> Result<(Scope, Disposer), ResolveError> {
//!         Ok((Scope::empty(), Box::new(|| {}) as Disposer))
//!     },
//! );
//!
//! let greet = Endpoint::json(Method::POST, "/greet", |_scope: Scope, greet: Greet| async move {
//!     Reply::json(json!({"greeting": format!("hello, {}", greet.name)}))
//! })
//! .unwrap();
//!
//! let mut table = RouteTable::new();
//! registrar.mount(&mut table, [greet]).unwrap();
//!
//! let parts = RequestParts::builder()
//!     .method(Method::POST)
//!     .uri("/greet")
//!     .header("content-type", "application/json")
//!     .body(r#"{"name": "ada"}"#)
//!     .build();
//!
//! let response = table.dispatch(parts).await.unwrap();
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/switchboard-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod dispatch;
mod endpoint;
mod reply;
mod routes;

pub use body::ReplyBody;
pub use dispatch::Registrar;
pub use endpoint::Endpoint;
pub use reply::{
    stream_channel, BoxError, ByteStream, Reply, StreamClosed, StreamSender,
};
pub use routes::{RouteHandler, RouteRegistry, RouteTable};
