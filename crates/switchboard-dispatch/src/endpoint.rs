//! Endpoint descriptors.
//!
//! An [`Endpoint`] is the immutable registration unit: an HTTP method, a
//! path, and a handler behind a response-mode tag. The two handler shapes
//! are one tagged variant, not parallel fields — dispatch switches on the
//! tag:
//!
//! - **JSON mode** wraps a typed handler `(Scope, T) -> Reply`. `T`'s
//!   binding plan is compiled here, once, so binding and validation run
//!   automatically before the handler on every request.
//! - **Streaming mode** (also the "passthrough" registration) wraps a raw
//!   handler `(Scope, RequestParts) -> Reply` that receives the unparsed
//!   request and is fully responsible for reading it.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use validator::Validate;

use switchboard_bind::{bind, Bind, FieldError};
use switchboard_core::{ConfigError, RequestParts, Scope};

use crate::reply::Reply;

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Why a JSON-mode request never reached its handler.
#[derive(Debug)]
pub(crate) enum Rejection {
    /// The typed value could not be reconstructed.
    Bind(switchboard_bind::BindError),
    /// The value bound but failed structural validation.
    Validation(Vec<FieldError>),
}

type JsonAdapter = Arc<dyn Fn(Scope, RequestParts) -> BoxFuture<Result<Reply, Rejection>> + Send + Sync>;
type RawAdapter = Arc<dyn Fn(Scope, RequestParts) -> BoxFuture<Reply> + Send + Sync>;

/// The response-mode tag and its type-erased handler.
pub(crate) enum Mode {
    Json(JsonAdapter),
    Streaming(RawAdapter),
}

impl Clone for Mode {
    fn clone(&self) -> Self {
        match self {
            Self::Json(adapter) => Self::Json(Arc::clone(adapter)),
            Self::Streaming(adapter) => Self::Streaming(Arc::clone(adapter)),
        }
    }
}

/// An immutable endpoint descriptor.
///
/// Built once at service-wiring time, registered exactly once, read-only
/// afterward. The method must be one of GET/POST/PUT/DELETE/PATCH —
/// anything else is rejected at mount time, before any request is served.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use serde::Deserialize;
/// use switchboard_core::Scope;
/// use switchboard_bind::Bind;
/// use switchboard_dispatch::{Endpoint, Reply};
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateUser {
///     #[validate(length(min = 1))]
///     name: String,
/// }
/// impl Bind for CreateUser {}
///
/// let endpoint = Endpoint::json(
///     Method::POST,
///     "/users",
///     |_scope: Scope, user: CreateUser| async move {
///         Reply::json(serde_json::json!({"created": user.name}))
///     },
/// )
/// .unwrap();
///
/// assert_eq!(endpoint.method(), &Method::POST);
/// assert_eq!(endpoint.path(), "/users");
/// assert!(!endpoint.is_streaming());
/// ```
pub struct Endpoint {
    method: Method,
    path: String,
    mode: Mode,
}

impl Endpoint {
    /// Creates a JSON-mode endpoint around a typed handler.
    ///
    /// The target type's [`BindingDescriptor`] is compiled immediately;
    /// per-request work is a lookup over the resulting fixed plan.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the type's binding descriptor is
    /// invalid (duplicate source, malformed size limit).
    ///
    /// [`BindingDescriptor`]: switchboard_bind::BindingDescriptor
    pub fn json<T, F, Fut>(
        method: Method,
        path: impl Into<String>,
        handler: F,
    ) -> Result<Self, ConfigError>
    where
        T: Bind + Validate + Send + 'static,
        F: Fn(Scope, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        let plan = Arc::new(T::descriptor().compile()?);
        let handler = Arc::new(handler);

        let adapter: JsonAdapter = Arc::new(move |scope: Scope, parts: RequestParts| {
            let plan = Arc::clone(&plan);
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let value = bind::<T>(&plan, &parts).await.map_err(Rejection::Bind)?;

                let failures = switchboard_bind::check(&value);
                if !failures.is_empty() {
                    return Err(Rejection::Validation(failures));
                }

                Ok(handler(scope, value).await)
            }) as BoxFuture<_>
        });

        Ok(Self {
            method,
            path: path.into(),
            mode: Mode::Json(adapter),
        })
    }

    /// Creates a streaming-mode (passthrough) endpoint around a raw
    /// handler.
    ///
    /// Binding and validation are bypassed entirely; the handler receives
    /// the unparsed [`RequestParts`].
    #[must_use]
    pub fn streaming<F, Fut>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Scope, RequestParts) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        let handler = Arc::new(handler);

        let adapter: RawAdapter = Arc::new(move |scope: Scope, parts: RequestParts| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(scope, parts).await }) as BoxFuture<_>
        });

        Self {
            method,
            path: path.into(),
            mode: Mode::Streaming(adapter),
        }
    }

    /// Returns the endpoint's HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the endpoint's path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` for streaming-mode endpoints.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self.mode, Mode::Streaming(_))
    }

    /// Decomposes the descriptor for registration.
    pub(crate) fn into_parts(self) -> (Method, String, Mode) {
        (self.method, self.path, self.mode)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field(
                "mode",
                &match self.mode {
                    Mode::Json(_) => "json",
                    Mode::Streaming(_) => "streaming",
                },
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use switchboard_bind::BindingDescriptor;

    #[derive(Deserialize, Validate)]
    struct Echo {
        message: String,
    }
    impl Bind for Echo {}

    #[derive(Deserialize, Validate)]
    struct BadDescriptor {
        #[serde(skip)]
        _file: Option<switchboard_bind::UploadedFile>,
    }
    impl Bind for BadDescriptor {
        fn descriptor() -> BindingDescriptor<Self> {
            BindingDescriptor::new().file("doc", Some("not-a-size"), |_, _| {})
        }
    }

    #[test]
    fn test_json_endpoint_accessors() {
        let endpoint = Endpoint::json(Method::POST, "/echo", |_scope: Scope, echo: Echo| async move {
            Reply::json(json!({"echo": echo.message}))
        })
        .unwrap();

        assert_eq!(endpoint.method(), &Method::POST);
        assert_eq!(endpoint.path(), "/echo");
        assert!(!endpoint.is_streaming());
        assert!(format!("{endpoint:?}").contains("json"));
    }

    #[test]
    fn test_streaming_endpoint_accessors() {
        let endpoint = Endpoint::streaming(Method::GET, "/export", |_scope, _parts| async move {
            Reply::ok()
        });

        assert_eq!(endpoint.method(), &Method::GET);
        assert!(endpoint.is_streaming());
        assert!(format!("{endpoint:?}").contains("streaming"));
    }

    #[test]
    fn test_invalid_descriptor_fails_at_creation() {
        let result = Endpoint::json(
            Method::POST,
            "/docs",
            |_scope: Scope, _value: BadDescriptor| async move { Reply::ok() },
        );

        assert!(matches!(result, Err(ConfigError::InvalidSizeLimit { .. })));
    }

    #[tokio::test]
    async fn test_json_adapter_binds_and_invokes() {
        let endpoint = Endpoint::json(Method::POST, "/echo", |_scope: Scope, echo: Echo| async move {
            Reply::json(json!({"echo": echo.message}))
        })
        .unwrap();

        let (_, _, mode) = endpoint.into_parts();
        let Mode::Json(adapter) = mode else {
            panic!("expected JSON mode");
        };

        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-type", "application/json")
            .body(r#"{"message": "hi"}"#)
            .build();

        let reply = adapter(Scope::empty(), parts).await.unwrap();
        assert_eq!(reply.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_json_adapter_rejects_malformed_body() {
        let endpoint = Endpoint::json(Method::POST, "/echo", |_scope: Scope, _echo: Echo| async move {
            Reply::ok()
        })
        .unwrap();

        let (_, _, mode) = endpoint.into_parts();
        let Mode::Json(adapter) = mode else {
            panic!("expected JSON mode");
        };

        let parts = RequestParts::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-type", "application/json")
            .body("not json")
            .build();

        let result = adapter(Scope::empty(), parts).await;
        assert!(matches!(result, Err(Rejection::Bind(_))));
    }
}
