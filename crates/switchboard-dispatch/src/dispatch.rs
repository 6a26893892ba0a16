//! Endpoint registration and the per-request dispatch sequence.
//!
//! The [`Registrar`] turns endpoint descriptors into [`RouteHandler`]s
//! and writes them into a [`RouteRegistry`]. Each handler runs the same
//! fixed sequence per request:
//!
//! ```text
//! acquire scope → [bind → validate] → invoke handler → write reply → dispose
//! ```
//!
//! Binding and validation only run for JSON-mode endpoints. Every failure
//! short-circuits into exactly one structured error response, and the
//! scope's disposer runs exactly once on every path — it rides the
//! response body as a [`ScopeGuard`], so even a client disconnect during
//! a streamed reply releases the scope.

use std::sync::Arc;

use http::{Method, Response, StatusCode};

use switchboard_core::{ConfigError, RequestParts, ScopeFactory, ScopeGuard};

use crate::body::ReplyBody;
use crate::endpoint::{Endpoint, Mode, Rejection};
use crate::reply::Reply;
use crate::routes::{RouteHandler, RouteRegistry};

/// The verbs an endpoint may declare. Anything else fails registration.
const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

/// Registers endpoints onto a route registry and owns the scope factory
/// their requests draw from.
///
/// The registrar holds no cross-request mutable state: one instance wires
/// any number of endpoints, and the handlers it produces share only
/// `Arc`s to immutable pieces.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use std::sync::Arc;
/// use switchboard_core::{Disposer, RequestParts, ResolveError, Scope};
/// use switchboard_dispatch::{Endpoint, Registrar, Reply, RouteTable};
///
/// let registrar = Registrar::from_factory(
///     |_parts: &RequestParts| -> Result<(Scope, Disposer), ResolveError> {
///         Ok((Scope::empty(), Box::new(|| {}) as Disposer))
///     },
/// );
///
/// let endpoint = Endpoint::streaming(Method::GET, "/health", |_scope, _parts| async {
///     Reply::ok()
/// });
///
/// let mut table = RouteTable::new();
/// registrar.mount(&mut table, [endpoint]).unwrap();
/// assert!(table.has_route(&Method::GET, "/health"));
/// ```
pub struct Registrar {
    scopes: Arc<dyn ScopeFactory>,
}

impl Registrar {
    /// Creates a registrar around a shared scope factory.
    #[must_use]
    pub fn new(scopes: Arc<dyn ScopeFactory>) -> Self {
        Self { scopes }
    }

    /// Creates a registrar from any [`ScopeFactory`] value, including a
    /// closure.
    #[must_use]
    pub fn from_factory(factory: impl ScopeFactory + 'static) -> Self {
        Self::new(Arc::new(factory))
    }

    /// Registers endpoints onto the route registry.
    ///
    /// Fails fast on the first configuration error; earlier endpoints of
    /// the batch may already be registered at that point, which is fine —
    /// configuration errors abort startup entirely.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedMethod`] when an endpoint
    /// declares a verb outside GET/POST/PUT/DELETE/PATCH.
    pub fn mount(
        &self,
        registry: &mut dyn RouteRegistry,
        endpoints: impl IntoIterator<Item = Endpoint>,
    ) -> Result<(), ConfigError> {
        for endpoint in endpoints {
            verify_method(endpoint.method(), endpoint.path())?;

            let (method, path, mode) = endpoint.into_parts();
            tracing::debug!(%method, path = %path, "registering endpoint");

            let handler = self.route_handler(path.clone(), mode);
            registry.register(method, &path, handler);
        }
        Ok(())
    }

    fn route_handler(&self, path: String, mode: Mode) -> RouteHandler {
        let scopes = Arc::clone(&self.scopes);
        Arc::new(move |parts: RequestParts| {
            let scopes = Arc::clone(&scopes);
            let mode = mode.clone();
            let path = path.clone();
            Box::pin(async move { handle_request(scopes.as_ref(), &mode, parts, &path).await })
                as crate::endpoint::BoxFuture<_>
        })
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar").finish_non_exhaustive()
    }
}

fn verify_method(method: &Method, path: &str) -> Result<(), ConfigError> {
    if SUPPORTED_METHODS.contains(method) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedMethod {
            method: method.to_string(),
            path: path.to_string(),
        })
    }
}

/// One request's handling sequence, start to finish.
///
/// Never errors: every failure becomes a structured response. The scope
/// guard is threaded into the response body, so disposal happens when the
/// body is dropped — after the payload is written, or the moment the
/// client goes away.
async fn handle_request(
    scopes: &dyn ScopeFactory,
    mode: &Mode,
    parts: RequestParts,
    path: &str,
) -> Response<ReplyBody> {
    let (scope, disposer) = match scopes.acquire(&parts) {
        Ok(acquired) => acquired,
        Err(e) => {
            tracing::error!(path, error = %e, "scope acquisition failed");
            return Reply::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DEPENDENCY_RESOLUTION_FAILED",
                e.to_string(),
            )
            .into_response_scoped(None);
        }
    };

    let guard = ScopeGuard::new(disposer);
    let request_id = scope.request_id();

    let reply = match mode {
        Mode::Json(adapter) => match adapter(scope, parts).await {
            Ok(reply) => reply,
            Err(Rejection::Bind(e)) => {
                tracing::debug!(%request_id, path, error = %e, "binding failed");
                Reply::error(e.status_code(), e.error_code(), e.to_string())
            }
            Err(Rejection::Validation(errors)) => {
                tracing::debug!(%request_id, path, failures = errors.len(), "validation failed");
                Reply::validation_failure(errors)
            }
        },
        Mode::Streaming(adapter) => adapter(scope, parts).await,
    };

    reply.into_response_scoped(Some(guard))
}
