//! The route-registration surface and a reference route table.
//!
//! Routing itself is an external collaborator: the dispatcher only needs
//! something that accepts `(method, path, handler)` registrations, which
//! is the [`RouteRegistry`] trait. [`RouteTable`] is the in-memory
//! reference implementation — enough to serve requests in tests and
//! embedded setups, and the conflict check the dispatcher itself does not
//! perform lives here.

use std::fmt;
use std::sync::Arc;

use http::{Method, Response};

use switchboard_core::RequestParts;

use crate::body::ReplyBody;
use crate::endpoint::BoxFuture;

/// A fully wired per-route request handler.
///
/// Each registered endpoint contributes exactly one of these; invoking it
/// runs the whole dispatch sequence and always yields a response.
pub type RouteHandler = Arc<dyn Fn(RequestParts) -> BoxFuture<Response<ReplyBody>> + Send + Sync>;

/// Registration surface the dispatcher writes routes into.
///
/// External routers implement this to receive Switchboard endpoints;
/// duplicate `(method, path)` registrations are the implementor's to
/// reject.
pub trait RouteRegistry {
    /// Registers a handler for one method + path pair.
    fn register(&mut self, method: Method, path: &str, handler: RouteHandler);
}

struct RegisteredRoute {
    method: Method,
    path: String,
    handler: RouteHandler,
}

/// In-memory reference route table.
///
/// Matches requests by exact method + path. Registering the same pair
/// twice panics: route conflicts are configuration errors and must not
/// survive startup.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use switchboard_dispatch::RouteTable;
///
/// let table = RouteTable::new();
/// assert_eq!(table.route_count(), 0);
/// assert!(!table.has_route(&Method::GET, "/health"));
/// ```
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<RegisteredRoute>,
}

impl RouteTable {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Checks whether a method + path pair is registered.
    #[must_use]
    pub fn has_route(&self, method: &Method, path: &str) -> bool {
        self.routes
            .iter()
            .any(|r| r.method == *method && r.path == path)
    }

    /// Iterates over registered `(method, path)` pairs.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.path.as_str()))
    }

    /// Dispatches a request to its matching route.
    ///
    /// Returns `None` when no route matches; the embedding server decides
    /// what a 404 looks like.
    pub async fn dispatch(&self, parts: RequestParts) -> Option<Response<ReplyBody>> {
        let route = self
            .routes
            .iter()
            .find(|r| r.method == *parts.method() && r.path == parts.path())?;

        Some((route.handler)(parts).await)
    }
}

impl RouteRegistry for RouteTable {
    fn register(&mut self, method: Method, path: &str, handler: RouteHandler) {
        assert!(
            !self.has_route(&method, path),
            "route {method} {path} is already registered"
        );
        self.routes.push(RegisteredRoute {
            method,
            path: path.to_string(),
            handler,
        });
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field(
                "routes",
                &self
                    .routes
                    .iter()
                    .map(|r| format!("{} {}", r.method, r.path))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reply;

    fn noop_handler() -> RouteHandler {
        Arc::new(|_parts| Box::pin(async { Reply::ok().into_response() }) as BoxFuture<_>)
    }

    fn get(path: &str) -> RequestParts {
        RequestParts::builder()
            .method(Method::GET)
            .uri(path)
            .build()
    }

    #[test]
    fn test_register_and_inspect() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/health", noop_handler());
        table.register(Method::POST, "/health", noop_handler());

        assert_eq!(table.route_count(), 2);
        assert!(table.has_route(&Method::GET, "/health"));
        assert!(table.has_route(&Method::POST, "/health"));
        assert!(!table.has_route(&Method::DELETE, "/health"));

        let listed: Vec<_> = table.routes().collect();
        assert!(listed.contains(&(&Method::GET, "/health")));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_route_is_rejected() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/dup", noop_handler());
        table.register(Method::GET, "/dup", noop_handler());
    }

    #[tokio::test]
    async fn test_dispatch_matches_method_and_path() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/ping", noop_handler());

        assert!(table.dispatch(get("/ping")).await.is_some());
        assert!(table.dispatch(get("/pong")).await.is_none());

        let post = RequestParts::builder()
            .method(Method::POST)
            .uri("/ping")
            .build();
        assert!(table.dispatch(post).await.is_none());
    }

    #[test]
    fn test_debug_lists_routes() {
        let mut table = RouteTable::new();
        table.register(Method::GET, "/a", noop_handler());
        assert!(format!("{table:?}").contains("GET /a"));
    }
}
