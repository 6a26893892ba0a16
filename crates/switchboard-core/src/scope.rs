//! Per-request dependency scopes.
//!
//! A [`Scope`] is acquired once per inbound request through a
//! [`ScopeFactory`], handed to the handler for dependency resolution, and
//! released through its [`Disposer`] when request handling ends. The
//! [`ScopeGuard`] makes the release unconditional: dropping the guard runs
//! the disposer exactly once, on every exit path, including unwinding.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::RequestParts;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request IDs sortable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error when a dependency cannot be resolved from a scope, or the scope
/// itself cannot be built for a request.
///
/// Resolution failures surface to the client as a 500-class response; the
/// handler never runs when scope acquisition fails.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No service is registered under the requested name.
    #[error("service '{name}' is not registered in the request scope")]
    NotRegistered {
        /// The requested service name.
        name: String,
    },

    /// A service is registered under the name but with a different type.
    #[error("service '{name}' is registered with a different type")]
    TypeMismatch {
        /// The requested service name.
        name: String,
    },

    /// The scope factory failed to assemble a scope for the request.
    #[error("failed to acquire request scope: {message}")]
    Acquire {
        /// Why acquisition failed.
        message: String,
    },
}

impl ResolveError {
    /// Creates an acquisition error.
    #[must_use]
    pub fn acquire(message: impl Into<String>) -> Self {
        Self::Acquire {
            message: message.into(),
        }
    }
}

/// A per-request dependency scope.
///
/// The scope maps service names to shared instances. It is exclusively
/// owned by one request's handling sequence: acquired before dispatch,
/// never shared across requests, and released when the sequence ends.
///
/// Cloning a `Scope` clones a handle, not the services; the disposal
/// contract is carried separately by [`ScopeGuard`].
///
/// # Example
///
/// ```rust
/// use switchboard_core::Scope;
/// use std::sync::Arc;
///
/// struct Mailer {
///     from: String,
/// }
///
/// let scope = Scope::builder()
///     .service("mailer", Arc::new(Mailer { from: "noreply@example.com".into() }))
///     .build();
///
/// let mailer: Arc<Mailer> = scope.resolve("mailer").unwrap();
/// assert_eq!(mailer.from, "noreply@example.com");
/// ```
#[derive(Clone)]
pub struct Scope {
    request_id: RequestId,
    services: Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Scope {
    /// Returns a builder for assembling a scope.
    #[must_use]
    pub fn builder() -> ScopeBuilder {
        ScopeBuilder::new()
    }

    /// Creates an empty scope with a fresh request ID.
    #[must_use]
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Returns this scope's request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Resolves a named service from the scope.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotRegistered`] if no service carries the
    /// name, or [`ResolveError::TypeMismatch`] if one does but as a
    /// different type.
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| ResolveError::NotRegistered {
                name: name.to_string(),
            })?;

        Arc::clone(service)
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch {
                name: name.to_string(),
            })
    }

    /// Checks whether a service name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("request_id", &self.request_id)
            .field("service_count", &self.services.len())
            .finish()
    }
}

/// Builder for [`Scope`].
#[derive(Default)]
pub struct ScopeBuilder {
    request_id: Option<RequestId>,
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ScopeBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit request ID (a fresh one is generated otherwise).
    #[must_use]
    pub fn request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Registers a named service.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(mut self, name: impl Into<String>, service: Arc<T>) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    /// Builds the scope.
    #[must_use]
    pub fn build(self) -> Scope {
        Scope {
            request_id: self.request_id.unwrap_or_default(),
            services: Arc::new(self.services),
        }
    }
}

impl fmt::Debug for ScopeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeBuilder")
            .field("service_count", &self.services.len())
            .finish()
    }
}

/// The disposal hook released when a request's handling sequence ends.
pub type Disposer = Box<dyn FnOnce() + Send>;

/// Factory producing one [`Scope`] per inbound request.
///
/// The dispatcher calls [`acquire`] before any binding or handler work,
/// and guarantees the returned [`Disposer`] runs exactly once when the
/// request is over, whatever the outcome.
///
/// Closures implement the trait directly:
///
/// ```rust
/// use switchboard_core::{Disposer, RequestParts, ResolveError, Scope, ScopeFactory};
///
/// let factory = |_parts: &RequestParts| -> Result<(Scope, Disposer), ResolveError> {
///     let scope = Scope::empty();
///     let disposer: Disposer = Box::new(|| { /* release pooled resources */ });
///     Ok((scope, disposer))
/// };
///
/// let parts = RequestParts::builder()
///     .method(http::Method::GET)
///     .uri("/")
///     .build();
/// assert!(factory.acquire(&parts).is_ok());
/// ```
///
/// [`acquire`]: ScopeFactory::acquire
pub trait ScopeFactory: Send + Sync {
    /// Builds a scope for the given request.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the scope cannot be assembled; the
    /// dispatcher turns this into a 500-class response without invoking
    /// the handler.
    fn acquire(&self, parts: &RequestParts) -> Result<(Scope, Disposer), ResolveError>;
}

impl<F> ScopeFactory for F
where
    F: Fn(&RequestParts) -> Result<(Scope, Disposer), ResolveError> + Send + Sync,
{
    fn acquire(&self, parts: &RequestParts) -> Result<(Scope, Disposer), ResolveError> {
        self(parts)
    }
}

/// Runs a scope's [`Disposer`] exactly once, on drop.
///
/// The guard is the scoped-acquisition-with-guaranteed-release half of the
/// scope contract: the dispatcher moves it along every exit path (success,
/// binding failure, validation failure, handler unwind, streaming-body
/// drop), and `Drop` fires the disposer whichever path wins.
pub struct ScopeGuard {
    disposer: Option<Disposer>,
}

impl ScopeGuard {
    /// Wraps a disposer in a guard.
    #[must_use]
    pub fn new(disposer: Disposer) -> Self {
        Self {
            disposer: Some(disposer),
        }
    }

    /// Disposes now instead of at drop. Idempotent with drop.
    pub fn dispose(mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("disposed", &self.disposer.is_none())
            .finish()
    }
}
