//! Resolution port - where proxies obtain real instances

use std::any::Any;
use std::sync::Arc;

use domain::ServiceKey;

use crate::error::ResolutionError;

/// A resolved service instance
///
/// Always holds an `Arc<T>` for the service type `T` it was resolved for, so
/// that unsized contract objects can be stored alongside concrete types.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A provider or scope able to produce registered services
///
/// Proxies keep the [`handle`](Self::handle) of the context they were created
/// in and resolve the real implementation through it on every forwarded call,
/// so lifetimes are honored exactly as for a direct resolution.
pub trait ResolutionContext: Send + Sync {
    /// Resolve the service registered under `service`
    ///
    /// # Errors
    ///
    /// Returns an error if the service is not registered, cannot be resolved
    /// from this context, or its factory fails.
    fn resolve_instance(&self, service: ServiceKey) -> Result<Instance, ResolutionError>;

    /// A shareable handle resolving through this same context
    ///
    /// The handle must not keep the context's caches alive; once the
    /// context is gone it fails with [`ResolutionError::ScopeDisposed`].
    fn handle(&self) -> Arc<dyn ResolutionContext>;
}

/// Typed resolution on top of [`ResolutionContext`]
pub trait ResolutionContextExt: ResolutionContext {
    /// Resolve the service registered for `T`
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the registered instance is
    /// not an `Arc<T>`.
    fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolutionError> {
        let key = ServiceKey::of::<T>();
        let instance = self.resolve_instance(key)?;
        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ResolutionError::TypeMismatch {
                service: key.short_name(),
            })
    }
}

impl<R: ResolutionContext + ?Sized> ResolutionContextExt for R {}
