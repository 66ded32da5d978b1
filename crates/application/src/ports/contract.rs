//! Contract port - how a service trait takes part in interception
//!
//! A contract is a `dyn Trait` whose methods all return
//! `Result<_, Self::Error>`. Implementing [`Contract`] for it means writing a
//! proxy type that forwards each method through an [`Interceptor`].
//!
//! ```ignore
//! pub trait Catalog: Send + Sync {
//!     fn get_by_id(&self, id: u32) -> Result<Item, CatalogError>;
//! }
//!
//! struct AffectedCatalog(Interceptor<dyn Catalog>);
//!
//! impl Catalog for AffectedCatalog {
//!     fn get_by_id(&self, id: u32) -> Result<Item, CatalogError> {
//!         self.0
//!             .intercept(&Invocation::new("get_by_id", &[&id]))
//!             .run(|catalog| catalog.get_by_id(id))
//!     }
//! }
//!
//! impl Contract for dyn Catalog {
//!     type Error = CatalogError;
//!
//!     fn descriptor() -> ContractDescriptor {
//!         ContractDescriptor::new("Catalog")
//!             .method(MethodSpec::new("get_by_id").param::<u32>())
//!     }
//!
//!     fn proxy(interceptor: Interceptor<Self>) -> Arc<Self> {
//!         Arc::new(AffectedCatalog(interceptor))
//!     }
//! }
//! ```

use std::sync::Arc;

use domain::ContractDescriptor;

use crate::error::ResolutionError;
use crate::interceptor::Interceptor;
use crate::ports::resolution::ResolutionContext;

/// A service contract that can be affected by chaos rules
pub trait Contract: Send + Sync + 'static {
    /// Error type returned by every method of the contract
    ///
    /// Throw rules produce values of this type; resolution failures of the
    /// real instance are converted into it.
    type Error: From<ResolutionError> + Send + 'static;

    /// Methods of the contract with their parameter types
    fn descriptor() -> ContractDescriptor;

    /// Wrap an interceptor in a value implementing the contract
    fn proxy(interceptor: Interceptor<Self>) -> Arc<Self>;
}

/// Marks `Self` as an implementation of contract `C`
///
/// Provides the upcast from the concrete type to the contract object, which
/// generic code cannot express as a plain coercion.
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    /// Upcast to the contract object
    fn into_contract(self: Arc<Self>) -> Arc<C>;
}

/// A concrete type the container knows how to construct
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Build a new instance, resolving dependencies from `context`
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency cannot be resolved.
    fn create(context: &dyn ResolutionContext) -> Result<Self, ResolutionError>;
}
