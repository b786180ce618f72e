//! Component-side contracts
//!
//! The runtime never reflects over the managed object. The component side
//! implements [`ServiceBinder`] to receive bind/unbind callbacks as plain
//! dynamic dispatch, and [`ComponentProvider`] to construct component
//! objects from validated configuration.

use std::sync::Arc;

use crate::error::Result;
use crate::value_objects::{ComponentConfiguration, ProviderHandle};

/// Capability interface for bind/unbind callbacks
///
/// Implemented by (or on behalf of) the component object. Callbacks are
/// invoked synchronously on the thread that delivered the registry event,
/// strictly sequentially per dependency, and exactly once per transition:
/// a provider is never bound twice without an intervening unbind.
///
/// A returned error is a [`CallbackFailure`](crate::Error::CallbackFailure)
/// from the runtime's point of view: it is logged, the provider is treated
/// as not bound (bind) or as removed anyway (unbind), and processing
/// continues.
pub trait ServiceBinder: Send + Sync {
    /// A provider was bound to the named dependency
    fn bind(&self, dependency: &str, provider: &ProviderHandle) -> Result<()>;

    /// A provider was unbound from the named dependency
    fn unbind(&self, dependency: &str, provider: &ProviderHandle) -> Result<()>;
}

/// Port: Component Provider
///
/// Supplies the component objects a factory manages. One provider serves
/// exactly one implementation identity.
pub trait ComponentProvider: Send + Sync {
    /// Implementation identity this provider constructs
    fn implementation_id(&self) -> &str;

    /// Whether the implementation accepts the named configuration property
    ///
    /// Rejected names fail instance creation with
    /// [`UnacceptableConfiguration`](crate::Error::UnacceptableConfiguration).
    /// The default accepts everything.
    fn accepts_property(&self, name: &str) -> bool {
        let _ = name;
        true
    }

    /// Construct the component object for a validated configuration
    fn create(&self, configuration: &ComponentConfiguration) -> Result<Arc<dyn ServiceBinder>>;
}

/// Shared component provider for dependency injection
pub type SharedComponentProvider = Arc<dyn ComponentProvider>;
