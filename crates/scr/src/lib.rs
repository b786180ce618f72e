//! # Service Component Runtime
//!
//! A dynamic service-dependency component container: instances are created
//! from declarative configuration, their service dependencies are tracked
//! against a registry, and each instance transitions between VALID and
//! INVALID automatically as providers appear and disappear - without
//! restarting the component or losing its internal state.
//!
//! This crate is the facade; it re-exports the domain types, the runtime,
//! and the in-memory registry.
//!
//! ## Example
//!
//! ```ignore
//! use scr::domain::{ComponentConfiguration, DependencySpec, InstanceState, ProviderDescriptor};
//! use scr::registry::InMemoryServiceRegistry;
//! use scr::runtime::ComponentFactory;
//!
//! let registry = InMemoryServiceRegistry::new_shared();
//! let factory = ComponentFactory::new(greeter_provider, registry.clone());
//!
//! let instance = factory.create_instance(
//!     ComponentConfiguration::new("greeter")
//!         .with_dependency(DependencySpec::new("users", "user")),
//! )?;
//! assert_eq!(instance.state(), InstanceState::Invalid);
//!
//! let users = registry.register(ProviderDescriptor::new("user"));
//! assert_eq!(instance.state(), InstanceState::Valid);
//!
//! users.unregister();
//! assert_eq!(instance.state(), InstanceState::Invalid);
//! ```

/// Domain layer - value objects, errors, and port contracts
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use scr_domain::*;
}

/// Runtime layer - state machine, trackers, and factory
///
/// Re-exports from the runtime crate for convenience
pub mod runtime {
    pub use scr_runtime::*;
}

/// Registry layer - in-memory service broker
///
/// Re-exports from the registry crate for convenience
pub mod registry {
    pub use scr_registry::*;
}

// Commonly used types at the crate root
pub use scr_domain::{
    Cardinality, ComponentConfiguration, ComponentProvider, DependencySpec, Error, InstanceState,
    ProviderDescriptor, ProviderFilter, ProviderHandle, Result, ServiceBinder,
};
pub use scr_registry::InMemoryServiceRegistry;
pub use scr_runtime::{ComponentFactory, ComponentInstance, Handler};
