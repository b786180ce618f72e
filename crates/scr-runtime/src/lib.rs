//! # Service Component Runtime
//!
//! Instantiates components from declarative configuration, tracks whether
//! each component's external service dependencies are currently satisfied,
//! and transitions the component between VALID and INVALID as providers
//! appear and disappear - without restarting the component or losing its
//! internal state.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      ComponentFactory                         │
//! │  validates configuration → builds component object → installs │
//! │  handlers → initial population → live-instance registry       │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ creates
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     ComponentInstance                         │
//! │  state machine: INSTANTIATED → VALID ⇄ INVALID → STOPPED      │
//! │  validity = AND over all handler votes     → DISPOSED         │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ votes
//!                ┌───────────────┼───────────────┐
//!                ▼               ▼               ▼
//!        ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//!        │ Dependency   │ │ Dependency   │ │ custom       │
//!        │ tracker "a"  │ │ tracker "b"  │ │ handler      │
//!        └──────┬───────┘ └──────┬───────┘ └──────────────┘
//!               │ subscribe      │
//!               ▼                ▼
//!        ┌───────────────────────────────┐
//!        │   ServiceRegistry (port)      │
//!        └───────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! The runtime is reactive: all work happens on whatever thread delivers a
//! registry event. Everything touching one instance - bound-set mutation,
//! vote aggregation, callback dispatch, start/stop/dispose - is serialized
//! under that instance's exclusion. Events targeting different instances
//! proceed fully in parallel.
//!
//! ## Usage
//!
//! ```ignore
//! use scr_domain::{ComponentConfiguration, DependencySpec};
//! use scr_registry::InMemoryServiceRegistry;
//! use scr_runtime::ComponentFactory;
//!
//! let registry = InMemoryServiceRegistry::new_shared();
//! let factory = ComponentFactory::new(component_provider, registry.clone());
//!
//! let config = ComponentConfiguration::new("greeter")
//!     .with_dependency(DependencySpec::new("users", "user"));
//! let instance = factory.create_instance(config)?;
//! assert_eq!(instance.state(), scr_domain::InstanceState::Invalid);
//! ```

/// Component factory and live-instance registry
pub mod factory;
/// Handler contract, handler-type registry, and the dependency tracker
pub mod handler;
/// Instance state machine
pub mod instance;

// Re-export the public surface at the crate root
pub use factory::{ComponentFactory, InstanceInfo};
pub use handler::{
    HANDLER_TYPES, Handler, HandlerBuildContext, HandlerEntry, StateContext, list_handler_types,
    resolve_handler_type,
};
pub use instance::{ComponentInstance, InstanceRef};
