//! # Service Component Runtime - Domain Layer
//!
//! Core types and boundary contracts for the component runtime. This crate
//! holds the immutable configuration model, the provider descriptors handed
//! around at the registry boundary, the instance lifecycle states, and the
//! port traits implemented by external collaborators.
//!
//! ## Architecture
//!
//! The domain crate has no knowledge of the runtime machinery. It defines
//! the contracts; `scr-runtime` drives them and `scr-registry` implements
//! the broker side:
//!
//! ```text
//! ┌────────────────┐     ports      ┌────────────────┐
//! │  scr-runtime   │ ─────────────▶ │   scr-domain   │
//! │ (state machine,│                │ (value objects,│
//! │  trackers)     │                │  errors, ports)│
//! └────────────────┘                └────────────────┘
//!                                          ▲
//!                                          │ implements
//!                                   ┌────────────────┐
//!                                   │  scr-registry  │
//!                                   │ (in-memory     │
//!                                   │  broker)       │
//!                                   └────────────────┘
//! ```

/// Shared constants for configuration keys and built-in handler names
pub mod constants;
/// Error handling types
pub mod error;
/// Boundary contracts implemented by external collaborators
pub mod ports;
/// Immutable value objects describing components and providers
pub mod value_objects;

// Re-export the most commonly used types at the crate root
pub use error::{Error, Result};
pub use ports::{
    ComponentProvider, ProviderListener, ServiceBinder, ServiceRegistry, SharedComponentProvider,
    SharedServiceRegistry, SubscriptionId,
};
pub use value_objects::{
    Cardinality, ComponentConfiguration, DependencySpec, InstanceState, ProviderDescriptor,
    ProviderFilter, ProviderHandle, ProviderId,
};
