//! Handler-Type Registry
//!
//! Auto-registration system for handler types using linkme distributed
//! slices. Handler types register themselves via
//! `#[linkme::distributed_slice]` and are discovered at runtime when the
//! factory resolves a configuration's declared handlers.
//!
//! ## Usage
//!
//! ### Registering a handler type
//!
//! ```ignore
//! use std::sync::Arc;
//! use scr_runtime::{HANDLER_TYPES, Handler, HandlerBuildContext, HandlerEntry};
//!
//! #[linkme::distributed_slice(HANDLER_TYPES)]
//! static PROBE_HANDLER: HandlerEntry = HandlerEntry {
//!     name: "probe",
//!     description: "Reports an externally controlled vote",
//!     validate: |_config| Ok(()),
//!     build: |ctx| Ok(vec![Arc::new(ProbeHandler::new(ctx.instance().clone()))]),
//! };
//! ```
//!
//! ### Resolving a handler type
//!
//! ```ignore
//! let entry = scr_runtime::resolve_handler_type("dependencies").expect("built-in");
//! ```

use std::sync::Arc;

use scr_domain::{
    ComponentConfiguration, ServiceBinder, SharedServiceRegistry,
};

use crate::handler::Handler;
use crate::instance::InstanceRef;

/// Registry entry for a handler type
///
/// Each handler type registers itself with this entry using
/// `#[linkme::distributed_slice(HANDLER_TYPES)]`. The entry declares which
/// configuration it accepts (`validate`) and how to build the handler
/// instances for one component instance (`build`).
pub struct HandlerEntry {
    /// Unique handler-type name (e.g. "dependencies")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Validate the parts of a configuration this handler type consumes
    pub validate: fn(&ComponentConfiguration) -> Result<(), String>,
    /// Build the handler instances for one component instance
    ///
    /// A handler type may expand to several handlers (the dependency
    /// handler builds one tracker per declared dependency).
    pub build: fn(&HandlerBuildContext<'_>) -> Result<Vec<Arc<dyn Handler>>, String>,
}

// Auto-collection via linkme distributed slices - handler types submit
// entries at compile time
#[linkme::distributed_slice]
pub static HANDLER_TYPES: [HandlerEntry] = [..];

/// Resolve a handler type by name from the registry
pub fn resolve_handler_type(name: &str) -> Option<&'static HandlerEntry> {
    HANDLER_TYPES.iter().find(|entry| entry.name == name)
}

/// List all registered handler types
///
/// Returns (name, description) tuples. Useful for diagnostics and
/// configuration validation messages.
pub fn list_handler_types() -> Vec<(&'static str, &'static str)> {
    HANDLER_TYPES
        .iter()
        .map(|entry| (entry.name, entry.description))
        .collect()
}

/// Everything a handler type needs to build its handlers for one instance
pub struct HandlerBuildContext<'a> {
    instance: InstanceRef,
    configuration: &'a Arc<ComponentConfiguration>,
    registry: &'a SharedServiceRegistry,
    binder: &'a Arc<dyn ServiceBinder>,
}

impl<'a> HandlerBuildContext<'a> {
    pub(crate) fn new(
        instance: InstanceRef,
        configuration: &'a Arc<ComponentConfiguration>,
        registry: &'a SharedServiceRegistry,
        binder: &'a Arc<dyn ServiceBinder>,
    ) -> Self {
        Self {
            instance,
            configuration,
            registry,
            binder,
        }
    }

    /// Back-reference to the instance being built
    pub fn instance(&self) -> &InstanceRef {
        &self.instance
    }

    /// The configuration the instance was created from
    pub fn configuration(&self) -> &ComponentConfiguration {
        self.configuration
    }

    /// The service registry the instance is wired to
    pub fn registry(&self) -> &SharedServiceRegistry {
        self.registry
    }

    /// The component object's callback interface
    pub fn binder(&self) -> &Arc<dyn ServiceBinder> {
        self.binder
    }
}
