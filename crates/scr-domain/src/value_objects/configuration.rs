//! Component configuration and dependency declarations
//!
//! The configuration is the immutable description of one component
//! instance: which implementation to manage, which handler types to
//! install, which service dependencies the component declares, and the
//! static property values it was created with. It is produced externally
//! (descriptor parsing, programmatic builders) and handed to the factory
//! unmodified; the instance and its handlers share it read-only for their
//! whole lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::constants::DEPENDENCIES_HANDLER;
use crate::value_objects::provider::ProviderDescriptor;

/// How many providers a dependency may or must have bound at once
///
/// `Single*` dependencies bind at most one provider (first match wins,
/// later matches wait as substitution candidates); `Multiple*` bind every
/// match. `*Mandatory` dependencies vote "unsatisfied" while no provider
/// is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    /// At most one provider, instance stays valid without one
    SingleOptional,
    /// Exactly one provider required for a satisfied vote
    SingleMandatory,
    /// Any number of providers, none required
    MultipleOptional,
    /// Any number of providers, at least one required
    MultipleMandatory,
}

impl Cardinality {
    /// Whether this cardinality binds at most one provider
    pub fn is_single(&self) -> bool {
        matches!(self, Self::SingleOptional | Self::SingleMandatory)
    }

    /// Whether at least one bound provider is required for satisfaction
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::SingleMandatory | Self::MultipleMandatory)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::SingleMandatory
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SingleOptional => "0..1",
            Self::SingleMandatory => "1..1",
            Self::MultipleOptional => "0..n",
            Self::MultipleMandatory => "1..n",
        };
        f.write_str(label)
    }
}

/// Opaque match predicate evaluated by the registry
///
/// The runtime never interprets the predicate; it hands it to the registry
/// at subscription and query time. Filters are cheap to clone (shared
/// closure).
#[derive(Clone)]
pub struct ProviderFilter(Arc<dyn Fn(&ProviderDescriptor) -> bool + Send + Sync>);

impl ProviderFilter {
    /// Filter matching every provider in the namespace
    pub fn any() -> Self {
        Self(Arc::new(|_| true))
    }

    /// Filter matching providers whose attribute equals the given value
    pub fn attribute_equals(name: impl Into<String>, value: serde_json::Value) -> Self {
        let name = name.into();
        Self(Arc::new(move |descriptor| {
            descriptor.attribute(&name) == Some(&value)
        }))
    }

    /// Filter from an arbitrary predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ProviderDescriptor) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluate the predicate against a descriptor
    pub fn matches(&self, descriptor: &ProviderDescriptor) -> bool {
        (self.0)(descriptor)
    }
}

impl Default for ProviderFilter {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for ProviderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProviderFilter(..)")
    }
}

/// Value Object: One Declared Service Dependency
///
/// Names the bind target inside the component (`id`), the capability
/// namespace to watch, the match predicate, and the cardinality
/// constraint. Declaration order in the configuration is the order the
/// runtime installs trackers and dispatches callbacks.
#[derive(Debug, Clone)]
pub struct DependencySpec {
    /// Field-or-callback target this dependency binds into
    pub id: String,
    /// Capability namespace to watch
    pub namespace: String,
    /// Opaque match predicate, evaluated by the registry
    pub filter: ProviderFilter,
    /// Cardinality constraint
    pub cardinality: Cardinality,
}

impl DependencySpec {
    /// Create a single-mandatory dependency matching any provider
    pub fn new(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            filter: ProviderFilter::any(),
            cardinality: Cardinality::default(),
        }
    }

    /// Set the match predicate
    pub fn with_filter(mut self, filter: ProviderFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the cardinality constraint
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}

/// Value Object: Component Configuration
///
/// Immutable description of one component instance. Created once, never
/// mutated; the factory validates it, and the instance plus its handlers
/// share it read-only afterwards.
///
/// ## Example
///
/// ```ignore
/// use scr_domain::{ComponentConfiguration, DependencySpec};
///
/// let config = ComponentConfiguration::new("greeter")
///     .with_instance_name("greeter-0")
///     .with_dependency(DependencySpec::new("users", "user"))
///     .with_property("greeting", serde_json::json!("hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ComponentConfiguration {
    /// Implementation identity this configuration targets
    pub implementation: String,
    /// Explicit instance name, if any
    pub instance_name: Option<String>,
    /// Handler types to install, in declaration order
    pub handlers: Vec<String>,
    /// Declared service dependencies, in declaration order
    pub dependencies: Vec<DependencySpec>,
    /// Static property values
    pub properties: HashMap<String, serde_json::Value>,
}

impl ComponentConfiguration {
    /// Create a configuration for the given implementation
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            ..Default::default()
        }
    }

    /// Set an explicit instance name
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    /// Declare a handler type to install
    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handlers.push(handler.into());
        self
    }

    /// Declare a service dependency
    pub fn with_dependency(mut self, dependency: DependencySpec) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Set a static property value
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Handler types to install, including the implied dependency handler
    ///
    /// The built-in dependency handler is appended when the configuration
    /// declares dependencies without listing the handler explicitly.
    pub fn effective_handlers(&self) -> Vec<&str> {
        let mut handlers: Vec<&str> = self.handlers.iter().map(String::as_str).collect();
        if !self.dependencies.is_empty() && !handlers.contains(&DEPENDENCIES_HANDLER) {
            handlers.push(DEPENDENCIES_HANDLER);
        }
        handlers
    }
}
