//! Provider descriptors and registry handles
//!
//! A provider is an external capability instance published in the service
//! registry. Its *descriptor* is a pure value (namespace plus directive and
//! attribute maps, compared structurally); its *handle* carries the
//! registry-assigned identity that distinguishes two otherwise identical
//! providers at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Registry-assigned identity of a live provider
///
/// Identity is owned by the registry that published the provider. Two
/// handles with the same id refer to the same runtime provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(u64);

impl ProviderId {
    /// Create a provider id from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value of this id
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider-{}", self.0)
    }
}

/// Value Object: Capability Provider Descriptor
///
/// Structural description of a provider: the capability namespace it serves
/// plus its directive and attribute maps. Equality is structural over all
/// three - two providers with identical descriptors are interchangeable for
/// matching purposes, but remain distinct runtime handles.
///
/// ## Example
///
/// ```ignore
/// use scr_domain::ProviderDescriptor;
///
/// let descriptor = ProviderDescriptor::new("user")
///     .with_directive("scope", "session")
///     .with_attribute("rank", serde_json::json!(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Capability namespace this provider serves
    pub namespace: String,
    /// Directive map (string-valued, registry-interpreted)
    pub directives: HashMap<String, String>,
    /// Attribute map (arbitrary values, matched by filters)
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ProviderDescriptor {
    /// Create a descriptor for the given namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            directives: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Add a directive
    pub fn with_directive(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(name.into(), value.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Look up an attribute value
    pub fn attribute(&self, name: &str) -> Option<&serde_json::Value> {
        self.attributes.get(name)
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; {:?}", self.namespace, self.attributes)
    }
}

/// Non-owning handle to a live provider
///
/// Pairs the registry-assigned [`ProviderId`] with the shared descriptor.
/// Handle equality is by id; use [`ProviderHandle::descriptor`] for
/// structural comparison. The registry owns provider lifetime - holders of
/// a handle must be prepared for the provider to disappear at any time.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    id: ProviderId,
    descriptor: Arc<ProviderDescriptor>,
}

impl ProviderHandle {
    /// Create a handle from an id and a shared descriptor
    pub fn new(id: ProviderId, descriptor: Arc<ProviderDescriptor>) -> Self {
        Self { id, descriptor }
    }

    /// Registry-assigned identity of this provider
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Structural descriptor of this provider
    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    /// Capability namespace this provider serves
    pub fn namespace(&self) -> &str {
        &self.descriptor.namespace
    }

    /// Attribute map of this provider
    pub fn attributes(&self) -> &HashMap<String, serde_json::Value> {
        &self.descriptor.attributes
    }
}

impl PartialEq for ProviderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProviderHandle {}

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.descriptor.namespace)
    }
}
