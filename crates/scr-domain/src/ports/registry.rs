//! Service registry port
//!
//! The broker that publishes "provider available"/"provider removed"
//! events and answers capability queries. The runtime consumes this
//! boundary; `scr-registry` ships a deterministic in-memory
//! implementation, and embedders may bridge to any external broker.
//!
//! Delivery contract: events are delivered one call at a time per
//! subscription, possibly interleaved across providers and listeners, on
//! whatever thread performs the registration. Implementations must not
//! hold internal locks while invoking listener callbacks.

use std::fmt;
use std::sync::Arc;

use crate::value_objects::{ProviderFilter, ProviderHandle};

/// Opaque handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Create a subscription id from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value of this id
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// Callback interface receiving provider lifecycle events
///
/// Implementations must tolerate late deliveries: an event may arrive
/// after `unsubscribe` returned on another thread, and must then be a
/// no-op.
pub trait ProviderListener: Send + Sync {
    /// A provider matching the subscription appeared
    fn provider_added(&self, provider: ProviderHandle);

    /// A previously delivered provider disappeared
    fn provider_removed(&self, provider: ProviderHandle);
}

/// Port: Service Registry
///
/// Boundary with the external broker. The runtime uses `providers` for
/// initial population and `subscribe`/`unsubscribe` for live tracking.
pub trait ServiceRegistry: Send + Sync {
    /// Snapshot of currently available providers matching the filter
    ///
    /// Returned in registration order (oldest first).
    fn providers(&self, namespace: &str, filter: &ProviderFilter) -> Vec<ProviderHandle>;

    /// Subscribe to provider lifecycle events for a namespace
    fn subscribe(
        &self,
        namespace: &str,
        filter: ProviderFilter,
        listener: Arc<dyn ProviderListener>,
    ) -> SubscriptionId;

    /// Cancel a subscription
    ///
    /// Unknown ids are ignored.
    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// Shared service registry for dependency injection
pub type SharedServiceRegistry = Arc<dyn ServiceRegistry>;
