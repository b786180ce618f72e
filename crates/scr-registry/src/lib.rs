//! # Service Component Runtime - In-Memory Registry
//!
//! Deterministic in-memory implementation of the
//! [`ServiceRegistry`](scr_domain::ServiceRegistry) port. Providers are
//! published and retracted programmatically; events are delivered
//! synchronously on the calling thread, which makes the broker equally
//! suitable as the production registry of an embedding process and as the
//! deterministic fake in runtime tests.
//!
//! ## Usage
//!
//! ```ignore
//! use scr_domain::ProviderDescriptor;
//! use scr_registry::InMemoryServiceRegistry;
//!
//! let registry = InMemoryServiceRegistry::new_shared();
//! let registration = registry.register(ProviderDescriptor::new("user"));
//! // ... subscribers observe provider_added ...
//! registration.unregister();
//! ```
//!
//! ## Locking
//!
//! Matching listeners are snapshotted before any of them runs: no registry
//! lock is held while a listener callback executes, so listeners are free
//! to take their own instance locks without ordering concerns.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use dashmap::DashMap;
use tracing::debug;

use scr_domain::{
    ProviderDescriptor, ProviderFilter, ProviderHandle, ProviderId, ProviderListener,
    ServiceRegistry, SubscriptionId,
};

struct Subscription {
    namespace: String,
    filter: ProviderFilter,
    listener: Arc<dyn ProviderListener>,
}

/// In-memory service broker
///
/// Thread-safe; registrations and retractions may arrive concurrently
/// from any thread. Events for one call are delivered one listener at a
/// time, but calls may interleave across providers and listeners.
pub struct InMemoryServiceRegistry {
    /// Published providers in registration order (oldest first)
    providers: Mutex<Vec<ProviderHandle>>,
    subscriptions: DashMap<u64, Subscription>,
    next_provider_id: AtomicU64,
    next_subscription_id: AtomicU64,
}

impl InMemoryServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(Vec::new()),
            subscriptions: DashMap::new(),
            next_provider_id: AtomicU64::new(1),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// Create as Arc for sharing
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Publish a provider and notify matching subscribers
    ///
    /// Returns a registration used to retract the provider later. Dropping
    /// the registration does NOT retract - retraction is always explicit.
    pub fn register(self: &Arc<Self>, descriptor: ProviderDescriptor) -> ProviderRegistration {
        let id = ProviderId::new(self.next_provider_id.fetch_add(1, Ordering::Relaxed));
        let handle = ProviderHandle::new(id, Arc::new(descriptor));

        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle.clone());
        debug!(provider = %handle, "Registered provider");

        for listener in self.matching_subscribers(&handle) {
            listener.provider_added(handle.clone());
        }

        ProviderRegistration {
            registry: Arc::downgrade(self),
            handle,
            retracted: AtomicBool::new(false),
        }
    }

    /// Number of published providers
    pub fn len(&self) -> usize {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no providers are published
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn retract(&self, id: ProviderId) {
        let handle = {
            let mut providers = self
                .providers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(index) = providers.iter().position(|handle| handle.id() == id) else {
                return;
            };
            providers.remove(index)
        };
        debug!(provider = %handle, "Retracted provider");

        for listener in self.matching_subscribers(&handle) {
            listener.provider_removed(handle.clone());
        }
    }

    /// Snapshot the listeners whose subscription matches the handle
    ///
    /// The snapshot completes before any listener runs, so no internal
    /// lock is held during delivery.
    fn matching_subscribers(&self, handle: &ProviderHandle) -> Vec<Arc<dyn ProviderListener>> {
        self.subscriptions
            .iter()
            .filter(|entry| {
                entry.value().namespace == handle.namespace()
                    && entry.value().filter.matches(handle.descriptor())
            })
            .map(|entry| Arc::clone(&entry.value().listener))
            .collect()
    }
}

impl Default for InMemoryServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry for InMemoryServiceRegistry {
    fn providers(&self, namespace: &str, filter: &ProviderFilter) -> Vec<ProviderHandle> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|handle| {
                handle.namespace() == namespace && filter.matches(handle.descriptor())
            })
            .cloned()
            .collect()
    }

    fn subscribe(
        &self,
        namespace: &str,
        filter: ProviderFilter,
        listener: Arc<dyn ProviderListener>,
    ) -> SubscriptionId {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions.insert(
            id,
            Subscription {
                namespace: namespace.to_string(),
                filter,
                listener,
            },
        );
        debug!(namespace, subscription = id, "Subscribed listener");
        SubscriptionId::new(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        if self.subscriptions.remove(&subscription.value()).is_some() {
            debug!(subscription = subscription.value(), "Unsubscribed listener");
        }
    }
}

impl std::fmt::Debug for InMemoryServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryServiceRegistry")
            .field("providers", &self.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// Handle to one published provider
///
/// Retraction is explicit and idempotent; the registry owns provider
/// identity and lifetime.
pub struct ProviderRegistration {
    registry: Weak<InMemoryServiceRegistry>,
    handle: ProviderHandle,
    retracted: AtomicBool,
}

impl ProviderRegistration {
    /// The published provider
    pub fn provider(&self) -> &ProviderHandle {
        &self.handle
    }

    /// Retract the provider and notify matching subscribers
    pub fn unregister(&self) {
        if self.retracted.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.retract(self.handle.id());
        }
    }
}

impl std::fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("provider", &self.handle.to_string())
            .field("retracted", &self.retracted.load(Ordering::Acquire))
            .finish()
    }
}
