//! Dependency tracker
//!
//! One tracker per declared dependency. The tracker keeps its bound set in
//! sync with the service registry and drives the component object's
//! bind/unbind callbacks, synchronously, on the thread that delivered the
//! registry event.
//!
//! Substitution policy: when a bound provider of a single-cardinality
//! dependency disappears and a replacement candidate is already known, the
//! replacement is bound in the same logical step, so the instance never
//! observes a transient INVALID. The oldest eligible candidate by
//! registration order wins.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tracing::{debug, warn};

use scr_domain::constants::DEPENDENCIES_HANDLER;
use scr_domain::{
    ComponentConfiguration, DependencySpec, Error, ProviderHandle, ProviderId, ProviderListener,
    Result, ServiceBinder, SharedServiceRegistry, SubscriptionId,
};

use crate::handler::registry::{HANDLER_TYPES, HandlerBuildContext, HandlerEntry};
use crate::handler::Handler;
use crate::instance::InstanceRef;

#[linkme::distributed_slice(HANDLER_TYPES)]
static DEPENDENCIES_ENTRY: HandlerEntry = HandlerEntry {
    name: DEPENDENCIES_HANDLER,
    description: "Tracks declared service dependencies and drives bind/unbind callbacks",
    validate: validate_dependencies,
    build: build_dependencies,
};

fn validate_dependencies(configuration: &ComponentConfiguration) -> std::result::Result<(), String> {
    let mut seen = BTreeSet::new();
    for spec in &configuration.dependencies {
        if spec.id.trim().is_empty() {
            return Err("dependency id must not be empty".to_string());
        }
        if spec.namespace.trim().is_empty() {
            return Err(format!("dependency '{}' declares an empty namespace", spec.id));
        }
        if !seen.insert(spec.id.as_str()) {
            return Err(format!("duplicate dependency id '{}'", spec.id));
        }
    }
    Ok(())
}

fn build_dependencies(
    ctx: &HandlerBuildContext<'_>,
) -> std::result::Result<Vec<Arc<dyn Handler>>, String> {
    Ok(ctx
        .configuration()
        .dependencies
        .iter()
        .map(|spec| {
            DependencyHandler::new(
                spec.clone(),
                ctx.instance().clone(),
                Arc::clone(ctx.registry()),
                Arc::clone(ctx.binder()),
            ) as Arc<dyn Handler>
        })
        .collect())
}

/// A provider currently bound to the dependency, plus local bookkeeping
struct BoundProvider {
    provider: ProviderHandle,
    ordinal: u64,
    bound_at: Instant,
}

/// Bound set and substitution candidates, guarded by the tracker's own
/// lock which is only ever taken under the instance exclusion
#[derive(Default)]
struct TrackerState {
    /// Bound providers, insertion order = bind order
    bound: Vec<BoundProvider>,
    /// Matching but unbound candidates (single cardinality), registration
    /// order
    waiting: Vec<ProviderHandle>,
    satisfied: bool,
    next_ordinal: u64,
}

impl TrackerState {
    fn knows(&self, id: ProviderId) -> bool {
        self.bound.iter().any(|bound| bound.provider.id() == id)
            || self.waiting.iter().any(|provider| provider.id() == id)
    }
}

/// Handler specialization tracking one declared dependency
pub(crate) struct DependencyHandler {
    label: String,
    spec: DependencySpec,
    instance: InstanceRef,
    registry: SharedServiceRegistry,
    binder: Arc<dyn ServiceBinder>,
    state: Mutex<TrackerState>,
    subscription: Mutex<Option<SubscriptionId>>,
    weak_self: Weak<DependencyHandler>,
}

impl DependencyHandler {
    pub(crate) fn new(
        spec: DependencySpec,
        instance: InstanceRef,
        registry: SharedServiceRegistry,
        binder: Arc<dyn ServiceBinder>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            label: format!("{DEPENDENCIES_HANDLER}:{}", spec.id),
            state: Mutex::new(TrackerState {
                satisfied: !spec.cardinality.is_mandatory(),
                ..TrackerState::default()
            }),
            subscription: Mutex::new(None),
            weak_self: weak_self.clone(),
            spec,
            instance,
            registry,
            binder,
        })
    }

    fn tracker_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoke the bind callback and record the provider on success
    fn bind_provider(&self, st: &mut TrackerState, provider: ProviderHandle) -> Result<()> {
        self.binder
            .bind(&self.spec.id, &provider)
            .map_err(|error| Error::bind_failure(&self.spec.id, error.to_string()))?;
        let ordinal = st.next_ordinal;
        st.next_ordinal += 1;
        debug!(dependency = %self.spec.id, %provider, ordinal, "Bound provider");
        st.bound.push(BoundProvider {
            provider,
            ordinal,
            bound_at: Instant::now(),
        });
        Ok(())
    }

    /// Recompute the vote; returns whether it changed
    fn update_satisfaction(&self, st: &mut TrackerState) -> bool {
        let satisfied = !self.spec.cardinality.is_mandatory() || !st.bound.is_empty();
        let changed = satisfied != st.satisfied;
        st.satisfied = satisfied;
        changed
    }

    /// Bind the oldest eligible substitution candidate
    ///
    /// Candidates whose bind callback fails are dropped and the next one
    /// is tried, all within the same logical step.
    fn bind_replacement(&self, st: &mut TrackerState) {
        while !st.waiting.is_empty() {
            let candidate = st.waiting.remove(0);
            match self.bind_provider(st, candidate) {
                Ok(()) => break,
                Err(error) => {
                    warn!(
                        dependency = %self.spec.id,
                        %error,
                        "Replacement bind failed; trying next candidate"
                    );
                }
            }
        }
    }

    /// Initial population: bind every currently available matching
    /// provider before the instance's first validity evaluation
    ///
    /// A bind failure here is fatal to instance creation.
    fn populate(&self) -> Result<()> {
        let Some(shared) = self.instance.shared() else {
            return Ok(());
        };
        shared.process(|_core| {
            let mut st = self.tracker_state();
            for provider in self.registry.providers(&self.spec.namespace, &self.spec.filter) {
                if st.knows(provider.id()) {
                    continue;
                }
                if self.spec.cardinality.is_single() && !st.bound.is_empty() {
                    st.waiting.push(provider);
                    continue;
                }
                self.bind_provider(&mut st, provider).map_err(|error| {
                    Error::configuration_with_source(
                        format!(
                            "initial population failed for dependency '{}'",
                            self.spec.id
                        ),
                        error,
                    )
                })?;
            }
            self.update_satisfaction(&mut st);
            Ok(())
        })
    }
}

impl ProviderListener for DependencyHandler {
    fn provider_added(&self, provider: ProviderHandle) {
        let Some(shared) = self.instance.shared() else {
            return;
        };
        shared.process(|core| {
            if core.state().is_terminal() {
                return;
            }
            let mut st = self.tracker_state();
            if st.knows(provider.id()) {
                return;
            }
            if self.spec.cardinality.is_single() && !st.bound.is_empty() {
                debug!(
                    dependency = %self.spec.id,
                    %provider,
                    "Queued substitution candidate"
                );
                st.waiting.push(provider);
                return;
            }
            match self.bind_provider(&mut st, provider) {
                Ok(()) => {
                    if self.update_satisfaction(&mut st) {
                        core.request_revalidation();
                    }
                }
                Err(error) => {
                    warn!(
                        dependency = %self.spec.id,
                        %error,
                        "Bind callback failed; provider not bound"
                    );
                }
            }
        });
    }

    fn provider_removed(&self, provider: ProviderHandle) {
        let Some(shared) = self.instance.shared() else {
            return;
        };
        shared.process(|core| {
            if core.state().is_terminal() {
                return;
            }
            let mut st = self.tracker_state();
            if let Some(index) = st
                .waiting
                .iter()
                .position(|candidate| candidate.id() == provider.id())
            {
                st.waiting.remove(index);
                return;
            }
            let Some(index) = st
                .bound
                .iter()
                .position(|bound| bound.provider.id() == provider.id())
            else {
                return;
            };
            let released = st.bound.remove(index);
            debug!(
                dependency = %self.spec.id,
                provider = %released.provider,
                bound_for = ?released.bound_at.elapsed(),
                "Unbinding removed provider"
            );
            if let Err(error) = self.binder.unbind(&self.spec.id, &released.provider) {
                warn!(dependency = %self.spec.id, %error, "Unbind callback failed");
            }
            if self.spec.cardinality.is_single() {
                self.bind_replacement(&mut st);
            }
            if self.update_satisfaction(&mut st) {
                core.request_revalidation();
            }
        });
    }
}

impl Handler for DependencyHandler {
    fn name(&self) -> &str {
        &self.label
    }

    fn is_satisfied(&self) -> bool {
        self.tracker_state().satisfied
    }

    fn install(&self) -> Result<()> {
        let Some(listener) = self.weak_self.upgrade() else {
            return Ok(());
        };
        let subscription = self.registry.subscribe(
            &self.spec.namespace,
            self.spec.filter.clone(),
            listener as Arc<dyn ProviderListener>,
        );
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
        self.populate()
    }

    fn on_dispose(&self) -> Result<()> {
        if let Some(subscription) = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            self.registry.unsubscribe(subscription);
        }

        let mut st = self.tracker_state();
        st.waiting.clear();
        let mut failures = Vec::new();
        for released in st.bound.drain(..) {
            if let Err(error) = self.binder.unbind(&self.spec.id, &released.provider) {
                failures.push(error.to_string());
            }
        }
        st.satisfied = !self.spec.cardinality.is_mandatory();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::unbind_failure(&self.spec.id, failures.join("; ")))
        }
    }
}
