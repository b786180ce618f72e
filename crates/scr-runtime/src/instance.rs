//! Instance state machine
//!
//! A [`ComponentInstance`] aggregates its handlers' votes into one
//! lifecycle state. The transition rule is a pure AND: the instance is
//! VALID iff every installed handler currently votes satisfied, INVALID if
//! at least one does not and the instance has not been explicitly stopped.
//!
//! ## Serialization
//!
//! Every mutation of instance state - vote processing, bound-set changes,
//! callback dispatch, start/stop/dispose - runs under the instance's
//! single exclusion ([`InstanceShared::process`]). Registry events for the
//! same instance are therefore strictly serialized, while events for
//! different instances proceed in parallel. Disposal acquires the same
//! exclusion, so a disposer blocks until in-flight event processing
//! completes; events arriving afterwards observe the terminal state and
//! become no-ops.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use tracing::{debug, info, warn};

use scr_domain::{ComponentConfiguration, Error, InstanceState};

use crate::factory::LiveInstances;
use crate::handler::{Handler, StateContext};

/// Shared mutable core of one instance, guarded by the instance exclusion
pub(crate) struct InstanceCore {
    state: InstanceState,
    handlers: Vec<Arc<dyn Handler>>,
    revalidate_queued: bool,
}

impl InstanceCore {
    /// Current lifecycle state
    pub(crate) fn state(&self) -> InstanceState {
        self.state
    }

    /// Queue a validity re-evaluation to run before the exclusion releases
    pub(crate) fn request_revalidation(&mut self) {
        self.revalidate_queued = true;
    }

    pub(crate) fn install_handler(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.push(handler);
    }
}

/// State shared between the public instance handle, its handlers, and the
/// factory's live registry
pub(crate) struct InstanceShared {
    name: String,
    configuration: Arc<ComponentConfiguration>,
    core: Mutex<InstanceCore>,
    live: OnceLock<Weak<LiveInstances>>,
}

impl InstanceShared {
    pub(crate) fn new(name: String, configuration: Arc<ComponentConfiguration>) -> Arc<Self> {
        Arc::new(Self {
            name,
            configuration,
            core: Mutex::new(InstanceCore {
                state: InstanceState::Instantiated,
                handlers: Vec::new(),
                revalidate_queued: false,
            }),
            live: OnceLock::new(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn configuration(&self) -> &Arc<ComponentConfiguration> {
        &self.configuration
    }

    /// Record the factory registry this instance must leave on disposal
    pub(crate) fn attach_live(&self, live: Weak<LiveInstances>) {
        let _ = self.live.set(live);
    }

    /// Run `f` under the instance exclusion, then settle queued
    /// re-evaluations before releasing it
    ///
    /// Poisoning is tolerated deliberately: a panicking user callback must
    /// not wedge the instance for every later registry event.
    pub(crate) fn process<R>(&self, f: impl FnOnce(&mut InstanceCore) -> R) -> R {
        let mut core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut core);
        self.settle(&mut core);
        result
    }

    pub(crate) fn current_state(&self) -> InstanceState {
        self.core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Drain queued re-evaluations until the state is stable
    fn settle(&self, core: &mut InstanceCore) {
        while std::mem::take(&mut core.revalidate_queued) {
            self.revalidate(core);
        }
    }

    /// Re-derive VALID/INVALID from the current votes
    ///
    /// Idempotent: an unchanged outcome causes no transition and no hook
    /// invocations. Only applies while the instance is running - STOPPED
    /// and DISPOSED ignore votes.
    fn revalidate(&self, core: &mut InstanceCore) {
        if !core.state.is_running() {
            return;
        }
        let next = self.derive_state(core);
        if next != core.state {
            self.commit(core, next);
        }
    }

    fn derive_state(&self, core: &InstanceCore) -> InstanceState {
        let satisfied = core.handlers.iter().all(|handler| handler.is_satisfied());
        if satisfied {
            InstanceState::Valid
        } else {
            InstanceState::Invalid
        }
    }

    /// Commit a transition and notify handlers
    ///
    /// Hooks run after the new state is committed; re-entrant vote changes
    /// raised inside a hook are queued through the context and processed
    /// by [`InstanceShared::settle`].
    fn commit(&self, core: &mut InstanceCore, next: InstanceState) {
        let previous = core.state;
        core.state = next;
        info!(instance = %self.name, from = %previous, to = %next, "Instance state changed");

        let ctx = StateContext::new();
        for handler in &core.handlers {
            handler.on_state_changed(previous, next, &ctx);
        }
        if ctx.revalidation_requested() {
            core.revalidate_queued = true;
        }
    }

    /// Start from INSTANTIATED (factory activation) or STOPPED
    pub(crate) fn start_locked(&self, core: &mut InstanceCore) {
        match core.state {
            InstanceState::Instantiated | InstanceState::Stopped => {
                for handler in &core.handlers {
                    handler.on_start();
                }
                let next = self.derive_state(core);
                self.commit(core, next);
            }
            InstanceState::Disposed => {
                warn!(instance = %self.name, "start() ignored: instance is disposed");
            }
            _ => {
                debug!(instance = %self.name, state = %core.state, "start() ignored: already running");
            }
        }
    }

    /// Force STOPPED regardless of votes
    ///
    /// Stops nothing inside the handlers by itself: trackers retain their
    /// bound providers across stop/start unless a provider disappears.
    pub(crate) fn stop_locked(&self, core: &mut InstanceCore) {
        if !core.state.is_running() {
            debug!(instance = %self.name, state = %core.state, "stop() ignored");
            return;
        }
        for handler in &core.handlers {
            handler.on_stop();
        }
        self.commit(core, InstanceState::Stopped);
    }

    /// Tear down: unwind handlers in reverse installation order, then
    /// release the component object references
    ///
    /// Returns the teardown failures instead of stopping at the first.
    pub(crate) fn dispose_locked(&self, core: &mut InstanceCore) -> Vec<Error> {
        if core.state.is_terminal() {
            return Vec::new();
        }
        let mut failures = Vec::new();
        for handler in core.handlers.iter().rev() {
            if let Err(error) = handler.on_dispose() {
                warn!(
                    instance = %self.name,
                    handler = handler.name(),
                    %error,
                    "Handler teardown failed"
                );
                failures.push(error);
            }
        }
        self.commit(core, InstanceState::Disposed);
        core.handlers.clear();
        core.revalidate_queued = false;
        failures
    }
}

/// Non-owning back-reference to an instance
///
/// Handed to handlers at build time. Used to report vote changes
/// ([`InstanceRef::revalidate`]) and to query state without keeping the
/// instance alive.
#[derive(Clone)]
pub struct InstanceRef {
    name: String,
    shared: Weak<InstanceShared>,
}

impl InstanceRef {
    pub(crate) fn new(shared: &Arc<InstanceShared>) -> Self {
        Self {
            name: shared.name.clone(),
            shared: Arc::downgrade(shared),
        }
    }

    /// Name of the referenced instance
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, or `None` once the instance is gone
    pub fn state(&self) -> Option<InstanceState> {
        self.shared.upgrade().map(|shared| shared.current_state())
    }

    /// Report a vote change: re-evaluate validity under the instance
    /// exclusion
    ///
    /// Safe to call from any thread; a no-op once the instance is gone.
    pub fn revalidate(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.process(InstanceCore::request_revalidation);
        }
    }

    pub(crate) fn shared(&self) -> Option<Arc<InstanceShared>> {
        self.shared.upgrade()
    }
}

impl std::fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRef")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// A live component instance managed by a factory
///
/// Cheap to clone; all clones refer to the same instance. Lifecycle
/// operations never panic on repeated or out-of-order calls - they log and
/// ignore instead.
#[derive(Clone)]
pub struct ComponentInstance {
    shared: Arc<InstanceShared>,
}

impl ComponentInstance {
    pub(crate) fn from_shared(shared: Arc<InstanceShared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<InstanceShared> {
        &self.shared
    }

    /// Unique name of this instance
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// The configuration this instance was created from
    pub fn configuration(&self) -> &ComponentConfiguration {
        self.shared.configuration()
    }

    /// Current lifecycle state
    pub fn state(&self) -> InstanceState {
        self.shared.current_state()
    }

    /// Non-owning reference for handlers and embedders
    pub fn instance_ref(&self) -> InstanceRef {
        InstanceRef::new(&self.shared)
    }

    /// Start a stopped instance; the state is re-derived from the current
    /// votes
    pub fn start(&self) {
        self.shared.process(|core| self.shared.start_locked(core));
    }

    /// Force STOPPED regardless of votes
    pub fn stop(&self) {
        self.shared.process(|core| self.shared.stop_locked(core));
    }

    /// Tear down this instance
    ///
    /// Blocks until any in-flight event processing for this instance
    /// completes, unbinds every bound provider, releases the component
    /// object, and leaves the factory's live registry. Idempotent.
    pub fn dispose(&self) {
        let _ = self.dispose_collect();
    }

    /// Dispose and return per-handler teardown failures
    pub(crate) fn dispose_collect(&self) -> Vec<Error> {
        let failures = self.shared.process(|core| self.shared.dispose_locked(core));
        if let Some(live) = self.shared.live.get().and_then(Weak::upgrade) {
            live.remove(self.shared.name());
        }
        failures
    }
}

impl std::fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.shared.name)
            .field("implementation", &self.shared.configuration.implementation)
            .field("state", &self.state())
            .finish()
    }
}
