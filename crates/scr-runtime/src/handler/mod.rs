//! Handler contract and handler-type registry
//!
//! A handler is a pluggable unit of cross-cutting behavior attached to an
//! instance. Each handler contributes one boolean vote to instance
//! validity and may intercept lifecycle transitions. The instance holds
//! its handlers as trait objects in declaration order; vote aggregation is
//! a pure AND over all of them.

use std::sync::atomic::{AtomicBool, Ordering};

use scr_domain::{InstanceState, Result};

/// Handler-type registry (linkme-based auto-registration)
pub mod registry;

/// Dependency tracker - the built-in `dependencies` handler type
pub(crate) mod dependency;

pub use registry::{
    HANDLER_TYPES, HandlerBuildContext, HandlerEntry, list_handler_types, resolve_handler_type,
};

/// A pluggable unit of cross-cutting behavior attached to an instance
///
/// All methods are invoked under the owning instance's exclusion, so a
/// handler never sees two of its own callbacks run concurrently. A handler
/// that changes its vote outside these callbacks reports it through
/// [`InstanceRef::revalidate`](crate::InstanceRef::revalidate).
pub trait Handler: Send + Sync {
    /// Diagnostic name of this handler
    fn name(&self) -> &str;

    /// Current vote: whether this handler's concern is satisfied
    fn is_satisfied(&self) -> bool;

    /// Called once after every handler of the instance is installed,
    /// before the first validity evaluation
    ///
    /// Trackers subscribe to the registry and perform initial population
    /// here. An error aborts instance creation with a configuration error.
    fn install(&self) -> Result<()> {
        Ok(())
    }

    /// The instance is starting (explicit start, or factory activation)
    fn on_start(&self) {}

    /// The instance was explicitly stopped
    fn on_stop(&self) {}

    /// The instance is being torn down
    ///
    /// Runs in reverse installation order. Trackers release every bound
    /// provider here; failures are collected, not fatal.
    fn on_dispose(&self) -> Result<()> {
        Ok(())
    }

    /// The instance committed a state transition
    ///
    /// Runs strictly after the new state is committed. A hook must not
    /// flip the vote that caused this transition directly; it requests a
    /// re-evaluation through `ctx` instead, which is processed after the
    /// current transition settles.
    fn on_state_changed(&self, previous: InstanceState, next: InstanceState, ctx: &StateContext) {
        let _ = (previous, next, ctx);
    }
}

/// Context handed to [`Handler::on_state_changed`] hooks
///
/// Collects re-evaluation requests raised from inside a transition so they
/// can run after the transition settles instead of recursing.
pub struct StateContext {
    revalidate: AtomicBool,
}

impl StateContext {
    pub(crate) fn new() -> Self {
        Self {
            revalidate: AtomicBool::new(false),
        }
    }

    /// Request a validity re-evaluation once the current transition settles
    pub fn request_revalidation(&self) {
        self.revalidate.store(true, Ordering::Release);
    }

    pub(crate) fn revalidation_requested(&self) -> bool {
        self.revalidate.load(Ordering::Acquire)
    }
}
