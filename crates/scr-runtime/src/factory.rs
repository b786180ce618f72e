//! Component factory and live-instance registry
//!
//! The factory validates a configuration against the handler types it can
//! resolve, constructs the component object, installs handlers in
//! declaration order, performs the initial validity evaluation (with the
//! no-flicker initial population), and tracks every instance it created.
//!
//! ## Usage
//!
//! ```ignore
//! let factory = ComponentFactory::new(component_provider, registry);
//! let instance = factory.create_instance(config)?;
//!
//! for info in factory.list() {
//!     println!("{}: {:?}", info.name, info.state);
//! }
//!
//! let failures = factory.dispose_all();
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use scr_domain::constants::INSTANCE_NAME_PROPERTY;
use scr_domain::{
    ComponentConfiguration, Error, InstanceState, Result, ServiceBinder, SharedComponentProvider,
    SharedServiceRegistry,
};

use crate::handler::registry::{HandlerBuildContext, HandlerEntry, resolve_handler_type};
use crate::handler::Handler;
use crate::instance::{ComponentInstance, InstanceRef, InstanceShared};

/// Information about a live instance
#[derive(Debug, Clone, Serialize)]
pub struct InstanceInfo {
    /// Instance name
    pub name: String,
    /// Current state
    pub state: InstanceState,
}

/// Live instances created by one factory
///
/// Guarded independently of any single instance's exclusion: adding or
/// removing an instance never holds that instance's lock.
pub(crate) struct LiveInstances {
    by_name: DashMap<String, ComponentInstance>,
    creation_order: Mutex<Vec<String>>,
}

impl LiveInstances {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            by_name: DashMap::new(),
            creation_order: Mutex::new(Vec::new()),
        })
    }

    /// Forget a disposed instance
    pub(crate) fn remove(&self, name: &str) {
        self.by_name.remove(name);
        self.creation_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|entry| entry != name);
    }
}

/// Creates and tracks component instances for one implementation
///
/// Creation-time failures are synchronous results; the instance is not
/// created and nothing is left behind (partially installed handlers are
/// torn down, partially bound providers unbound).
pub struct ComponentFactory {
    component: SharedComponentProvider,
    registry: SharedServiceRegistry,
    live: Arc<LiveInstances>,
}

impl ComponentFactory {
    /// Create a factory for the given component provider, wired to the
    /// given service registry
    pub fn new(component: SharedComponentProvider, registry: SharedServiceRegistry) -> Self {
        Self {
            component,
            registry,
            live: LiveInstances::new(),
        }
    }

    /// Implementation identity this factory manages
    pub fn implementation_id(&self) -> &str {
        self.component.implementation_id()
    }

    /// Validate a configuration, build the component object, install
    /// handlers, and activate the instance
    pub fn create_instance(
        &self,
        configuration: ComponentConfiguration,
    ) -> Result<ComponentInstance> {
        self.validate_properties(&configuration)?;
        let entries = Self::resolve_handlers(&configuration)?;
        let name = self.instance_name(&configuration)?;
        let configuration = Arc::new(configuration);

        let binder = self.component.create(&configuration).map_err(|error| {
            Error::configuration_with_source(
                format!(
                    "failed to construct component object for '{}'",
                    configuration.implementation
                ),
                error,
            )
        })?;

        let shared = InstanceShared::new(name.clone(), Arc::clone(&configuration));
        shared.attach_live(Arc::downgrade(&self.live));

        let installed = self.install_handlers(&entries, &shared, &configuration, &binder)?;

        // Subscribe + initial population, before the first validity
        // evaluation: an instance created when dependencies already exist
        // becomes VALID without a transient INVALID phase.
        for handler in &installed {
            if let Err(error) = handler.install() {
                warn!(
                    instance = %name,
                    handler = handler.name(),
                    %error,
                    "Handler installation failed; aborting instance creation"
                );
                self.abort_creation(&shared);
                return Err(error);
            }
        }

        shared.process(|core| shared.start_locked(core));

        let instance = ComponentInstance::from_shared(Arc::clone(&shared));
        let conflicted = match self.live.by_name.entry(name.clone()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(instance.clone());
                false
            }
        };
        if conflicted {
            // Raced with a concurrent creation using the same name
            let _ = instance.dispose_collect();
            return Err(Error::unacceptable(format!(
                "instance name '{name}' is already in use"
            )));
        }
        self.live
            .creation_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.clone());

        info!(
            instance = %name,
            implementation = %configuration.implementation,
            state = %instance.state(),
            "Created component instance"
        );
        Ok(instance)
    }

    /// Information about all live instances
    pub fn list(&self) -> Vec<InstanceInfo> {
        // Clone the instance handles first so no instance lock is taken
        // while iterating the concurrent map
        let instances: Vec<ComponentInstance> = self
            .live
            .by_name
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        instances
            .into_iter()
            .map(|instance| InstanceInfo {
                name: instance.name().to_string(),
                state: instance.state(),
            })
            .collect()
    }

    /// Information about a specific live instance
    pub fn get(&self, name: &str) -> Option<InstanceInfo> {
        let instance = self.instance(name)?;
        Some(InstanceInfo {
            name: name.to_string(),
            state: instance.state(),
        })
    }

    /// Handle to a specific live instance
    pub fn instance(&self, name: &str) -> Option<ComponentInstance> {
        self.live
            .by_name
            .get(name)
            .map(|entry| entry.value().clone())
    }

    /// Whether a live instance with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.live.by_name.contains_key(name)
    }

    /// Number of live instances
    pub fn count(&self) -> usize {
        self.live.by_name.len()
    }

    /// Dispose every live instance in creation order
    ///
    /// Per-instance teardown failures are aggregated into the returned
    /// list rather than stopping the sweep.
    pub fn dispose_all(&self) -> Vec<(String, Error)> {
        let names: Vec<String> = self
            .live
            .creation_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut failures = Vec::new();
        for name in names {
            let Some(instance) = self.instance(&name) else {
                continue;
            };
            for error in instance.dispose_collect() {
                failures.push((name.clone(), error));
            }
        }
        failures
    }

    fn validate_properties(&self, configuration: &ComponentConfiguration) -> Result<()> {
        if configuration.implementation != self.component.implementation_id() {
            return Err(Error::unacceptable(format!(
                "configuration targets implementation '{}', factory manages '{}'",
                configuration.implementation,
                self.component.implementation_id()
            )));
        }
        for (property, value) in &configuration.properties {
            if property.trim().is_empty() {
                return Err(Error::unacceptable("property names must not be empty"));
            }
            if value.is_null() {
                return Err(Error::unacceptable(format!(
                    "property '{property}' has a null value"
                )));
            }
            if property != INSTANCE_NAME_PROPERTY && !self.component.accepts_property(property) {
                return Err(Error::unacceptable(format!(
                    "implementation '{}' does not accept property '{}'",
                    configuration.implementation, property
                )));
            }
        }
        Ok(())
    }

    /// Resolve every declared handler type and let it validate the
    /// configuration parts it consumes
    fn resolve_handlers(
        configuration: &ComponentConfiguration,
    ) -> Result<Vec<&'static HandlerEntry>> {
        let mut entries = Vec::new();
        for handler_name in configuration.effective_handlers() {
            let entry = resolve_handler_type(handler_name)
                .ok_or_else(|| Error::missing_handler(handler_name))?;
            (entry.validate)(configuration).map_err(Error::unacceptable)?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Resolve the instance name: explicit field, `instance.name`
    /// property, or a generated unique fallback
    fn instance_name(&self, configuration: &ComponentConfiguration) -> Result<String> {
        let from_property = match configuration.properties.get(INSTANCE_NAME_PROPERTY) {
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| {
                        Error::unacceptable(format!(
                            "property '{INSTANCE_NAME_PROPERTY}' must be a string"
                        ))
                    })?
                    .to_string(),
            ),
            None => None,
        };
        let name = configuration
            .instance_name
            .clone()
            .or(from_property)
            .unwrap_or_else(|| format!("{}-{}", configuration.implementation, Uuid::new_v4()));

        if self.live.by_name.contains_key(&name) {
            return Err(Error::unacceptable(format!(
                "instance name '{name}' is already in use"
            )));
        }
        Ok(name)
    }

    fn install_handlers(
        &self,
        entries: &[&'static HandlerEntry],
        shared: &Arc<InstanceShared>,
        configuration: &Arc<ComponentConfiguration>,
        binder: &Arc<dyn ServiceBinder>,
    ) -> Result<Vec<Arc<dyn Handler>>> {
        let context = HandlerBuildContext::new(
            InstanceRef::new(shared),
            configuration,
            &self.registry,
            binder,
        );

        let mut installed: Vec<Arc<dyn Handler>> = Vec::new();
        for entry in entries {
            let handlers = (entry.build)(&context).map_err(|message| {
                Error::configuration(format!(
                    "handler '{}' failed to initialize: {message}",
                    entry.name
                ))
            });
            match handlers {
                Ok(handlers) => {
                    for handler in handlers {
                        shared.process(|core| core.install_handler(Arc::clone(&handler)));
                        installed.push(handler);
                    }
                }
                Err(error) => {
                    self.abort_creation(shared);
                    return Err(error);
                }
            }
        }
        Ok(installed)
    }

    /// Unwind a half-built instance: reverse-order teardown, failures
    /// already logged by the instance
    fn abort_creation(&self, shared: &Arc<InstanceShared>) {
        shared.process(|core| {
            let _ = shared.dispose_locked(core);
        });
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("implementation", &self.component.implementation_id())
            .field("instance_count", &self.live.by_name.len())
            .finish()
    }
}
