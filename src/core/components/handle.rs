use super::traits::{Component, UpdateContext};
use crate::core::attributes::AttributeContainer;
use crate::core::errors::{ComponentError, UpdateError};
use crate::core::types::{ComponentId, ContainerKey};
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A component attached to a workspace, plus the flags the engine keeps for it.
///
/// Handles are shared (`Arc`) between the workspace, update actions and the
/// per-cycle snapshot, so a component removed mid-cycle is still updated to
/// the end of that cycle.
pub struct ComponentHandle {
    id: ComponentId,
    running: AtomicBool,
    update_on: AtomicBool,
    containers: RwLock<Vec<Arc<dyn AttributeContainer>>>,
    component: Mutex<Box<dyn Component>>,
}

impl ComponentHandle {
    pub(crate) fn new(name: String, component: Box<dyn Component>) -> Self {
        let id = ComponentId::new(name, component.kind());
        let containers = component.attribute_containers();
        Self {
            id,
            running: AtomicBool::new(false),
            update_on: AtomicBool::new(true),
            containers: RwLock::new(containers),
            component: Mutex::new(component),
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn kind(&self) -> &str {
        self.id.kind()
    }

    /// Whether a run currently includes this component
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        if self.running.swap(running, Ordering::SeqCst) == running {
            return;
        }
        let mut component = self.component.lock();
        if running {
            component.on_start();
        } else {
            component.on_stop();
        }
    }

    /// Whether the component takes part in updates
    pub fn is_update_on(&self) -> bool {
        self.update_on.load(Ordering::SeqCst)
    }

    /// Switch updating of this component on or off
    pub fn set_update_on(&self, on: bool) {
        self.update_on.store(on, Ordering::SeqCst);
    }

    /// Snapshot of the component's attribute containers
    pub fn attribute_containers(&self) -> Vec<Arc<dyn AttributeContainer>> {
        self.containers.read().clone()
    }

    /// Find a container by its id
    pub fn container(&self, container_id: &str) -> Option<Arc<dyn AttributeContainer>> {
        self.containers
            .read()
            .iter()
            .find(|c| c.container_id() == container_id)
            .cloned()
    }

    pub fn container_keys(&self) -> Vec<ContainerKey> {
        self.containers.read().iter().map(|c| c.key()).collect()
    }

    /// Re-discover containers; returns the keys of those that disappeared
    pub(crate) fn refresh_containers(&self) -> Vec<ContainerKey> {
        let current = self.component.lock().attribute_containers();
        let mut containers = self.containers.write();
        let removed = containers
            .iter()
            .map(|c| c.key())
            .filter(|key| !current.iter().any(|c| c.key() == *key))
            .collect();
        *containers = current;
        removed
    }

    /// Update the component once. Components with updating switched off are skipped.
    ///
    /// A panic inside the component is caught and reported as an error.
    pub fn update(&self, time: u64) -> Result<(), UpdateError> {
        if !self.is_update_on() {
            return Ok(());
        }
        let ctx = UpdateContext { time };
        let mut component = self.component.lock();
        match panic::catch_unwind(AssertUnwindSafe(|| component.update(&ctx))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(UpdateError::ComponentUpdateFailure {
                component: self.name().to_string(),
                source,
            }),
            Err(payload) => Err(UpdateError::ComponentPanicked {
                component: self.name().to_string(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Serialize the component's state
    pub fn save(&self) -> Result<serde_json::Value, ComponentError> {
        self.component.lock().save()
    }

    /// Inspect the component without changing it
    pub fn inspect<R>(&self, f: impl FnOnce(&dyn Component) -> R) -> R {
        let guard = self.component.lock();
        f(&**guard)
    }

    /// Inspect the component as a `C`; `None` if it is another type
    pub fn inspect_as<C: Component, R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        let guard = self.component.lock();
        let component: &dyn Component = &**guard;
        component.as_any().downcast_ref::<C>().map(f)
    }

    /// Exclusive access for the workspace, which refreshes containers afterwards
    pub(crate) fn with_component<R>(&self, f: impl FnOnce(&mut dyn Component) -> R) -> R {
        let mut guard = self.component.lock();
        f(&mut **guard)
    }

    pub(crate) fn with_component_as<C: Component, R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let mut guard = self.component.lock();
        let component: &mut dyn Component = &mut **guard;
        component.as_any_mut().downcast_mut::<C>().map(f)
    }
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.id)
            .field("running", &self.is_running())
            .field("update_on", &self.is_update_on())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
