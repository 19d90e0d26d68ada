use crate::core::attributes::{AttributeContainer, Consumer, Producer};
use crate::core::components::{Component, ComponentFactory, ComponentHandle, ComponentRegistry};
use crate::core::couplings::{Coupling, CouplingManager};
use crate::core::errors::{CouplingError, UpdateError, WorkspaceError};
use crate::core::execution::{
    UpdateAction, UpdateComponentAction, UpdateCouplingAction, UpdaterConfig, UpdaterListener, WorkspaceUpdater,
};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Observer for components entering and leaving a workspace
pub trait WorkspaceListener: Send + Sync {
    fn component_added(&self, _component: &ComponentHandle) {}

    fn component_removed(&self, _component: &ComponentHandle) {}

    fn workspace_cleared(&self) {}
}

/// Holds the components of a simulation, the couplings between them and the
/// updater that steps them.
pub struct Workspace {
    components: Arc<ComponentRegistry>,
    couplings: Arc<CouplingManager>,
    updater: Arc<WorkspaceUpdater>,
    pub(crate) factory: ComponentFactory,
    listeners: RwLock<Vec<Arc<dyn WorkspaceListener>>>,
}

impl Workspace {
    /// Create an empty workspace with the default updater configuration
    pub fn new() -> Result<Self, UpdateError> {
        Self::with_config(UpdaterConfig::default())
    }

    pub fn with_config(config: UpdaterConfig) -> Result<Self, UpdateError> {
        let components = Arc::new(ComponentRegistry::new());
        let couplings = Arc::new(CouplingManager::new());
        let updater = Arc::new(WorkspaceUpdater::new(components.clone(), couplings.clone(), config)?);
        Ok(Self {
            components,
            couplings,
            updater,
            factory: ComponentFactory::default(),
            listeners: RwLock::new(Vec::new()),
        })
    }

    /// Replace the factory used to rebuild components when loading
    pub fn set_factory(&mut self, factory: ComponentFactory) {
        self.factory = factory;
    }

    pub fn factory_mut(&mut self) -> &mut ComponentFactory {
        &mut self.factory
    }

    pub fn updater(&self) -> &Arc<WorkspaceUpdater> {
        &self.updater
    }

    pub fn coupling_manager(&self) -> &Arc<CouplingManager> {
        &self.couplings
    }

    pub fn add_listener(&self, listener: Arc<dyn WorkspaceListener>) {
        self.listeners.write().push(listener);
    }

    fn notify(&self, f: impl Fn(&dyn WorkspaceListener)) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }

    // --- Components ---

    /// Add a component named `<Kind><n>`, n counting from 1 per kind
    pub fn add_component<C: Component>(&self, component: C) -> Result<Arc<ComponentHandle>, WorkspaceError> {
        self.add_boxed_component(None, Box::new(component))
    }

    pub fn add_named_component<C: Component>(
        &self,
        name: &str,
        component: C,
    ) -> Result<Arc<ComponentHandle>, WorkspaceError> {
        self.add_boxed_component(Some(name), Box::new(component))
    }

    pub(crate) fn add_boxed_component(
        &self,
        name: Option<&str>,
        component: Box<dyn Component>,
    ) -> Result<Arc<ComponentHandle>, WorkspaceError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.next_name(component.kind()),
        };
        let handle = Arc::new(ComponentHandle::new(name, component));
        self.components.register(handle.clone())?;
        if self.updater.is_running() {
            handle.set_running(true);
        }
        debug!("Added component {} ({})", handle.name(), handle.kind());
        self.notify(|l| l.component_added(&handle));
        Ok(handle)
    }

    fn next_name(&self, kind: &str) -> String {
        let mut n = self.components.count_kind(kind) + 1;
        loop {
            let name = format!("{}{}", kind, n);
            if !self.components.contains(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Remove a component along with every coupling and update action that refers to it
    pub fn remove_component(&self, name: &str) -> Result<Arc<ComponentHandle>, WorkspaceError> {
        let handle = self
            .components
            .remove(name)
            .ok_or_else(|| WorkspaceError::UnknownComponent(name.to_string()))?;

        let removed = self.couplings.remove_attribute_containers(&handle.container_keys());
        self.drop_actions_for(&removed);
        self.updater
            .actions()
            .remove_actions_where(|a| a.target_component() == Some(handle.id()));
        handle.set_running(false);

        debug!(
            "Removed component {} and {} couplings",
            handle.name(),
            removed.len()
        );
        self.notify(|l| l.component_removed(&handle));
        Ok(handle)
    }

    /// Find a component by name, ignoring case
    pub fn component(&self, name: &str) -> Option<Arc<ComponentHandle>> {
        self.components.get(name)
    }

    /// All components in the order they were added
    pub fn components(&self) -> Vec<Arc<ComponentHandle>> {
        self.components.snapshot()
    }

    /// Stop, then remove every component and coupling and reset time and actions.
    ///
    /// Waits for a cycle in flight on another thread to finish first, so it
    /// must not be called from an update action or listener.
    pub fn clear(&self) {
        let _halted = self.updater.halt();
        self.clear_halted();
    }

    pub(crate) fn clear_halted(&self) {
        for handle in self.components.drain() {
            handle.set_running(false);
            self.notify(|l| l.component_removed(&handle));
        }
        self.couplings.clear();
        self.updater.reset_time();
        self.updater.actions().set_default_update_actions();
        info!("Workspace cleared");
        self.notify(|l| l.workspace_cleared());
    }

    /// Edit a component through its concrete type.
    ///
    /// The component's attribute containers are re-discovered afterwards:
    /// couplings on containers that disappeared are removed.
    pub fn edit_component<C: Component, R>(
        &self,
        name: &str,
        edit: impl FnOnce(&mut C) -> R,
    ) -> Result<R, WorkspaceError> {
        let handle = self.handle(name)?;
        let result = handle
            .with_component_as::<C, R>(edit)
            .ok_or_else(|| WorkspaceError::ComponentType {
                component: handle.name().to_string(),
                expected: std::any::type_name::<C>(),
            })?;
        self.refresh_containers(&handle)?;
        Ok(result)
    }

    /// Let a component create a new attribute container, making it available for coupling
    pub fn add_attribute_container<C: Component, A: AttributeContainer>(
        &self,
        component: &str,
        add: impl FnOnce(&mut C) -> Arc<A>,
    ) -> Result<Arc<A>, WorkspaceError> {
        self.edit_component::<C, Arc<A>>(component, add)
    }

    /// Ask a component to drop one of its attribute containers; returns the couplings removed with it
    pub fn remove_attribute_container(
        &self,
        component: &str,
        container_id: &str,
    ) -> Result<Vec<Arc<Coupling>>, WorkspaceError> {
        let handle = self.handle(component)?;
        if !handle.with_component(|c| c.remove_attribute_container(container_id)) {
            return Err(CouplingError::UnknownContainer {
                component: handle.name().to_string(),
                container: container_id.to_string(),
            }
            .into());
        }
        self.refresh_containers(&handle)
    }

    fn refresh_containers(&self, handle: &ComponentHandle) -> Result<Vec<Arc<Coupling>>, WorkspaceError> {
        let gone = handle.refresh_containers();
        let removed = self.couplings.remove_attribute_containers(&gone);
        self.drop_actions_for(&removed);

        let mut ids = HashSet::new();
        for container in handle.attribute_containers() {
            if !ids.insert(container.container_id().to_string()) {
                return Err(WorkspaceError::DuplicateContainer {
                    component: handle.name().to_string(),
                    container: container.container_id().to_string(),
                });
            }
        }
        Ok(removed)
    }

    fn handle(&self, name: &str) -> Result<Arc<ComponentHandle>, WorkspaceError> {
        self.components
            .get(name)
            .ok_or_else(|| WorkspaceError::UnknownComponent(name.to_string()))
    }

    // --- Couplings ---

    fn container(&self, component: &str, container_id: &str) -> Result<Arc<dyn AttributeContainer>, CouplingError> {
        let handle = self
            .components
            .get(component)
            .ok_or_else(|| CouplingError::UnknownComponent(component.to_string()))?;
        handle
            .container(container_id)
            .ok_or_else(|| CouplingError::UnknownContainer {
                component: handle.name().to_string(),
                container: container_id.to_string(),
            })
    }

    /// Bind a producible attribute of a component's container
    pub fn producer(&self, component: &str, container_id: &str, accessor: &str) -> Result<Producer, CouplingError> {
        Producer::new(&self.container(component, container_id)?, accessor)
    }

    /// Bind a consumable attribute of a component's container
    pub fn consumer(&self, component: &str, container_id: &str, accessor: &str) -> Result<Consumer, CouplingError> {
        Consumer::new(&self.container(component, container_id)?, accessor)
    }

    pub fn couple(&self, producer: Producer, consumer: Consumer) -> Result<Arc<Coupling>, CouplingError> {
        self.couplings.create_coupling(producer, consumer)
    }

    /// Couple the preferred compatible attributes of two containers
    pub fn couple_containers(
        &self,
        producer: (&str, &str),
        consumer: (&str, &str),
    ) -> Result<Arc<Coupling>, CouplingError> {
        let source = self.container(producer.0, producer.1)?;
        let target = self.container(consumer.0, consumer.1)?;
        self.couplings.couple_containers(&source, &target)
    }

    pub fn remove_coupling(&self, coupling: &Arc<Coupling>) -> bool {
        let removed = self.couplings.remove_coupling(coupling);
        if removed {
            self.drop_actions_for(std::slice::from_ref(coupling));
        }
        removed
    }

    pub fn couplings(&self) -> Vec<Arc<Coupling>> {
        self.couplings.couplings()
    }

    fn drop_actions_for(&self, couplings: &[Arc<Coupling>]) {
        if couplings.is_empty() {
            return;
        }
        self.updater.actions().remove_actions_where(|a| {
            a.target_coupling()
                .map_or(false, |id| couplings.iter().any(|c| c.id() == id))
        });
    }

    // --- Update actions ---

    /// Actions a control panel can offer: update all, then one per component and per coupling
    pub fn available_actions(&self) -> Vec<Arc<dyn UpdateAction>> {
        let mut actions = vec![self.updater.actions().default_action().clone()];
        for handle in self.components.snapshot() {
            actions.push(Arc::new(UpdateComponentAction::new(handle, self.updater.events().clone())));
        }
        for coupling in self.couplings.couplings() {
            actions.push(Arc::new(UpdateCouplingAction::new(coupling, self.couplings.clone())));
        }
        actions
    }

    pub fn add_update_action(&self, action: Arc<dyn UpdateAction>) {
        self.updater.actions().add_action(action);
    }

    pub fn add_non_removable_action(&self, action: Arc<dyn UpdateAction>) {
        self.updater.actions().add_non_removable_action(action);
    }

    // --- Control ---

    pub fn add_updater_listener(&self, listener: Arc<dyn UpdaterListener>) {
        self.updater.add_listener(listener);
    }

    pub fn run(&self) -> Result<(), UpdateError> {
        self.updater.run()
    }

    pub fn run_once(&self) -> Result<(), UpdateError> {
        self.updater.run_once()
    }

    pub fn iterate(&self, cycles: u64) -> Result<(), UpdateError> {
        self.updater.iterate(cycles)
    }

    pub fn iterate_while(&self, condition: impl FnMut() -> bool) -> Result<(), UpdateError> {
        self.updater.iterate_while(condition)
    }

    pub fn stop(&self) {
        self.updater.stop();
    }

    pub fn is_running(&self) -> bool {
        self.updater.is_running()
    }

    pub fn time(&self) -> u64 {
        self.updater.time()
    }

    pub fn reset_time(&self) {
        self.updater.reset_time();
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("components", &self.components.len())
            .field("couplings", &self.couplings.len())
            .field("updater", &self.updater)
            .finish()
    }
}
