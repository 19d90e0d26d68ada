//! The units of work a cycle is made of.
//!
//! A cycle invokes the current action sequence in order, on the driver
//! thread. The default sequence is a single [`UpdateAllAction`]; scripts and
//! users may reorder it or mix in per-component, per-coupling and custom
//! actions.

use super::executor::ComponentExecutor;
use super::listeners::UpdaterEvents;
use crate::core::components::ComponentHandle;
use crate::core::couplings::{Coupling, CouplingManager};
use crate::core::errors::{ComponentError, UpdateError};
use crate::core::types::{ComponentId, CouplingId};
use log::trace;
use std::fmt;
use std::sync::Arc;

/// What a cycle sees: its time and the component and coupling snapshots
/// taken when it started.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub time: u64,
    pub components: Vec<Arc<ComponentHandle>>,
    pub couplings: Vec<Arc<Coupling>>,
}

/// A unit of work run once per cycle
pub trait UpdateAction: Send + Sync {
    /// Short label shown in action lists and logs
    fn description(&self) -> String;

    fn long_description(&self) -> String {
        self.description()
    }

    /// Run the action for the cycle in progress
    fn invoke(&self, cycle: &CycleContext) -> Result<(), UpdateError>;

    /// The component this action updates, if it targets exactly one
    fn target_component(&self) -> Option<&ComponentId> {
        None
    }

    /// The coupling this action updates, if it targets exactly one
    fn target_coupling(&self) -> Option<CouplingId> {
        None
    }
}

impl fmt::Debug for dyn UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpdateAction({})", self.description())
    }
}

/// The default action: propagate every coupling, then update every component
/// in parallel and wait for all of them.
///
/// Couplings go first so the values components publish in cycle k are
/// consumed at the start of cycle k+1.
pub struct UpdateAllAction {
    couplings: Arc<CouplingManager>,
    executor: Arc<ComponentExecutor>,
    events: Arc<UpdaterEvents>,
}

impl UpdateAllAction {
    pub fn new(couplings: Arc<CouplingManager>, executor: Arc<ComponentExecutor>, events: Arc<UpdaterEvents>) -> Self {
        Self {
            couplings,
            executor,
            events,
        }
    }
}

impl UpdateAction for UpdateAllAction {
    fn description(&self) -> String {
        "Update All Components and Couplings".to_string()
    }

    fn long_description(&self) -> String {
        "Update all couplings, then update all components in parallel".to_string()
    }

    fn invoke(&self, cycle: &CycleContext) -> Result<(), UpdateError> {
        let report = self.couplings.update_couplings_for(&cycle.couplings);
        trace!(
            "Cycle {}: {} values delivered, {} stale couplings skipped",
            cycle.time,
            report.delivered,
            report.skipped
        );
        self.events.couplings_updated(cycle.time);
        self.executor.update_components(&cycle.components, cycle.time, &self.events)
    }
}

/// Updates a single component
pub struct UpdateComponentAction {
    component: Arc<ComponentHandle>,
    events: Arc<UpdaterEvents>,
}

impl UpdateComponentAction {
    pub fn new(component: Arc<ComponentHandle>, events: Arc<UpdaterEvents>) -> Self {
        Self { component, events }
    }

    pub fn component(&self) -> &Arc<ComponentHandle> {
        &self.component
    }
}

impl UpdateAction for UpdateComponentAction {
    fn description(&self) -> String {
        format!("Update {}", self.component.name())
    }

    fn long_description(&self) -> String {
        format!("Update {} ({})", self.component.name(), self.component.kind())
    }

    fn invoke(&self, cycle: &CycleContext) -> Result<(), UpdateError> {
        if !self.component.is_update_on() {
            return Ok(());
        }
        self.events.component_update_started(self.component.id(), cycle.time);
        self.component.update(cycle.time)?;
        self.events.component_update_finished(self.component.id(), cycle.time);
        Ok(())
    }

    fn target_component(&self) -> Option<&ComponentId> {
        Some(self.component.id())
    }
}

/// Propagates a single coupling
pub struct UpdateCouplingAction {
    coupling: Arc<Coupling>,
    couplings: Arc<CouplingManager>,
}

impl UpdateCouplingAction {
    pub fn new(coupling: Arc<Coupling>, couplings: Arc<CouplingManager>) -> Self {
        Self { coupling, couplings }
    }
}

impl UpdateAction for UpdateCouplingAction {
    fn description(&self) -> String {
        format!("Update coupling ({})", self.coupling)
    }

    fn invoke(&self, _cycle: &CycleContext) -> Result<(), UpdateError> {
        self.couplings.update_coupling(&self.coupling);
        Ok(())
    }

    fn target_coupling(&self) -> Option<CouplingId> {
        Some(self.coupling.id())
    }
}

type ActionFn = Box<dyn Fn(&CycleContext) -> Result<(), ComponentError> + Send + Sync>;

/// An action backed by a closure, for scripts and tests.
///
/// Errors returned by the closure surface as
/// [`UpdateError::ActionInvocationFailure`].
pub struct CustomAction {
    description: String,
    long_description: String,
    body: ActionFn,
}

impl CustomAction {
    pub fn new<F>(description: &str, long_description: &str, body: F) -> Self
    where
        F: Fn(&CycleContext) -> Result<(), ComponentError> + Send + Sync + 'static,
    {
        Self {
            description: description.to_string(),
            long_description: long_description.to_string(),
            body: Box::new(body),
        }
    }
}

impl UpdateAction for CustomAction {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn long_description(&self) -> String {
        self.long_description.clone()
    }

    fn invoke(&self, cycle: &CycleContext) -> Result<(), UpdateError> {
        (self.body)(cycle).map_err(|source| UpdateError::ActionInvocationFailure {
            action: self.description.clone(),
            source,
        })
    }
}

/// Build a shareable custom action whose long description equals its description
pub fn update_action<F>(description: &str, body: F) -> Arc<dyn UpdateAction>
where
    F: Fn(&CycleContext) -> Result<(), ComponentError> + Send + Sync + 'static,
{
    Arc::new(CustomAction::new(description, description, body))
}
