use crate::core::attributes::AttributeContainer;
use crate::core::errors::ComponentError;
use std::any::Any;
use std::sync::Arc;

/// Context handed to a component on every update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateContext {
    /// Workspace time of the cycle in progress (1 for the first cycle)
    pub time: u64,
}

/// Upcast helper so components can be reached by their concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An independently updatable simulation module (a network, a world, a plot).
///
/// The engine never looks inside a component: it discovers its attribute
/// containers, calls [`update`](Component::update) once per cycle, and couples
/// values between containers in between updates.
pub trait Component: AsAny + Send {
    /// Component kind; doubles as the factory key when a workspace is reopened
    fn kind(&self) -> &str;

    /// The containers whose attributes can be coupled.
    ///
    /// Called when the component is attached and again after it has been
    /// edited through the workspace, never during a cycle.
    fn attribute_containers(&self) -> Vec<Arc<dyn AttributeContainer>>;

    /// Advance the component by one step
    fn update(&mut self, ctx: &UpdateContext) -> Result<(), ComponentError>;

    /// Drop the container with the given id; returns false if there is none.
    ///
    /// Components whose containers are fixed keep the default.
    fn remove_attribute_container(&mut self, _container_id: &str) -> bool {
        false
    }

    /// Called when a run starts
    fn on_start(&mut self) {}

    /// Called when a run finishes
    fn on_stop(&mut self) {}

    /// Serialize the component's state for a workspace archive
    fn save(&self) -> Result<serde_json::Value, ComponentError> {
        Ok(serde_json::Value::Null)
    }
}
