use super::handle::ComponentHandle;
use crate::core::errors::WorkspaceError;
use parking_lot::RwLock;
use std::sync::Arc;

/// Ordered, thread-safe list of the components attached to a workspace.
///
/// Readers take snapshots; edits made while a cycle is running only show up
/// in the next cycle's snapshot.
pub struct ComponentRegistry {
    components: RwLock<Vec<Arc<ComponentHandle>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            components: RwLock::new(Vec::new()),
        }
    }

    /// Register a component handle; names are unique ignoring case
    pub fn register(&self, handle: Arc<ComponentHandle>) -> Result<(), WorkspaceError> {
        let mut components = self.components.write();
        if components.iter().any(|c| c.name().eq_ignore_ascii_case(handle.name())) {
            return Err(WorkspaceError::DuplicateComponent(handle.name().to_string()));
        }
        components.push(handle);
        Ok(())
    }

    /// Remove a component by name
    pub fn remove(&self, name: &str) -> Option<Arc<ComponentHandle>> {
        let mut components = self.components.write();
        let index = components.iter().position(|c| c.name().eq_ignore_ascii_case(name))?;
        Some(components.remove(index))
    }

    /// Get a component by name, ignoring case
    pub fn get(&self, name: &str) -> Option<Arc<ComponentHandle>> {
        self.components
            .read()
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Check if a component exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Snapshot of all components in insertion order
    pub fn snapshot(&self) -> Vec<Arc<ComponentHandle>> {
        self.components.read().clone()
    }

    /// Number of registered components of the given kind
    pub fn count_kind(&self, kind: &str) -> usize {
        self.components.read().iter().filter(|c| c.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }

    /// Remove and return all components
    pub fn drain(&self) -> Vec<Arc<ComponentHandle>> {
        std::mem::take(&mut *self.components.write())
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
