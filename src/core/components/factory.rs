use super::traits::Component;
use crate::core::errors::{ArchiveError, ComponentError};
use std::collections::HashMap;

type Constructor = Box<dyn Fn(serde_json::Value) -> Result<Box<dyn Component>, ComponentError> + Send + Sync>;

/// Rebuilds components from archived state, keyed by component kind
pub struct ComponentFactory {
    constructors: HashMap<String, Constructor>,
}

impl ComponentFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register the constructor for a component kind, replacing any previous one
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(serde_json::Value) -> Result<Box<dyn Component>, ComponentError> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.to_string(), Box::new(constructor));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Rebuild a component of `kind` from its archived state
    pub fn create(&self, kind: &str, name: &str, state: serde_json::Value) -> Result<Box<dyn Component>, ArchiveError> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| ArchiveError::UnknownComponentKind(kind.to_string()))?;
        constructor(state).map_err(|source| ArchiveError::Component {
            component: name.to_string(),
            source,
        })
    }
}

impl Default for ComponentFactory {
    /// A factory that knows the built-in component kinds
    fn default() -> Self {
        let mut factory = Self::new();
        crate::models::register_builtin_components(&mut factory);
        factory
    }
}
