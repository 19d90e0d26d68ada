use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Component identifier with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    pub(crate) name: String,
    pub(crate) kind: String,
}

impl ComponentId {
    /// Create a new component ID
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Get the component's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the component kind (the factory key used when reopening a workspace)
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identity of one attribute container, minted when its attributes are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerKey(Uuid);

impl ContainerKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContainerKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coupling identifier; ordering follows creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CouplingId(pub(crate) u64);

impl CouplingId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CouplingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Coupling_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_id_display_uses_name() {
        let id = ComponentId::new("Network1", "Network");
        assert_eq!(id.to_string(), "Network1");
        assert_eq!(id.kind(), "Network");
    }

    #[test]
    fn test_container_keys_are_unique() {
        assert_ne!(ContainerKey::new(), ContainerKey::new());
    }

    #[test]
    fn test_coupling_id_ordering() {
        assert!(CouplingId(1) < CouplingId(2));
        assert_eq!(CouplingId(3).to_string(), "Coupling_3");
    }
}
