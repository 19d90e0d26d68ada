use super::container::{AttributeContainer, AttributeKind};
use crate::core::errors::CouplingError;
use crate::core::types::ContainerKey;
use crate::core::values::{TypedValue, ValueType};
use std::fmt;
use std::sync::{Arc, Weak};

/// Read-only binding to one producible accessor of a container.
///
/// The owner is held weakly: once the container is dropped the binding is
/// stale and every read reports a dangling reference.
#[derive(Clone)]
pub struct Producer {
    owner: Weak<dyn AttributeContainer>,
    key: ContainerKey,
    container_id: String,
    accessor: String,
    index: usize,
    value_type: ValueType,
    preference: i32,
}

impl Producer {
    /// Bind to the producible named `accessor`
    pub fn new(container: &Arc<dyn AttributeContainer>, accessor: &str) -> Result<Self, CouplingError> {
        let attributes = container.attributes();
        let index = attributes
            .producible_index(accessor)
            .ok_or_else(|| CouplingError::UnknownAttribute {
                container: container.container_id().to_string(),
                accessor: accessor.to_string(),
                kind: AttributeKind::Producible,
            })?;
        Ok(Self::at(container, index))
    }

    /// Bind to a concrete container type
    pub fn of<C: AttributeContainer>(container: &Arc<C>, accessor: &str) -> Result<Self, CouplingError> {
        let container: Arc<dyn AttributeContainer> = container.clone();
        Self::new(&container, accessor)
    }

    /// Every producer the container declares, in declaration order
    pub fn all(container: &Arc<dyn AttributeContainer>) -> Vec<Producer> {
        (0..container.attributes().producibles().len())
            .map(|index| Self::at(container, index))
            .collect()
    }

    fn at(container: &Arc<dyn AttributeContainer>, index: usize) -> Self {
        let producible = &container.attributes().producibles()[index];
        Self {
            owner: Arc::downgrade(container),
            key: container.key(),
            container_id: container.container_id().to_string(),
            accessor: producible.name().to_string(),
            index,
            value_type: producible.value_type(),
            preference: producible.preference(),
        }
    }

    /// Read the current value
    pub fn read(&self) -> Result<TypedValue, CouplingError> {
        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| CouplingError::DanglingReference(self.to_string()))?;
        let producible = owner
            .attributes()
            .producibles()
            .get(self.index)
            .ok_or_else(|| CouplingError::DanglingReference(self.to_string()))?;
        Ok(producible.read())
    }

    /// Whether the owning container is still alive
    pub fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }

    pub fn container_key(&self) -> ContainerKey {
        self.key
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn preference(&self) -> i32 {
        self.preference
    }
}

impl PartialEq for Producer {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.index == other.index
    }
}

impl Eq for Producer {}

impl fmt::Display for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container_id, self.accessor)
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Producer({}: {})", self, self.value_type)
    }
}

/// Write-only binding to one consumable accessor of a container.
#[derive(Clone)]
pub struct Consumer {
    owner: Weak<dyn AttributeContainer>,
    key: ContainerKey,
    container_id: String,
    accessor: String,
    index: usize,
    value_type: ValueType,
    preference: i32,
}

impl Consumer {
    /// Bind to the consumable named `accessor`
    pub fn new(container: &Arc<dyn AttributeContainer>, accessor: &str) -> Result<Self, CouplingError> {
        let attributes = container.attributes();
        let index = attributes
            .consumable_index(accessor)
            .ok_or_else(|| CouplingError::UnknownAttribute {
                container: container.container_id().to_string(),
                accessor: accessor.to_string(),
                kind: AttributeKind::Consumable,
            })?;
        Ok(Self::at(container, index))
    }

    /// Bind to a concrete container type
    pub fn of<C: AttributeContainer>(container: &Arc<C>, accessor: &str) -> Result<Self, CouplingError> {
        let container: Arc<dyn AttributeContainer> = container.clone();
        Self::new(&container, accessor)
    }

    /// Every consumer the container declares, in declaration order
    pub fn all(container: &Arc<dyn AttributeContainer>) -> Vec<Consumer> {
        (0..container.attributes().consumables().len())
            .map(|index| Self::at(container, index))
            .collect()
    }

    fn at(container: &Arc<dyn AttributeContainer>, index: usize) -> Self {
        let consumable = &container.attributes().consumables()[index];
        Self {
            owner: Arc::downgrade(container),
            key: container.key(),
            container_id: container.container_id().to_string(),
            accessor: consumable.name().to_string(),
            index,
            value_type: consumable.value_type(),
            preference: consumable.preference(),
        }
    }

    /// Write `value` into the consumer
    pub fn write(&self, value: &TypedValue) -> Result<(), CouplingError> {
        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| CouplingError::DanglingReference(self.to_string()))?;
        let consumable = owner
            .attributes()
            .consumables()
            .get(self.index)
            .ok_or_else(|| CouplingError::DanglingReference(self.to_string()))?;
        if consumable.write(value) {
            Ok(())
        } else {
            Err(CouplingError::TypeMismatch {
                producer: "<value>".to_string(),
                consumer: self.to_string(),
                expected: self.value_type,
                found: value.value_type(),
            })
        }
    }

    /// Whether the owning container is still alive
    pub fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }

    pub fn container_key(&self) -> ContainerKey {
        self.key
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn preference(&self) -> i32 {
        self.preference
    }
}

impl PartialEq for Consumer {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.index == other.index
    }
}

impl Eq for Consumer {}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.container_id, self.accessor)
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Consumer({}: {})", self, self.value_type)
    }
}
