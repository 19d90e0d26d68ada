use crate::core::attributes::{Consumer, Producer};
use crate::core::errors::CouplingError;
use crate::core::types::{ContainerKey, CouplingId};
use std::fmt;

use super::validator::CouplingValidator;

/// A directed edge moving values from one producer to one consumer.
///
/// Only constructed through [`super::CouplingManager`] so that every coupling
/// is registered, indexed and type checked.
#[derive(Clone)]
pub struct Coupling {
    id: CouplingId,
    producer: Producer,
    consumer: Consumer,
}

impl Coupling {
    pub(crate) fn create(id: CouplingId, producer: Producer, consumer: Consumer) -> Result<Self, CouplingError> {
        CouplingValidator::validate_types(&producer, &consumer)?;
        Ok(Self { id, producer, consumer })
    }

    pub fn id(&self) -> CouplingId {
        self.id
    }

    pub fn producer(&self) -> &Producer {
        &self.producer
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// Whether either endpoint belongs to the container `key`
    pub fn touches(&self, key: ContainerKey) -> bool {
        self.producer.container_key() == key || self.consumer.container_key() == key
    }

    /// Both endpoint containers are still alive
    pub fn is_live(&self) -> bool {
        self.producer.is_live() && self.consumer.is_live()
    }

    /// Read the producer and write the value to the consumer
    pub fn update(&self) -> Result<(), CouplingError> {
        let value = self.producer.read()?;
        self.consumer.write(&value)
    }
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} > {}", self.producer, self.consumer)
    }
}

impl fmt::Debug for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self)
    }
}
