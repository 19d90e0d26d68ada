use super::coupling::Coupling;
use crate::core::attributes::{Consumer, Producer};
use crate::core::errors::CouplingError;

/// Centralized coupling validation logic
pub struct CouplingValidator;

impl CouplingValidator {
    /// Check that the consumer can accept the producer's value type
    pub fn validate_types(producer: &Producer, consumer: &Consumer) -> Result<(), CouplingError> {
        if !consumer.value_type().is_assignable_from(&producer.value_type()) {
            return Err(CouplingError::TypeMismatch {
                producer: producer.to_string(),
                consumer: consumer.to_string(),
                expected: consumer.value_type(),
                found: producer.value_type(),
            });
        }
        Ok(())
    }

    /// Reject a second coupling between the same producer and consumer
    pub fn check_duplicate<'a>(
        existing: impl IntoIterator<Item = &'a Coupling>,
        producer: &Producer,
        consumer: &Consumer,
    ) -> Result<(), CouplingError> {
        for coupling in existing {
            if coupling.producer() == producer && coupling.consumer() == consumer {
                return Err(CouplingError::DuplicateCoupling {
                    producer: producer.to_string(),
                    consumer: consumer.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check that neither endpoint has already been dropped
    pub fn check_live(producer: &Producer, consumer: &Consumer) -> Result<(), CouplingError> {
        if !producer.is_live() {
            return Err(CouplingError::DanglingReference(producer.to_string()));
        }
        if !consumer.is_live() {
            return Err(CouplingError::DanglingReference(consumer.to_string()));
        }
        Ok(())
    }
}
