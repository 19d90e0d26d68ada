pub mod binding;
pub mod container;

// Re-export commonly used types
pub use binding::{Consumer, Producer};
pub use container::{AttributeContainer, AttributeKind, Attributes, AttributesBuilder, Consumable, Producible};
