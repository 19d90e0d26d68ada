pub mod typed_value;

// Re-export commonly used types
pub use typed_value::{TypedValue, ValueType};
