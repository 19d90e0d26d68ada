pub mod factory;
pub mod handle;
pub mod registry;
pub mod traits;

// Re-export commonly used types
pub use factory::ComponentFactory;
pub use handle::ComponentHandle;
pub use registry::ComponentRegistry;
pub use traits::{AsAny, Component, UpdateContext};
