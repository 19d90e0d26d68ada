pub mod core;
pub mod models;

// Re-export commonly used types
pub use crate::core::attributes::{AttributeContainer, Attributes, Consumer, Producer};
pub use crate::core::components::{Component, ComponentFactory, ComponentHandle, UpdateContext};
pub use crate::core::couplings::{Coupling, CouplingListener, CouplingManager, PropagationReport};
pub use crate::core::errors::{ArchiveError, ComponentError, CouplingError, UpdateError, WorkspaceError};
pub use crate::core::execution::{
    update_action, ActionProfiler, ActionRecord, ConcurrencyMode, CycleContext, UpdateAction, UpdateActionManager,
    UpdaterConfig, UpdaterListener, WorkspaceUpdater,
};
pub use crate::core::types::{ComponentId, ContainerKey, CouplingId};
pub use crate::core::values::{TypedValue, ValueType};
pub use crate::core::workspace::{Workspace, WorkspaceListener};
