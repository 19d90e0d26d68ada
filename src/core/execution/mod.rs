pub mod action_manager;
pub mod actions;
pub mod config;
pub mod executor;
pub mod listeners;
pub mod profiler;
pub mod updater;

pub use action_manager::{ActionListener, UpdateActionManager};
pub use actions::{
    update_action, CustomAction, CycleContext, UpdateAction, UpdateAllAction, UpdateComponentAction,
    UpdateCouplingAction,
};
pub use config::{ConcurrencyMode, UpdaterConfig};
pub use executor::ComponentExecutor;
pub use listeners::{UpdaterEvents, UpdaterListener};
pub use profiler::{ActionProfiler, ActionRecord};
pub use updater::WorkspaceUpdater;
