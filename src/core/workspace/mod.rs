pub mod archive;
#[allow(clippy::module_inception)]
pub mod workspace;

pub use archive::{AttributeRef, ComponentEntry, CouplingEntry, WorkspaceArchive};
pub use workspace::{Workspace, WorkspaceListener};
