use super::attributes::AttributeKind;
use super::values::ValueType;
use thiserror::Error;

/// Failure reported by a collaborator (a component's update, save or restore)
pub type ComponentError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building or resolving the coupling graph
#[derive(Debug, Error)]
pub enum CouplingError {
    #[error("consumer `{consumer}` accepts {expected} but producer `{producer}` yields {found}")]
    TypeMismatch {
        producer: String,
        consumer: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("`{producer}` is already coupled to `{consumer}`")]
    DuplicateCoupling { producer: String, consumer: String },

    #[error("container `{container}` declares no {kind} attribute `{accessor}`")]
    UnknownAttribute {
        container: String,
        accessor: String,
        kind: AttributeKind,
    },

    #[error("no component named `{0}`")]
    UnknownComponent(String),

    #[error("component `{component}` has no attribute container `{container}`")]
    UnknownContainer { component: String, container: String },

    #[error("attribute container behind `{0}` no longer exists")]
    DanglingReference(String),

    #[error("no compatible attributes between `{producer}` and `{consumer}`")]
    NoCompatibleAttributes { producer: String, consumer: String },
}

/// Errors that stop a cycle
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("component `{component}` failed to update")]
    ComponentUpdateFailure {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error("component `{component}` panicked during update: {message}")]
    ComponentPanicked { component: String, message: String },

    #[error("update action `{action}` failed")]
    ActionInvocationFailure {
        action: String,
        #[source]
        source: ComponentError,
    },

    #[error("the workspace updater is already running")]
    AlreadyRunning,

    #[error("could not build the component update pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl UpdateError {
    /// Name of the component or action whose failure ended the cycle
    pub fn failed_unit(&self) -> Option<&str> {
        match self {
            UpdateError::ComponentUpdateFailure { component, .. }
            | UpdateError::ComponentPanicked { component, .. } => Some(component),
            UpdateError::ActionInvocationFailure { action, .. } => Some(action),
            UpdateError::AlreadyRunning | UpdateError::ThreadPool(_) => None,
        }
    }
}

/// Errors raised by workspace bookkeeping
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("a component named `{0}` already exists")]
    DuplicateComponent(String),

    #[error("no component named `{0}`")]
    UnknownComponent(String),

    #[error("component `{component}` is not a {expected}")]
    ComponentType { component: String, expected: &'static str },

    #[error("component `{component}` already holds a container with id `{container}`")]
    DuplicateContainer { component: String, container: String },

    #[error(transparent)]
    Coupling(#[from] CouplingError),
}

/// Errors raised while saving or reopening a workspace archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed workspace archive: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no factory registered for component kind `{0}`")]
    UnknownComponentKind(String),

    #[error("component `{component}` could not be archived or restored")]
    Component {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error("archived coupling refers to missing attribute `{component}/{container}/{accessor}`")]
    UnresolvedAttribute {
        component: String,
        container: String,
        accessor: String,
    },

    #[error(transparent)]
    Coupling(#[from] CouplingError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
