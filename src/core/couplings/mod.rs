pub mod coupling;
pub mod manager;
pub mod validator;

// Re-export commonly used types
pub use coupling::Coupling;
pub use manager::{CouplingListener, CouplingManager, PropagationReport};
pub use validator::CouplingValidator;
