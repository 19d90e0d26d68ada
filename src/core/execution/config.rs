//! Configuration for workspace updating
//!
//! This module provides configuration types for controlling how cycles are
//! executed, including how component updates are spread over threads.
use std::time::Duration;

/// How the component updates of one cycle are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Components are updated one after another on the driver thread
    Sequential,
    /// Components are updated concurrently on a dedicated Rayon pool
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Rayon
    }
}

/// Configuration for the workspace updater
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// The concurrency mode used for component updates
    pub concurrency_mode: ConcurrencyMode,
    /// Number of worker threads; `None` lets Rayon decide.
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    /// Pause taken before every cycle, to slow a simulation down
    pub update_delay: Duration,
}

impl UpdaterConfig {
    /// Create a configuration with default values
    ///
    /// Default configuration updates components on a Rayon pool sized by
    /// Rayon, with no delay between cycles
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            update_delay: Duration::ZERO,
        }
    }

    /// Set the concurrency mode
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the number of component update threads
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    /// Set the delay taken before each cycle
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpdaterConfig::default();
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.thread_pool_size, None);
        assert_eq!(config.update_delay, Duration::ZERO);
    }

    #[test]
    fn test_config_builder() {
        let config = UpdaterConfig::new()
            .with_concurrency(ConcurrencyMode::Sequential)
            .with_thread_pool_size(4)
            .with_update_delay(Duration::from_millis(5));

        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.thread_pool_size, Some(4));
        assert_eq!(config.update_delay, Duration::from_millis(5));
    }
}
