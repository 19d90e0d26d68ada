use super::config::{ConcurrencyMode, UpdaterConfig};
use super::listeners::UpdaterEvents;
use crate::core::components::ComponentHandle;
use crate::core::errors::UpdateError;
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Runs the component updates of one cycle and waits for all of them.
///
/// With [`ConcurrencyMode::Rayon`] every component is handed to a worker of a
/// dedicated pool. The call returns only once every started update has
/// finished, so nothing scheduled for the next cycle can overlap this one.
/// After a failure no further updates are started; when several components
/// fail in the same cycle, which error is reported is unspecified.
pub struct ComponentExecutor {
    mode: ConcurrencyMode,
    pool: Option<ThreadPool>,
}

impl ComponentExecutor {
    pub fn new(config: &UpdaterConfig) -> Result<Self, UpdateError> {
        let pool = match config.concurrency_mode {
            ConcurrencyMode::Sequential => None,
            ConcurrencyMode::Rayon => {
                let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("component-update-{}", i + 1));
                if let Some(size) = config.thread_pool_size {
                    builder = builder.num_threads(size);
                }
                let pool = builder.build()?;
                debug!("Component update pool started with {} threads", pool.current_num_threads());
                Some(pool)
            }
        };
        Ok(Self {
            mode: config.concurrency_mode,
            pool,
        })
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Update every component of the snapshot once
    pub fn update_components(
        &self,
        components: &[Arc<ComponentHandle>],
        time: u64,
        events: &UpdaterEvents,
    ) -> Result<(), UpdateError> {
        let update_one = |component: &Arc<ComponentHandle>| -> Result<(), UpdateError> {
            if !component.is_update_on() {
                return Ok(());
            }
            events.component_update_started(component.id(), time);
            component.update(time)?;
            events.component_update_finished(component.id(), time);
            Ok(())
        };

        match &self.pool {
            Some(pool) => pool.install(|| components.par_iter().try_for_each(update_one)),
            None => components.iter().try_for_each(update_one),
        }
    }
}

impl std::fmt::Debug for ComponentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentExecutor")
            .field("mode", &self.mode)
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}
