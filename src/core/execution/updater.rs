use super::action_manager::UpdateActionManager;
use super::actions::{CycleContext, UpdateAllAction};
use super::config::UpdaterConfig;
use super::executor::ComponentExecutor;
use super::listeners::{UpdaterEvents, UpdaterListener};
use super::profiler::ActionProfiler;
use crate::core::components::{ComponentHandle, ComponentRegistry};
use crate::core::couplings::CouplingManager;
use crate::core::errors::UpdateError;
use log::{debug, info, trace, warn};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Drives workspace cycles.
///
/// A cycle advances `time` by one and runs the action sequence snapshotted
/// at its start, one action after another. A single driver lock keeps cycles
/// from overlapping: control calls made while a run is active fail with
/// [`UpdateError::AlreadyRunning`], and one made right after [`stop`](Self::stop)
/// waits until the cycle in flight has finished.
///
/// If a cycle fails, the remaining actions of that cycle are skipped, the
/// run ends and the error is returned to the caller and passed to
/// [`UpdaterListener::update_failed`].
pub struct WorkspaceUpdater {
    components: Arc<ComponentRegistry>,
    couplings: Arc<CouplingManager>,
    events: Arc<UpdaterEvents>,
    executor: Arc<ComponentExecutor>,
    actions: UpdateActionManager,
    config: UpdaterConfig,
    time: AtomicU64,
    running: AtomicBool,
    driver: Mutex<()>,
    profiler: RwLock<Option<ActionProfiler>>,
}

impl WorkspaceUpdater {
    pub fn new(
        components: Arc<ComponentRegistry>,
        couplings: Arc<CouplingManager>,
        config: UpdaterConfig,
    ) -> Result<Self, UpdateError> {
        let executor = Arc::new(ComponentExecutor::new(&config)?);
        let events = Arc::new(UpdaterEvents::new());
        let update_all = Arc::new(UpdateAllAction::new(couplings.clone(), executor.clone(), events.clone()));

        Ok(Self {
            components,
            couplings,
            events,
            executor,
            actions: UpdateActionManager::new(update_all),
            config,
            time: AtomicU64::new(0),
            running: AtomicBool::new(false),
            driver: Mutex::new(()),
            profiler: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// The action sequence run by each cycle
    pub fn actions(&self) -> &UpdateActionManager {
        &self.actions
    }

    pub(crate) fn events(&self) -> &Arc<UpdaterEvents> {
        &self.events
    }

    pub fn add_listener(&self, listener: Arc<dyn UpdaterListener>) {
        self.events.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn UpdaterListener>) -> bool {
        self.events.remove_listener(listener)
    }

    /// Install or remove the action profiler
    pub fn set_profiler(&self, profiler: Option<ActionProfiler>) {
        *self.profiler.write() = profiler;
    }

    /// Number of cycles completed or started since the last reset
    pub fn time(&self) -> u64 {
        self.time.load(Ordering::SeqCst)
    }

    pub fn set_time(&self, time: u64) {
        self.time.store(time, Ordering::SeqCst);
    }

    pub fn reset_time(&self) {
        self.set_time(0);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask a running `run` or `iterate_while` to end after the current cycle.
    ///
    /// Never interrupts a cycle and has no effect on `iterate`.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!("Stop requested at time {}", self.time());
        }
    }

    /// Stop any run and wait for its cycle in flight to finish.
    ///
    /// No run can start while the guard is held. Must not be called from
    /// inside a cycle.
    pub(crate) fn halt(&self) -> MutexGuard<'_, ()> {
        self.stop();
        self.driver.lock()
    }

    /// Run cycles until [`stop`](Self::stop) is called or a cycle fails
    pub fn run(&self) -> Result<(), UpdateError> {
        self.bracket(|| {
            while self.is_running() {
                self.do_update()?;
            }
            Ok(())
        })
    }

    /// Start [`run`](Self::run) on a background thread
    pub fn spawn_run(self: &Arc<Self>) -> io::Result<JoinHandle<Result<(), UpdateError>>> {
        let updater = Arc::clone(self);
        thread::Builder::new()
            .name("workspace-updater".to_string())
            .spawn(move || updater.run())
    }

    /// Run exactly one cycle
    pub fn run_once(&self) -> Result<(), UpdateError> {
        self.iterate(1)
    }

    /// Run exactly `cycles` cycles
    pub fn iterate(&self, cycles: u64) -> Result<(), UpdateError> {
        self.iterate_then(cycles, || {})
    }

    /// Run exactly `cycles` cycles, then call `finished` before the run ends
    pub fn iterate_then(&self, cycles: u64, finished: impl FnOnce()) -> Result<(), UpdateError> {
        self.bracket(|| {
            for _ in 0..cycles {
                self.do_update()?;
            }
            finished();
            Ok(())
        })
    }

    /// Run at least one cycle, continuing while `condition` holds and no stop was requested
    pub fn iterate_while(&self, mut condition: impl FnMut() -> bool) -> Result<(), UpdateError> {
        self.bracket(|| {
            loop {
                self.do_update()?;
                if !self.is_running() || !condition() {
                    return Ok(());
                }
            }
        })
    }

    /// Mark components running around `body`, holding the driver lock
    fn bracket(&self, body: impl FnOnce() -> Result<(), UpdateError>) -> Result<(), UpdateError> {
        if self.is_running() {
            return Err(UpdateError::AlreadyRunning);
        }
        let _driver = self.driver.lock();
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(UpdateError::AlreadyRunning);
        }

        let started = self.components.snapshot();
        set_running(&started, true);
        self.events.run_started();
        info!("Workspace run started at time {}", self.time());

        let result = body();

        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = &result {
            warn!("Workspace run stopped at time {}: {}", self.time(), e);
            self.events.update_failed(e);
        }
        set_running(&started, false);
        set_running(&self.components.snapshot(), false);
        self.events.run_finished();
        info!("Workspace run finished at time {}", self.time());

        result
    }

    /// One cycle: advance time, then run the snapshotted action sequence in order
    fn do_update(&self) -> Result<(), UpdateError> {
        if !self.config.update_delay.is_zero() {
            thread::sleep(self.config.update_delay);
        }

        let time = self.time.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("=== Workspace cycle {} ===", time);

        let cycle = CycleContext {
            time,
            components: self.components.snapshot(),
            couplings: self.couplings.couplings(),
        };
        let sequence = self.actions.snapshot();
        let profiler = self.profiler.read().clone();

        for (index, action) in sequence.iter().enumerate() {
            match &profiler {
                Some(profiler) => profiler.record(time, index, action.as_ref(), || action.invoke(&cycle))?,
                None => action.invoke(&cycle)?,
            }
        }

        self.events.workspace_updated(time);
        Ok(())
    }
}

impl std::fmt::Debug for WorkspaceUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceUpdater")
            .field("time", &self.time())
            .field("running", &self.is_running())
            .field("executor", &self.executor)
            .finish()
    }
}

fn set_running(components: &[Arc<ComponentHandle>], running: bool) {
    for component in components {
        component.set_running(running);
    }
}
