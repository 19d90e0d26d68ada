use crate::core::errors::UpdateError;
use crate::core::types::ComponentId;
use parking_lot::RwLock;
use std::sync::Arc;

/// Observer trait for updater events.
///
/// Every method has an empty default so listeners implement only what they
/// need. Calls are synchronous, made on the thread that triggers the event,
/// in listener registration order.
pub trait UpdaterListener: Send + Sync {
    /// A run, iteration or single step has started
    fn run_started(&self) {}

    /// The run has finished and components are no longer marked running
    fn run_finished(&self) {}

    /// The coupling pass of cycle `time` has completed
    fn couplings_updated(&self, _time: u64) {}

    /// A component is about to update (called from the worker doing it)
    fn component_update_started(&self, _component: &ComponentId, _time: u64) {}

    /// A component has finished updating (called from the worker doing it)
    fn component_update_finished(&self, _component: &ComponentId, _time: u64) {}

    /// Every action of cycle `time` has completed
    fn workspace_updated(&self, _time: u64) {}

    /// A cycle failed and the run is being stopped
    fn update_failed(&self, _error: &UpdateError) {}
}

/// Synchronous publisher for [`UpdaterListener`]s
#[derive(Default)]
pub struct UpdaterEvents {
    listeners: RwLock<Vec<Arc<dyn UpdaterListener>>>,
}

impl UpdaterEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn UpdaterListener>) {
        self.listeners.write().push(listener);
    }

    /// Remove a listener previously added; returns false if it was not registered
    pub fn remove_listener(&self, listener: &Arc<dyn UpdaterListener>) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    fn each(&self, f: impl Fn(&dyn UpdaterListener)) {
        // Clone the list so listeners may register others while being notified
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }

    pub(crate) fn run_started(&self) {
        self.each(|l| l.run_started());
    }

    pub(crate) fn run_finished(&self) {
        self.each(|l| l.run_finished());
    }

    pub(crate) fn couplings_updated(&self, time: u64) {
        self.each(|l| l.couplings_updated(time));
    }

    pub(crate) fn component_update_started(&self, component: &ComponentId, time: u64) {
        self.each(|l| l.component_update_started(component, time));
    }

    pub(crate) fn component_update_finished(&self, component: &ComponentId, time: u64) {
        self.each(|l| l.component_update_finished(component, time));
    }

    pub(crate) fn workspace_updated(&self, time: u64) {
        self.each(|l| l.workspace_updated(time));
    }

    pub(crate) fn update_failed(&self, error: &UpdateError) {
        self.each(|l| l.update_failed(error));
    }
}
