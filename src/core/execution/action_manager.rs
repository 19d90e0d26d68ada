use super::actions::UpdateAction;
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// Observer for edits to the action sequence
pub trait ActionListener: Send + Sync {
    fn action_added(&self, _action: &Arc<dyn UpdateAction>) {}

    fn action_removed(&self, _action: &Arc<dyn UpdateAction>) {}

    /// The user-editable list was reordered
    fn action_order_changed(&self) {}
}

#[derive(Default)]
struct ActionLists {
    actions: Vec<Arc<dyn UpdateAction>>,
    non_removable: Vec<Arc<dyn UpdateAction>>,
}

/// The ordered list of actions a cycle runs.
///
/// The user-editable list runs first, followed by a tail of non-removable
/// actions. Both lists sit behind one lock so a cycle always snapshots a
/// consistent sequence; edits made mid-cycle apply from the next cycle.
pub struct UpdateActionManager {
    lists: RwLock<ActionLists>,
    default_action: Arc<dyn UpdateAction>,
    listeners: RwLock<Vec<Arc<dyn ActionListener>>>,
}

impl UpdateActionManager {
    /// Create a manager whose list holds only `default_action`
    pub fn new(default_action: Arc<dyn UpdateAction>) -> Self {
        Self {
            lists: RwLock::new(ActionLists {
                actions: vec![default_action.clone()],
                non_removable: Vec::new(),
            }),
            default_action,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ActionListener>) {
        self.listeners.write().push(listener);
    }

    fn notify(&self, f: impl Fn(&dyn ActionListener)) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }

    /// The user-editable list
    pub fn action_list(&self) -> Vec<Arc<dyn UpdateAction>> {
        self.lists.read().actions.clone()
    }

    pub fn non_removable_actions(&self) -> Vec<Arc<dyn UpdateAction>> {
        self.lists.read().non_removable.clone()
    }

    /// The sequence a cycle runs: the editable list, then the non-removable tail
    pub fn snapshot(&self) -> Vec<Arc<dyn UpdateAction>> {
        let lists = self.lists.read();
        lists.actions.iter().chain(lists.non_removable.iter()).cloned().collect()
    }

    /// Append an action to the editable list
    pub fn add_action(&self, action: Arc<dyn UpdateAction>) {
        debug!("Adding update action '{}'", action.description());
        self.lists.write().actions.push(action.clone());
        self.notify(|l| l.action_added(&action));
    }

    /// Insert an action at `position`, clamped to the end of the list
    pub fn add_action_at(&self, action: Arc<dyn UpdateAction>, position: usize) {
        {
            let mut lists = self.lists.write();
            let position = position.min(lists.actions.len());
            lists.actions.insert(position, action.clone());
        }
        self.notify(|l| l.action_added(&action));
    }

    /// Append to the tail that runs after the editable list and cannot be removed
    pub fn add_non_removable_action(&self, action: Arc<dyn UpdateAction>) {
        self.lists.write().non_removable.push(action.clone());
        self.notify(|l| l.action_added(&action));
    }

    /// Remove an action from the editable list by identity.
    ///
    /// Returns false if it is not in the list; non-removable actions are never removed.
    pub fn remove_action(&self, action: &Arc<dyn UpdateAction>) -> bool {
        let removed = {
            let mut lists = self.lists.write();
            match lists.actions.iter().position(|a| Arc::ptr_eq(a, action)) {
                Some(index) => Some(lists.actions.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(action) => {
                self.notify(|l| l.action_removed(&action));
                true
            }
            None => false,
        }
    }

    /// Remove every editable action matching `predicate`; returns how many went
    pub fn remove_actions_where(&self, predicate: impl Fn(&dyn UpdateAction) -> bool) -> usize {
        let removed = {
            let mut lists = self.lists.write();
            let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut lists.actions)
                .into_iter()
                .partition(|a| predicate(a.as_ref()));
            lists.actions = kept;
            gone
        };
        for action in &removed {
            self.notify(|l| l.action_removed(action));
        }
        removed.len()
    }

    /// Move the action at `from` so it ends up at index `to`
    pub fn move_action(&self, from: usize, to: usize) -> bool {
        {
            let mut lists = self.lists.write();
            let len = lists.actions.len();
            if from >= len || to >= len {
                return false;
            }
            let action = lists.actions.remove(from);
            lists.actions.insert(to, action);
        }
        self.notify(|l| l.action_order_changed());
        true
    }

    pub fn swap_actions(&self, a: usize, b: usize) -> bool {
        {
            let mut lists = self.lists.write();
            let len = lists.actions.len();
            if a >= len || b >= len {
                return false;
            }
            lists.actions.swap(a, b);
        }
        self.notify(|l| l.action_order_changed());
        true
    }

    /// Reset the editable list to the single default action
    pub fn set_default_update_actions(&self) {
        let removed = {
            let mut lists = self.lists.write();
            std::mem::replace(&mut lists.actions, vec![self.default_action.clone()])
        };
        for action in &removed {
            self.notify(|l| l.action_removed(action));
        }
        self.notify(|l| l.action_added(&self.default_action));
    }

    /// Empty the editable list; the non-removable tail stays
    pub fn clear(&self) {
        let removed = std::mem::take(&mut self.lists.write().actions);
        for action in &removed {
            self.notify(|l| l.action_removed(action));
        }
    }

    pub fn default_action(&self) -> &Arc<dyn UpdateAction> {
        &self.default_action
    }

    pub fn len(&self) -> usize {
        let lists = self.lists.read();
        lists.actions.len() + lists.non_removable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::actions::update_action;
    use parking_lot::Mutex;

    fn names(actions: &[Arc<dyn UpdateAction>]) -> Vec<String> {
        actions.iter().map(|a| a.description()).collect()
    }

    fn manager() -> UpdateActionManager {
        UpdateActionManager::new(update_action("default", |_| Ok(())))
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ActionListener for Recorder {
        fn action_added(&self, action: &Arc<dyn UpdateAction>) {
            self.events.lock().push(format!("added {}", action.description()));
        }

        fn action_removed(&self, action: &Arc<dyn UpdateAction>) {
            self.events.lock().push(format!("removed {}", action.description()));
        }

        fn action_order_changed(&self) {
            self.events.lock().push("reordered".to_string());
        }
    }

    #[test]
    fn test_default_sequence() {
        let manager = manager();
        assert_eq!(names(&manager.snapshot()), vec!["default"]);
        assert!(manager.non_removable_actions().is_empty());
    }

    #[test]
    fn test_non_removable_tail_runs_last() {
        let manager = manager();
        let tail = update_action("tail", |_| Ok(()));
        manager.add_non_removable_action(tail.clone());
        manager.add_action(update_action("a", |_| Ok(())));
        manager.add_action_at(update_action("first", |_| Ok(())), 0);

        assert_eq!(names(&manager.snapshot()), vec!["first", "default", "a", "tail"]);
        assert!(!manager.remove_action(&tail));
        manager.clear();
        assert_eq!(names(&manager.snapshot()), vec!["tail"]);
    }

    #[test]
    fn test_reordering() {
        let manager = manager();
        manager.add_action(update_action("a", |_| Ok(())));
        manager.add_action(update_action("b", |_| Ok(())));

        assert!(manager.move_action(0, 2));
        assert_eq!(names(&manager.action_list()), vec!["a", "b", "default"]);
        assert!(manager.swap_actions(0, 1));
        assert_eq!(names(&manager.action_list()), vec!["b", "a", "default"]);
        assert!(!manager.move_action(0, 3));

        manager.set_default_update_actions();
        assert_eq!(names(&manager.action_list()), vec!["default"]);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_edits() {
        let manager = manager();
        let snapshot = manager.snapshot();
        manager.add_action(update_action("late", |_| Ok(())));
        assert_eq!(names(&snapshot), vec!["default"]);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_listener_events() {
        let manager = manager();
        let recorder = Arc::new(Recorder::default());
        manager.add_listener(recorder.clone());

        let a = update_action("a", |_| Ok(()));
        manager.add_action(a.clone());
        manager.swap_actions(0, 1);
        assert!(manager.remove_action(&a));

        assert_eq!(
            *recorder.events.lock(),
            vec!["added a".to_string(), "reordered".to_string(), "removed a".to_string()]
        );
    }
}
