use super::actions::UpdateAction;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use std::time::Instant;

/// Timing of one action invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Workspace time of the cycle
    pub cycle: u64,
    /// Position of the action in the cycle's sequence
    pub index: usize,
    pub description: String,
    /// Name of the thread that ran the action
    pub thread: String,
    pub elapsed_nanos: u64,
    pub succeeded: bool,
}

/// Emits an [`ActionRecord`] for every action a cycle invokes.
///
/// Records are sent on an unbounded channel so the profiler never blocks the
/// driver. Once the receiver is dropped, records are discarded.
#[derive(Debug, Clone)]
pub struct ActionProfiler {
    sender: Sender<ActionRecord>,
}

impl ActionProfiler {
    /// Create a profiler and the receiving end of its record stream
    pub fn channel() -> (Self, Receiver<ActionRecord>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }

    /// Run `invoke` and record how long it took
    pub(crate) fn record<T, E>(
        &self,
        cycle: u64,
        index: usize,
        action: &dyn UpdateAction,
        invoke: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let result = invoke();
        let elapsed_nanos = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let current = thread::current();
        let record = ActionRecord {
            cycle,
            index,
            description: action.description(),
            thread: current.name().unwrap_or("unnamed").to_string(),
            elapsed_nanos,
            succeeded: result.is_ok(),
        };
        let _ = self.sender.send(record);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::actions::update_action;

    #[test]
    fn test_records_are_emitted() {
        let (profiler, records) = ActionProfiler::channel();
        let action = update_action("noop", |_| Ok(()));

        let result: Result<u32, ()> = profiler.record(7, 2, action.as_ref(), || Ok(5));
        assert_eq!(result, Ok(5));

        let record = records.try_recv().unwrap();
        assert_eq!(record.cycle, 7);
        assert_eq!(record.index, 2);
        assert_eq!(record.description, "noop");
        assert!(record.succeeded);
        assert!(records.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (profiler, records) = ActionProfiler::channel();
        drop(records);
        let action = update_action("noop", |_| Ok(()));
        let result: Result<(), &str> = profiler.record(1, 0, action.as_ref(), || Err("failed"));
        assert_eq!(result, Err("failed"));
    }
}
