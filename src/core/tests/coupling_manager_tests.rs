use super::fixtures::Cell;
use crate::core::attributes::{AttributeContainer, Attributes, Consumer, Producer};
use crate::core::couplings::{Coupling, CouplingListener, CouplingManager};
use crate::core::errors::CouplingError;
use crate::models::Neuron;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

// Produces a new number on every read
struct Ticker {
    reads: Arc<AtomicU64>,
    attributes: Attributes,
}

impl Ticker {
    fn new() -> Arc<Self> {
        let reads = Arc::new(AtomicU64::new(0));
        let counter = reads.clone();
        Arc::new(Self {
            reads,
            attributes: Attributes::builder()
                .producible("next", move || counter.fetch_add(1, Ordering::SeqCst) as f64 + 1.0)
                .build(),
        })
    }
}

impl AttributeContainer for Ticker {
    fn container_id(&self) -> &str {
        "ticker"
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[derive(Default)]
struct RemovalLog {
    batches: Mutex<Vec<usize>>,
    added: AtomicU64,
}

impl CouplingListener for RemovalLog {
    fn coupling_added(&self, _coupling: &Coupling) {
        self.added.fetch_add(1, Ordering::SeqCst);
    }

    fn couplings_removed(&self, couplings: &[Arc<Coupling>]) {
        self.batches.lock().push(couplings.len());
    }
}

// Registers `late` with the manager the first time a coupling is added
struct Recruiter {
    manager: Weak<CouplingManager>,
    late: Arc<RemovalLog>,
    recruited: AtomicU64,
}

impl CouplingListener for Recruiter {
    fn coupling_added(&self, _coupling: &Coupling) {
        if self.recruited.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(manager) = self.manager.upgrade() {
                manager.add_listener(self.late.clone());
            }
        }
    }

    fn couplings_removed(&self, _couplings: &[Arc<Coupling>]) {
        if let Some(manager) = self.manager.upgrade() {
            manager.add_listener(Arc::new(RemovalLog::default()));
        }
    }
}

fn value_coupling(manager: &CouplingManager, from: &Arc<Cell>, to: &Arc<Cell>) -> Result<Arc<Coupling>, CouplingError> {
    manager.create_coupling(Producer::of(from, "getValue")?, Consumer::of(to, "setValue")?)
}

#[test]
fn test_propagation_copies_values() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.5);
    let b = Cell::new("b", 0.0);
    value_coupling(&manager, &a, &b)?;

    let report = manager.update_couplings();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(b.value(), 1.5);
    Ok(())
}

#[test]
fn test_fan_out_delivers_one_identical_value() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let ticker = Ticker::new();
    let targets: Vec<Arc<Cell>> = (0..3).map(|i| Cell::new(&format!("t{}", i), 0.0)).collect();
    for target in &targets {
        manager.create_coupling(Producer::of(&ticker, "next")?, Consumer::of(target, "setValue")?)?;
    }

    manager.update_couplings();
    assert_eq!(ticker.reads.load(Ordering::SeqCst), 1);
    assert!(targets.iter().all(|t| t.value() == 1.0));

    manager.update_couplings();
    assert!(targets.iter().all(|t| t.value() == 2.0));
    Ok(())
}

#[test]
fn test_duplicate_coupling_is_rejected() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);
    value_coupling(&manager, &a, &b)?;

    let err = value_coupling(&manager, &a, &b).unwrap_err();
    assert!(matches!(err, CouplingError::DuplicateCoupling { .. }));
    assert_eq!(manager.len(), 1);
    Ok(())
}

#[test]
fn test_many_to_one_last_created_wins() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let first = Cell::new("first", 1.0);
    let second = Cell::new("second", 2.0);
    let target = Cell::new("target", 0.0);
    value_coupling(&manager, &first, &target)?;
    value_coupling(&manager, &second, &target)?;

    manager.update_couplings();
    assert_eq!(target.value(), 2.0);
    Ok(())
}

#[test]
fn test_type_mismatch_is_rejected() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);

    let err = manager
        .create_coupling(Producer::of(&a, "getValue")?, Consumer::of(&b, "setLabel")?)
        .unwrap_err();
    assert!(matches!(err, CouplingError::TypeMismatch { .. }));
    assert!(manager.is_empty());

    manager.create_coupling(Producer::of(&a, "getLabel")?, Consumer::of(&b, "setLabel")?)?;
    manager.update_couplings();
    assert_eq!(b.label(), "");
    Ok(())
}

#[test]
fn test_consumers_see_values_from_before_the_pass() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 2.0);
    let c = Cell::new("c", 3.0);
    value_coupling(&manager, &a, &b)?;
    value_coupling(&manager, &b, &c)?;

    manager.update_couplings();
    assert_eq!(b.value(), 1.0);
    // c gets b's value from before the pass, not the one just delivered
    assert_eq!(c.value(), 2.0);
    Ok(())
}

#[test]
fn test_dropped_container_is_skipped() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);
    let c = Cell::new("c", 0.0);
    value_coupling(&manager, &a, &b)?;
    value_coupling(&manager, &a, &c)?;
    drop(b);

    let report = manager.update_couplings();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(c.value(), 1.0);

    let stale: Vec<_> = manager.couplings().into_iter().filter(|c| !c.is_live()).collect();
    assert_eq!(stale.len(), 1);
    Ok(())
}

#[test]
fn test_coupling_to_dropped_container_is_refused() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);
    let consumer = Consumer::of(&b, "setValue")?;
    drop(b);

    let err = manager.create_coupling(Producer::of(&a, "getValue")?, consumer).unwrap_err();
    assert!(matches!(err, CouplingError::DanglingReference(_)));
    Ok(())
}

#[test]
fn test_container_removal_cascades() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let log = Arc::new(RemovalLog::default());
    manager.add_listener(log.clone());

    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);
    let c = Cell::new("c", 0.0);
    value_coupling(&manager, &a, &b)?;
    value_coupling(&manager, &b, &c)?;
    let kept = value_coupling(&manager, &a, &c)?;

    let removed = manager.remove_attribute_container(b.key());
    assert_eq!(removed.len(), 2);
    assert_eq!(manager.couplings().len(), 1);
    assert_eq!(manager.couplings()[0].id(), kept.id());
    assert!(manager.couplings_for(b.key()).is_empty());
    assert_eq!(log.added.load(Ordering::SeqCst), 3);
    assert_eq!(*log.batches.lock(), vec![2]);

    // Removing again is a no-op
    assert!(manager.remove_attribute_container(b.key()).is_empty());
    assert_eq!(*log.batches.lock(), vec![2]);
    Ok(())
}

#[test]
fn test_listeners_can_register_listeners_while_notified() -> Result<(), CouplingError> {
    let manager = Arc::new(CouplingManager::new());
    let late = Arc::new(RemovalLog::default());
    manager.add_listener(Arc::new(Recruiter {
        manager: Arc::downgrade(&manager),
        late: late.clone(),
        recruited: AtomicU64::new(0),
    }));

    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 0.0);
    let c = Cell::new("c", 0.0);
    value_coupling(&manager, &a, &b)?;
    // Registered during the first notification, so it only sees the second coupling
    assert_eq!(late.added.load(Ordering::SeqCst), 0);
    value_coupling(&manager, &a, &c)?;
    assert_eq!(late.added.load(Ordering::SeqCst), 1);

    assert_eq!(manager.remove_attribute_container(a.key()).len(), 2);
    assert_eq!(*late.batches.lock(), vec![2]);
    Ok(())
}

#[test]
fn test_couplings_iterate_in_creation_order() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let cells: Vec<Arc<Cell>> = (0..4).map(|i| Cell::new(&format!("c{}", i), 0.0)).collect();
    let created: Vec<_> = cells
        .windows(2)
        .map(|pair| value_coupling(&manager, &pair[0], &pair[1]))
        .collect::<Result<_, _>>()?;

    manager.remove_coupling(&created[1]);
    let ids: Vec<_> = manager.couplings().iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![created[0].id(), created[2].id()]);
    assert!(created[0].id() < created[2].id());
    assert!(!manager.remove_coupling(&created[1]));
    Ok(())
}

#[test]
fn test_couple_containers_uses_preferences() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let source: Arc<dyn AttributeContainer> = Neuron::new("source");
    let target: Arc<dyn AttributeContainer> = Neuron::new("target");

    let coupling = manager.couple_containers(&source, &target)?;
    assert_eq!(coupling.producer().accessor(), "getActivation");
    assert_eq!(coupling.consumer().accessor(), "forceSetActivation");

    // The preferred pair is taken, so the next best one is chosen
    let next = manager.couple_containers(&source, &target)?;
    assert_eq!(next.consumer().accessor(), "addInputValue");
    Ok(())
}

#[test]
fn test_couple_containers_without_match() {
    let manager = CouplingManager::new();
    let source: Arc<dyn AttributeContainer> = Ticker::new();
    let target: Arc<dyn AttributeContainer> = Ticker::new();
    let err = manager.couple_containers(&source, &target).unwrap_err();
    assert!(matches!(err, CouplingError::NoCompatibleAttributes { .. }));
}

#[test]
fn test_one_to_one_and_one_to_many() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let sources: Vec<Arc<Cell>> = (0..2).map(|i| Cell::new(&format!("s{}", i), i as f64 + 1.0)).collect();
    let targets: Vec<Arc<Cell>> = (0..3).map(|i| Cell::new(&format!("t{}", i), 0.0)).collect();
    let producers: Vec<Producer> = sources
        .iter()
        .map(|s| Producer::of(s, "getValue"))
        .collect::<Result<_, _>>()?;
    let consumers: Vec<Consumer> = targets
        .iter()
        .map(|t| Consumer::of(t, "setValue"))
        .collect::<Result<_, _>>()?;

    let pairs = manager.create_one_to_one_couplings(&producers, &consumers)?;
    assert_eq!(pairs.len(), 2);
    manager.update_couplings();
    assert_eq!(targets[0].value(), 1.0);
    assert_eq!(targets[1].value(), 2.0);
    assert_eq!(targets[2].value(), 0.0);

    manager.clear();
    let all = manager.create_one_to_many_couplings(&producers[..1], &consumers)?;
    assert_eq!(all.len(), 3);
    manager.update_couplings();
    assert!(targets.iter().all(|t| t.value() == 1.0));
    Ok(())
}

#[test]
fn test_incoming_and_outgoing_updates() -> Result<(), CouplingError> {
    let manager = CouplingManager::new();
    let a = Cell::new("a", 1.0);
    let b = Cell::new("b", 2.0);
    let c = Cell::new("c", 0.0);
    value_coupling(&manager, &a, &b)?;
    value_coupling(&manager, &b, &c)?;

    let report = manager.update_outgoing_couplings(&[b.key()]);
    assert_eq!(report.delivered, 1);
    assert_eq!(c.value(), 2.0);
    assert_eq!(b.value(), 2.0);

    manager.update_incoming_couplings(&[b.key()]);
    assert_eq!(b.value(), 1.0);
    Ok(())
}
