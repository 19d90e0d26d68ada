use super::coupling::Coupling;
use super::validator::CouplingValidator;
use crate::core::attributes::{AttributeContainer, Consumer, Producer};
use crate::core::errors::CouplingError;
use crate::core::types::{ContainerKey, CouplingId};
use crate::core::values::TypedValue;
use log::{debug, trace, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Observer for changes to the coupling graph
pub trait CouplingListener: Send + Sync {
    /// Called after a coupling has been registered
    fn coupling_added(&self, _coupling: &Coupling) {}

    /// Called once per removal batch
    fn couplings_removed(&self, _couplings: &[Arc<Coupling>]) {}
}

/// Outcome of one propagation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    /// Values written to consumers
    pub delivered: usize,
    /// Edges skipped because an endpoint no longer exists
    pub skipped: usize,
}

#[derive(Default)]
struct CouplingGraph {
    /// Couplings keyed by id; iteration order is creation order
    couplings: BTreeMap<CouplingId, Arc<Coupling>>,
    /// Couplings touching each attribute container, for cascade removal
    by_container: HashMap<ContainerKey, BTreeSet<CouplingId>>,
    next_id: u64,
}

impl CouplingGraph {
    fn insert(&mut self, coupling: Arc<Coupling>) {
        let id = coupling.id();
        self.by_container
            .entry(coupling.producer().container_key())
            .or_default()
            .insert(id);
        self.by_container
            .entry(coupling.consumer().container_key())
            .or_default()
            .insert(id);
        self.couplings.insert(id, coupling);
    }

    fn remove(&mut self, id: CouplingId) -> Option<Arc<Coupling>> {
        let coupling = self.couplings.remove(&id)?;
        for key in [coupling.producer().container_key(), coupling.consumer().container_key()] {
            if let Some(ids) = self.by_container.get_mut(&key) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_container.remove(&key);
                }
            }
        }
        Some(coupling)
    }
}

/// Owns the coupling graph and moves values along it.
///
/// Couplings can be created many-to-many. Several producers may feed the same
/// consumer; they are delivered in creation order so the last one wins. The
/// exact same (producer, consumer) pair can only be coupled once.
///
/// All methods take `&self`; the graph can be edited from any thread while a
/// propagation pass works on its own snapshot.
pub struct CouplingManager {
    graph: RwLock<CouplingGraph>,
    listeners: RwLock<Vec<Arc<dyn CouplingListener>>>,
}

impl CouplingManager {
    /// Create an empty coupling manager
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(CouplingGraph::default()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener; listeners are notified in registration order
    pub fn add_listener(&self, listener: Arc<dyn CouplingListener>) {
        self.listeners.write().push(listener);
    }

    /// Create a coupling from a producer and a consumer of a compatible type
    pub fn create_coupling(&self, producer: Producer, consumer: Consumer) -> Result<Arc<Coupling>, CouplingError> {
        CouplingValidator::check_live(&producer, &consumer)?;
        CouplingValidator::validate_types(&producer, &consumer)?;

        let coupling = {
            let mut graph = self.graph.write();
            CouplingValidator::check_duplicate(
                graph.couplings.values().map(|c| c.as_ref()),
                &producer,
                &consumer,
            )?;
            let id = CouplingId(graph.next_id);
            let coupling = Arc::new(Coupling::create(id, producer, consumer)?);
            graph.next_id += 1;
            graph.insert(Arc::clone(&coupling));
            coupling
        };

        debug!("created {:?}", coupling);
        for listener in self.listeners() {
            listener.coupling_added(&coupling);
        }
        Ok(coupling)
    }

    /// Couple the best type-matched producer/consumer pair of two containers.
    ///
    /// Pairs are ranked by summed preference; ties go to declaration order.
    /// Pairs that are already coupled are not considered.
    pub fn couple_containers(
        &self,
        producing: &Arc<dyn AttributeContainer>,
        consuming: &Arc<dyn AttributeContainer>,
    ) -> Result<Arc<Coupling>, CouplingError> {
        let existing = self.couplings();
        let mut best: Option<(i32, Producer, Consumer)> = None;
        for producer in Producer::all(producing) {
            for consumer in Consumer::all(consuming) {
                if !consumer.value_type().is_assignable_from(&producer.value_type()) {
                    continue;
                }
                if CouplingValidator::check_duplicate(existing.iter().map(|c| c.as_ref()), &producer, &consumer).is_err() {
                    continue;
                }
                let score = producer.preference() + consumer.preference();
                if best.as_ref().map_or(true, |(top, _, _)| score > *top) {
                    best = Some((score, producer.clone(), consumer));
                }
            }
        }

        let (_, producer, consumer) = best.ok_or_else(|| CouplingError::NoCompatibleAttributes {
            producer: producing.container_id().to_string(),
            consumer: consuming.container_id().to_string(),
        })?;
        self.create_coupling(producer, consumer)
    }

    /// Couple every producer to every consumer
    pub fn create_one_to_many_couplings(
        &self,
        producers: &[Producer],
        consumers: &[Consumer],
    ) -> Result<Vec<Arc<Coupling>>, CouplingError> {
        let mut created = Vec::with_capacity(producers.len() * consumers.len());
        for producer in producers {
            for consumer in consumers {
                created.push(self.create_coupling(producer.clone(), consumer.clone())?);
            }
        }
        Ok(created)
    }

    /// Couple producers and consumers pairwise, stopping at the shorter list
    pub fn create_one_to_one_couplings(
        &self,
        producers: &[Producer],
        consumers: &[Consumer],
    ) -> Result<Vec<Arc<Coupling>>, CouplingError> {
        producers
            .iter()
            .zip(consumers)
            .map(|(producer, consumer)| self.create_coupling(producer.clone(), consumer.clone()))
            .collect()
    }

    /// Auto-couple containers pairwise, stopping at the shorter list
    pub fn couple_containers_one_to_one(
        &self,
        producing: &[Arc<dyn AttributeContainer>],
        consuming: &[Arc<dyn AttributeContainer>],
    ) -> Result<Vec<Arc<Coupling>>, CouplingError> {
        producing
            .iter()
            .zip(consuming)
            .map(|(p, c)| self.couple_containers(p, c))
            .collect()
    }

    /// Snapshot of all couplings in creation order
    pub fn couplings(&self) -> Vec<Arc<Coupling>> {
        self.graph.read().couplings.values().cloned().collect()
    }

    /// Look up a coupling by id
    pub fn coupling(&self, id: CouplingId) -> Option<Arc<Coupling>> {
        self.graph.read().couplings.get(&id).cloned()
    }

    /// Couplings touching the container `key`, in creation order
    pub fn couplings_for(&self, key: ContainerKey) -> Vec<Arc<Coupling>> {
        let graph = self.graph.read();
        graph
            .by_container
            .get(&key)
            .map(|ids| ids.iter().filter_map(|id| graph.couplings.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.graph.read().couplings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.read().couplings.is_empty()
    }

    /// Remove a specific coupling. Returns false if it was not registered.
    pub fn remove_coupling(&self, coupling: &Coupling) -> bool {
        let removed = self.graph.write().remove(coupling.id());
        match removed {
            Some(removed) => {
                debug!("removed {:?}", removed);
                self.fire_removed(&[removed]);
                true
            }
            None => false,
        }
    }

    /// Remove a batch of couplings, notifying listeners once
    pub fn remove_couplings(&self, couplings: &[Arc<Coupling>]) -> usize {
        let removed: Vec<Arc<Coupling>> = {
            let mut graph = self.graph.write();
            couplings.iter().filter_map(|c| graph.remove(c.id())).collect()
        };
        if !removed.is_empty() {
            debug!("removed {} couplings", removed.len());
            self.fire_removed(&removed);
        }
        removed.len()
    }

    /// Remove every coupling touching the container `key`
    pub fn remove_attribute_container(&self, key: ContainerKey) -> Vec<Arc<Coupling>> {
        self.remove_attribute_containers(&[key])
    }

    /// Remove every coupling touching any of `keys`, notifying listeners once
    pub fn remove_attribute_containers(&self, keys: &[ContainerKey]) -> Vec<Arc<Coupling>> {
        let removed: Vec<Arc<Coupling>> = {
            let mut graph = self.graph.write();
            let ids: BTreeSet<CouplingId> = keys
                .iter()
                .filter_map(|key| graph.by_container.get(key))
                .flat_map(|ids| ids.iter().copied())
                .collect();
            ids.into_iter().filter_map(|id| graph.remove(id)).collect()
        };
        if !removed.is_empty() {
            debug!("cascade removed {} couplings from {} containers", removed.len(), keys.len());
            self.fire_removed(&removed);
        }
        removed
    }

    /// Remove all couplings
    pub fn clear(&self) {
        let removed: Vec<Arc<Coupling>> = {
            let mut graph = self.graph.write();
            graph.by_container.clear();
            std::mem::take(&mut graph.couplings).into_values().collect()
        };
        if !removed.is_empty() {
            self.fire_removed(&removed);
        }
    }

    /// Update all couplings by setting the consumers to the values of their producers.
    ///
    /// Works on a snapshot taken at the start of the pass. Every producer is
    /// read before any consumer is written, and each producer is read at most
    /// once, so fan-out delivers one identical value. Writes happen in creation
    /// order. Edges whose endpoints no longer exist are skipped.
    pub fn update_couplings(&self) -> PropagationReport {
        let snapshot = self.couplings();
        self.propagate(&snapshot)
    }

    /// Propagate only the given couplings, with the same guarantees as
    /// [`update_couplings`](Self::update_couplings)
    pub fn update_couplings_for(&self, couplings: &[Arc<Coupling>]) -> PropagationReport {
        self.propagate(couplings)
    }

    /// Propagate a single coupling
    pub fn update_coupling(&self, coupling: &Arc<Coupling>) -> PropagationReport {
        self.propagate(std::slice::from_ref(coupling))
    }

    /// Propagate couplings whose consumer lives in one of `keys`
    pub fn update_incoming_couplings(&self, keys: &[ContainerKey]) -> PropagationReport {
        let incoming: Vec<Arc<Coupling>> = self
            .couplings()
            .into_iter()
            .filter(|c| keys.contains(&c.consumer().container_key()))
            .collect();
        self.propagate(&incoming)
    }

    /// Propagate couplings whose producer lives in one of `keys`
    pub fn update_outgoing_couplings(&self, keys: &[ContainerKey]) -> PropagationReport {
        let outgoing: Vec<Arc<Coupling>> = self
            .couplings()
            .into_iter()
            .filter(|c| keys.contains(&c.producer().container_key()))
            .collect();
        self.propagate(&outgoing)
    }

    fn propagate(&self, couplings: &[Arc<Coupling>]) -> PropagationReport {
        let mut report = PropagationReport::default();
        let mut reads: HashMap<(ContainerKey, &str), Option<TypedValue>> = HashMap::new();

        // Read phase
        let values: Vec<Option<TypedValue>> = couplings
            .iter()
            .map(|coupling| {
                let producer = coupling.producer();
                reads
                    .entry((producer.container_key(), producer.accessor()))
                    .or_insert_with(|| match producer.read() {
                        Ok(value) => Some(value),
                        Err(err) => {
                            debug!("skipping {:?}: {}", coupling, err);
                            None
                        }
                    })
                    .clone()
            })
            .collect();

        // Write phase
        for (coupling, value) in couplings.iter().zip(values) {
            let Some(value) = value else {
                report.skipped += 1;
                continue;
            };
            match coupling.consumer().write(&value) {
                Ok(()) => report.delivered += 1,
                Err(CouplingError::DanglingReference(_)) => {
                    debug!("skipping {:?}: consumer no longer exists", coupling);
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!("skipping {:?}: {}", coupling, err);
                    report.skipped += 1;
                }
            }
        }

        trace!("propagated {} couplings, skipped {}", report.delivered, report.skipped);
        report
    }

    fn fire_removed(&self, removed: &[Arc<Coupling>]) {
        for listener in self.listeners() {
            listener.couplings_removed(removed);
        }
    }

    /// Copy of the listener list, so listeners may register others while notified
    fn listeners(&self) -> Vec<Arc<dyn CouplingListener>> {
        self.listeners.read().clone()
    }
}

impl Default for CouplingManager {
    fn default() -> Self {
        Self::new()
    }
}
