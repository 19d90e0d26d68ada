use crate::core::attributes::{AttributeContainer, Attributes};
use crate::core::components::{Component, UpdateContext};
use crate::core::errors::ComponentError;
use parking_lot::Mutex;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Preference that makes auto-coupling pick `forceSetActivation`
pub const FORCE_SET_PREFERENCE: i32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeuronState {
    pub id: String,
    pub activation: f64,
    pub bias: f64,
    pub clamped: bool,
    /// Inputs accumulated since the last update
    #[serde(skip)]
    pub input: f64,
    /// Activation was forced since the last update and is kept through it
    #[serde(skip)]
    pub forced: bool,
}

/// A single unit of a [`NetworkComponent`].
///
/// Produces `getActivation` and consumes `forceSetActivation` (preferred),
/// `addInputValue` and `setBias`, all `f64`. A forced activation survives the
/// next update unchanged; after that the neuron follows its update rule again.
#[derive(Debug)]
pub struct Neuron {
    id: String,
    state: Arc<Mutex<NeuronState>>,
    attributes: Attributes,
}

impl Neuron {
    pub fn new(id: &str) -> Arc<Self> {
        Self::from_state(NeuronState {
            id: id.to_string(),
            ..NeuronState::default()
        })
    }

    pub fn from_state(state: NeuronState) -> Arc<Self> {
        let id = state.id.clone();
        let state = Arc::new(Mutex::new(state));
        let (get, force, input, bias) = (state.clone(), state.clone(), state.clone(), state.clone());

        let attributes = Attributes::builder()
            .producible("getActivation", move || get.lock().activation)
            .consumable("forceSetActivation", move |v: f64| {
                let mut state = force.lock();
                state.activation = v;
                state.forced = true;
            })
            .with_preference(FORCE_SET_PREFERENCE)
            .consumable("addInputValue", move |v: f64| input.lock().input += v)
            .consumable("setBias", move |v: f64| bias.lock().bias = v)
            .build();

        Arc::new(Self { id, state, attributes })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn activation(&self) -> f64 {
        self.state.lock().activation
    }

    pub fn set_activation(&self, activation: f64) {
        self.state.lock().activation = activation;
    }

    pub fn bias(&self) -> f64 {
        self.state.lock().bias
    }

    pub fn set_bias(&self, bias: f64) {
        self.state.lock().bias = bias;
    }

    pub fn is_clamped(&self) -> bool {
        self.state.lock().clamped
    }

    pub fn set_clamped(&self, clamped: bool) {
        self.state.lock().clamped = clamped;
    }

    pub fn add_input(&self, value: f64) {
        self.state.lock().input += value;
    }

    pub fn state(&self) -> NeuronState {
        self.state.lock().clone()
    }

    fn update(&self, noise: Option<f64>) {
        let mut state = self.state.lock();
        if !state.clamped && !state.forced {
            state.activation = state.bias + state.input + noise.unwrap_or(0.0);
        }
        state.input = 0.0;
        state.forced = false;
    }
}

impl AttributeContainer for Neuron {
    fn container_id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct NetworkState {
    neurons: Vec<NeuronState>,
    #[serde(default)]
    noise_std_dev: f64,
    next_index: usize,
}

/// A bare network of independent neurons
pub struct NetworkComponent {
    neurons: Vec<Arc<Neuron>>,
    noise_std_dev: f64,
    next_index: usize,
}

impl NetworkComponent {
    pub const KIND: &'static str = "Network";

    pub fn new() -> Self {
        Self {
            neurons: Vec::new(),
            noise_std_dev: 0.0,
            next_index: 1,
        }
    }

    /// Add gaussian noise with the given standard deviation to unclamped neurons
    pub fn with_noise(mut self, std_dev: f64) -> Self {
        self.noise_std_dev = std_dev;
        self
    }

    /// Add a neuron with id `Neuron_<n>`
    pub fn add_neuron(&mut self) -> Arc<Neuron> {
        let neuron = Neuron::new(&format!("Neuron_{}", self.next_index));
        self.next_index += 1;
        self.neurons.push(neuron.clone());
        neuron
    }

    pub fn neuron(&self, id: &str) -> Option<&Arc<Neuron>> {
        self.neurons.iter().find(|n| n.id() == id)
    }

    pub fn neurons(&self) -> &[Arc<Neuron>] {
        &self.neurons
    }

    pub fn remove_neuron(&mut self, id: &str) -> bool {
        let before = self.neurons.len();
        self.neurons.retain(|n| n.id() != id);
        self.neurons.len() != before
    }

    /// Rebuild a network from the state written by [`Component::save`]
    pub fn restore(state: serde_json::Value) -> Result<Self, ComponentError> {
        let state: NetworkState = serde_json::from_value(state)?;
        Ok(Self {
            neurons: state.neurons.into_iter().map(Neuron::from_state).collect(),
            noise_std_dev: state.noise_std_dev,
            next_index: state.next_index,
        })
    }
}

impl Default for NetworkComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for NetworkComponent {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn attribute_containers(&self) -> Vec<Arc<dyn AttributeContainer>> {
        self.neurons
            .iter()
            .map(|n| n.clone() as Arc<dyn AttributeContainer>)
            .collect()
    }

    fn update(&mut self, _ctx: &UpdateContext) -> Result<(), ComponentError> {
        if self.noise_std_dev > 0.0 {
            let normal = Normal::new(0.0, self.noise_std_dev)?;
            let mut rng = rand::thread_rng();
            for neuron in &self.neurons {
                neuron.update(Some(normal.sample(&mut rng)));
            }
        } else {
            for neuron in &self.neurons {
                neuron.update(None);
            }
        }
        Ok(())
    }

    fn remove_attribute_container(&mut self, container_id: &str) -> bool {
        self.remove_neuron(container_id)
    }

    fn save(&self) -> Result<serde_json::Value, ComponentError> {
        let state = NetworkState {
            neurons: self.neurons.iter().map(|n| n.state()).collect(),
            noise_std_dev: self.noise_std_dev,
            next_index: self.next_index,
        };
        Ok(serde_json::to_value(state)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rule() {
        let mut network = NetworkComponent::new();
        let free = network.add_neuron();
        let clamped = network.add_neuron();
        free.set_bias(0.25);
        free.add_input(0.5);
        free.add_input(0.25);
        clamped.set_activation(0.7);
        clamped.set_clamped(true);
        clamped.add_input(3.0);

        network.update(&UpdateContext { time: 1 }).unwrap();
        assert_eq!(free.activation(), 1.0);
        assert_eq!(clamped.activation(), 0.7);

        // Inputs are consumed by the update
        network.update(&UpdateContext { time: 2 }).unwrap();
        assert_eq!(free.activation(), 0.25);
    }

    #[test]
    fn test_forced_activation_holds_for_one_update() {
        let mut network = NetworkComponent::new();
        let neuron = network.add_neuron();
        let force = &neuron.attributes().consumables()[0];
        assert!(force.write(&crate::core::values::TypedValue::new(1.0_f64)));

        network.update(&UpdateContext { time: 1 }).unwrap();
        assert_eq!(neuron.activation(), 1.0);
        network.update(&UpdateContext { time: 2 }).unwrap();
        assert_eq!(neuron.activation(), 0.0);
    }

    #[test]
    fn test_neuron_ids_and_removal() {
        let mut network = NetworkComponent::new();
        network.add_neuron();
        network.add_neuron();
        assert!(network.remove_neuron("Neuron_1"));
        let third = network.add_neuron();
        assert_eq!(third.id(), "Neuron_3");
        assert_eq!(network.attribute_containers().len(), 2);
        assert!(!network.remove_neuron("Neuron_1"));
    }

    #[test]
    fn test_preferred_consumer_is_force_set() {
        let neuron = Neuron::new("n");
        let preferred = neuron
            .attributes()
            .consumables()
            .iter()
            .max_by_key(|c| c.preference())
            .map(|c| c.name().to_string());
        assert_eq!(preferred.as_deref(), Some("forceSetActivation"));
    }

    #[test]
    fn test_save_and_restore() {
        let mut network = NetworkComponent::new().with_noise(0.0);
        let neuron = network.add_neuron();
        neuron.set_activation(0.5);
        neuron.set_clamped(true);

        let restored = NetworkComponent::restore(network.save().unwrap()).unwrap();
        let copy = restored.neuron("Neuron_1").unwrap();
        assert_eq!(copy.activation(), 0.5);
        assert!(copy.is_clamped());
        assert_eq!(restored.next_index, 2);
    }
}
