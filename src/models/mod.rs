//! Small reference components used by the demos and tests.

pub mod neuron;
pub mod plot;

pub use neuron::{NetworkComponent, Neuron, NeuronState};
pub use plot::{SeriesState, TimeSeries, TimeSeriesPlotComponent};

use crate::core::components::{Component, ComponentFactory};

/// Register the constructors of the built-in component kinds
pub fn register_builtin_components(factory: &mut ComponentFactory) {
    factory.register(NetworkComponent::KIND, |state| {
        Ok(Box::new(NetworkComponent::restore(state)?) as Box<dyn Component>)
    });
    factory.register(TimeSeriesPlotComponent::KIND, |state| {
        Ok(Box::new(TimeSeriesPlotComponent::restore(state)?) as Box<dyn Component>)
    });
}
