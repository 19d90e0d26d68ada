use crate::core::attributes::{AttributeContainer, Attributes};
use crate::core::components::{Component, UpdateContext};
use crate::core::errors::ComponentError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesState {
    pub id: String,
    pub value: f64,
    pub samples: Vec<(u64, f64)>,
}

/// One line of a [`TimeSeriesPlotComponent`]; consumes `setValue: f64`
pub struct TimeSeries {
    id: String,
    state: Arc<Mutex<SeriesState>>,
    attributes: Attributes,
}

impl TimeSeries {
    pub fn new(id: &str) -> Arc<Self> {
        Self::from_state(SeriesState {
            id: id.to_string(),
            ..SeriesState::default()
        })
    }

    pub fn from_state(state: SeriesState) -> Arc<Self> {
        let id = state.id.clone();
        let state = Arc::new(Mutex::new(state));
        let set = state.clone();
        let attributes = Attributes::builder()
            .consumable("setValue", move |v: f64| set.lock().value = v)
            .build();
        Arc::new(Self { id, state, attributes })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The value the next sample will record
    pub fn value(&self) -> f64 {
        self.state.lock().value
    }

    /// Recorded (time, value) pairs
    pub fn samples(&self) -> Vec<(u64, f64)> {
        self.state.lock().samples.clone()
    }

    fn record(&self, time: u64) {
        let mut state = self.state.lock();
        let value = state.value;
        state.samples.push((time, value));
    }
}

impl AttributeContainer for TimeSeries {
    fn container_id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Records one sample per series on every update
pub struct TimeSeriesPlotComponent {
    series: Vec<Arc<TimeSeries>>,
}

impl TimeSeriesPlotComponent {
    pub const KIND: &'static str = "TimeSeriesPlot";

    /// A plot with `count` series named `Series_1`, `Series_2`, ...
    pub fn new(count: usize) -> Self {
        Self {
            series: (1..=count).map(|i| TimeSeries::new(&format!("Series_{}", i))).collect(),
        }
    }

    pub fn series(&self) -> &[Arc<TimeSeries>] {
        &self.series
    }

    pub fn add_series(&mut self) -> Arc<TimeSeries> {
        let mut n = self.series.len() + 1;
        while self.series.iter().any(|s| s.id() == format!("Series_{}", n)) {
            n += 1;
        }
        let series = TimeSeries::new(&format!("Series_{}", n));
        self.series.push(series.clone());
        series
    }

    pub fn restore(state: serde_json::Value) -> Result<Self, ComponentError> {
        let series: Vec<SeriesState> = serde_json::from_value(state)?;
        Ok(Self {
            series: series.into_iter().map(TimeSeries::from_state).collect(),
        })
    }
}

impl Component for TimeSeriesPlotComponent {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn attribute_containers(&self) -> Vec<Arc<dyn AttributeContainer>> {
        self.series
            .iter()
            .map(|s| s.clone() as Arc<dyn AttributeContainer>)
            .collect()
    }

    fn update(&mut self, ctx: &UpdateContext) -> Result<(), ComponentError> {
        for series in &self.series {
            series.record(ctx.time);
        }
        Ok(())
    }

    fn remove_attribute_container(&mut self, container_id: &str) -> bool {
        let before = self.series.len();
        self.series.retain(|s| s.id() != container_id);
        self.series.len() != before
    }

    fn save(&self) -> Result<serde_json::Value, ComponentError> {
        let series: Vec<SeriesState> = self.series.iter().map(|s| s.state.lock().clone()).collect();
        Ok(serde_json::to_value(series)?)
    }
}
