use crate::core::attributes::{AttributeContainer, Attributes};
use crate::core::components::{Component, UpdateContext};
use crate::core::errors::ComponentError;
use parking_lot::Mutex;
use std::sync::Arc;

/// A container with one `f64` value, readable and writable, plus a `String` label
pub struct Cell {
    id: String,
    value: Arc<Mutex<f64>>,
    label: Arc<Mutex<String>>,
    attributes: Attributes,
}

impl Cell {
    pub fn new(id: &str, initial: f64) -> Arc<Self> {
        let value = Arc::new(Mutex::new(initial));
        let label = Arc::new(Mutex::new(String::new()));
        let (read, write) = (value.clone(), value.clone());
        let (read_label, write_label) = (label.clone(), label.clone());
        Arc::new(Self {
            id: id.to_string(),
            value,
            label,
            attributes: Attributes::builder()
                .producible("getValue", move || *read.lock())
                .producible("getLabel", move || read_label.lock().clone())
                .consumable("setValue", move |v: f64| *write.lock() = v)
                .with_preference(1)
                .consumable("setLabel", move |v: String| *write_label.lock() = v)
                .build(),
        })
    }

    pub fn value(&self) -> f64 {
        *self.value.lock()
    }

    pub fn set_value(&self, value: f64) {
        *self.value.lock() = value;
    }

    pub fn label(&self) -> String {
        self.label.lock().clone()
    }
}

impl AttributeContainer for Cell {
    fn container_id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Adds `step` to each of its cells per update and records the times it saw.
///
/// Can be told to fail or panic at a given time.
pub struct CellComponent {
    pub cells: Vec<Arc<Cell>>,
    pub step: f64,
    pub fail_at: Option<u64>,
    pub panic_at: Option<u64>,
    pub seen: Arc<Mutex<Vec<u64>>>,
}

impl CellComponent {
    pub fn new(cell_ids: &[&str], step: f64) -> Self {
        Self {
            cells: cell_ids.iter().map(|id| Cell::new(id, 0.0)).collect(),
            step,
            fail_at: None,
            panic_at: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_at(mut self, time: u64) -> Self {
        self.fail_at = Some(time);
        self
    }

    pub fn panicking_at(mut self, time: u64) -> Self {
        self.panic_at = Some(time);
        self
    }

    pub fn cell(&self, id: &str) -> Arc<Cell> {
        self.cells
            .iter()
            .find(|c| c.container_id() == id)
            .cloned()
            .unwrap()
    }
}

impl Component for CellComponent {
    fn kind(&self) -> &str {
        "Cells"
    }

    fn attribute_containers(&self) -> Vec<Arc<dyn AttributeContainer>> {
        self.cells
            .iter()
            .map(|c| c.clone() as Arc<dyn AttributeContainer>)
            .collect()
    }

    fn update(&mut self, ctx: &UpdateContext) -> Result<(), ComponentError> {
        self.seen.lock().push(ctx.time);
        if self.fail_at == Some(ctx.time) {
            return Err(format!("cells gave up at {}", ctx.time).into());
        }
        if self.panic_at == Some(ctx.time) {
            panic!("cells panicked at {}", ctx.time);
        }
        for cell in &self.cells {
            cell.set_value(cell.value() + self.step);
        }
        Ok(())
    }

    fn remove_attribute_container(&mut self, container_id: &str) -> bool {
        let before = self.cells.len();
        self.cells.retain(|c| c.container_id() != container_id);
        self.cells.len() != before
    }
}
