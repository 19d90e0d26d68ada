use crate::core::types::ContainerKey;
use crate::core::values::{TypedValue, ValueType};
use std::fmt;

/// Direction of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Readable; the source side of a coupling
    Producible,
    /// Writable; the target side of a coupling
    Consumable,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Producible => f.write_str("producible"),
            AttributeKind::Consumable => f.write_str("consumable"),
        }
    }
}

type Getter = Box<dyn Fn() -> TypedValue + Send + Sync>;
type Setter = Box<dyn Fn(&TypedValue) -> bool + Send + Sync>;

/// A declared, readable accessor
pub struct Producible {
    name: String,
    value_type: ValueType,
    preference: i32,
    getter: Getter,
}

impl Producible {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Weight used when auto-coupling two containers
    pub fn preference(&self) -> i32 {
        self.preference
    }

    pub(crate) fn read(&self) -> TypedValue {
        (self.getter)()
    }
}

impl fmt::Debug for Producible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producible")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// A declared, writable accessor
pub struct Consumable {
    name: String,
    value_type: ValueType,
    preference: i32,
    setter: Setter,
}

impl Consumable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Weight used when auto-coupling two containers
    pub fn preference(&self) -> i32 {
        self.preference
    }

    /// Returns false if `value` is not of the declared type
    pub(crate) fn write(&self, value: &TypedValue) -> bool {
        (self.setter)(value)
    }
}

impl fmt::Debug for Consumable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumable")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// The fixed set of accessors an attribute container exposes.
///
/// Declared once, when the container is constructed. Coupling code only ever
/// binds to accessors listed here.
#[derive(Debug)]
pub struct Attributes {
    key: ContainerKey,
    producibles: Vec<Producible>,
    consumables: Vec<Consumable>,
}

impl Attributes {
    pub fn builder() -> AttributesBuilder {
        AttributesBuilder::default()
    }

    /// Identity of the container these attributes belong to
    pub fn key(&self) -> ContainerKey {
        self.key
    }

    pub fn producibles(&self) -> &[Producible] {
        &self.producibles
    }

    pub fn consumables(&self) -> &[Consumable] {
        &self.consumables
    }

    /// Position of the first producible named `name`
    pub fn producible_index(&self, name: &str) -> Option<usize> {
        self.producibles.iter().position(|p| p.name == name)
    }

    /// Position of the first consumable named `name`
    pub fn consumable_index(&self, name: &str) -> Option<usize> {
        self.consumables.iter().position(|c| c.name == name)
    }
}

/// Builder for [`Attributes`]
#[derive(Default)]
pub struct AttributesBuilder {
    producibles: Vec<Producible>,
    consumables: Vec<Consumable>,
    last: Option<AttributeKind>,
}

impl AttributesBuilder {
    /// Declare a readable accessor of type `T`
    pub fn producible<T, F>(mut self, name: &str, getter: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.producibles.push(Producible {
            name: name.to_string(),
            value_type: ValueType::of::<T>(),
            preference: 0,
            getter: Box::new(move || TypedValue::new(getter())),
        });
        self.last = Some(AttributeKind::Producible);
        self
    }

    /// Declare a writable accessor of type `T`
    pub fn consumable<T, F>(mut self, name: &str, setter: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.consumables.push(Consumable {
            name: name.to_string(),
            value_type: ValueType::of::<T>(),
            preference: 0,
            setter: Box::new(move |value: &TypedValue| match value.to_owned_value::<T>() {
                Some(v) => {
                    setter(v);
                    true
                }
                None => false,
            }),
        });
        self.last = Some(AttributeKind::Consumable);
        self
    }

    /// Set the auto-coupling preference of the accessor declared last
    pub fn with_preference(mut self, preference: i32) -> Self {
        match self.last {
            Some(AttributeKind::Producible) => {
                if let Some(p) = self.producibles.last_mut() {
                    p.preference = preference;
                }
            }
            Some(AttributeKind::Consumable) => {
                if let Some(c) = self.consumables.last_mut() {
                    c.preference = preference;
                }
            }
            None => {}
        }
        self
    }

    pub fn build(self) -> Attributes {
        Attributes {
            key: ContainerKey::new(),
            producibles: self.producibles,
            consumables: self.consumables,
        }
    }
}

/// An object inside a component whose attributes can be coupled.
pub trait AttributeContainer: Send + Sync + 'static {
    /// Id unique within the owning component; used for lookup and persistence
    fn container_id(&self) -> &str;

    /// The accessors declared at construction
    fn attributes(&self) -> &Attributes;

    fn key(&self) -> ContainerKey {
        self.attributes().key()
    }
}
