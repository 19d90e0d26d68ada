use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Runtime description of the Rust type carried across a coupling.
#[derive(Clone, Copy)]
pub struct ValueType {
    type_id: TypeId,
    type_name: &'static str,
}

impl ValueType {
    /// Describe the type `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether a consumer accepting `self` can take a value of type `other`.
    ///
    /// Only exact type identity qualifies; values are never coerced.
    pub fn is_assignable_from(&self, other: &ValueType) -> bool {
        self.type_id == other.type_id
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ValueType {}

impl std::hash::Hash for ValueType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.type_name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Type-erased but type-safe value read from a producer.
///
/// Cloning shares the underlying allocation, so every consumer fed from one
/// read observes the very same value.
#[derive(Clone)]
pub struct TypedValue {
    data: Arc<dyn Any + Send + Sync>,
    value_type: ValueType,
}

impl TypedValue {
    /// Create a new typed value
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            data: Arc::new(value),
            value_type: ValueType::of::<T>(),
        }
    }

    /// Get a reference to the contained value
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Clone the contained value out, if it has type `T`
    pub fn to_owned_value<T: Clone + 'static>(&self) -> Option<T> {
        self.get::<T>().cloned()
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Check if the contained value is of type T
    pub fn is_type<T: 'static>(&self) -> bool {
        self.value_type == ValueType::of::<T>()
    }

    /// Whether two values share one allocation (i.e. come from the same read)
    pub fn ptr_eq(&self, other: &TypedValue) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedValue")
            .field("type", &self.value_type.type_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_value_basic() {
        let value = TypedValue::new(42.5f64);
        assert_eq!(value.get::<f64>(), Some(&42.5));
        assert!(value.is_type::<f64>());
        assert!(!value.is_type::<f32>());
    }

    #[test]
    fn test_typed_value_type_mismatch() {
        let value = TypedValue::new(7i64);
        assert!(value.get::<String>().is_none());
        assert!(value.to_owned_value::<i32>().is_none());
        assert_eq!(value.to_owned_value::<i64>(), Some(7));
    }

    #[test]
    fn test_clones_share_allocation() {
        let value = TypedValue::new(vec![1.0f64, 2.0]);
        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(!value.ptr_eq(&TypedValue::new(vec![1.0f64, 2.0])));
    }

    #[test]
    fn test_assignability_is_exact() {
        let double = ValueType::of::<f64>();
        assert!(double.is_assignable_from(&ValueType::of::<f64>()));
        assert!(!double.is_assignable_from(&ValueType::of::<f32>()));
        assert!(!double.is_assignable_from(&ValueType::of::<i64>()));
        assert_eq!(double.to_string(), "f64");
    }
}
