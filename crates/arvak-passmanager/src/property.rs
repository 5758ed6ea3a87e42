//! `PropertySet`: the shared state threaded through every task of a run.
//!
//! Tasks never talk to each other directly. Whatever one task learns about
//! the IR (a depth, a fixed-point flag, a layout) it writes into the
//! [`PropertySet`], and later tasks as well as the predicates of enclosing
//! flow controllers read it back from there.
//!
//! # Examples
//!
//! ## Keyed values
//!
//! ```
//! use arvak_passmanager::PropertySet;
//!
//! let mut props = PropertySet::new().with("optimization_level", 2);
//! props.set("fixed_point", false);
//!
//! assert_eq!(props.get_as::<u8>("optimization_level").unwrap(), Some(2));
//! assert_eq!(props.get("fixed_point"), Some(&serde_json::json!(false)));
//! assert!(props.get("layout").is_none());
//! ```
//!
//! ## Typed slots for values that are not plain data
//!
//! ```
//! use arvak_passmanager::PropertySet;
//!
//! #[derive(Debug, PartialEq)]
//! struct DepthHistory(Vec<usize>);
//!
//! let mut props = PropertySet::new();
//! props.insert_typed(DepthHistory(vec![12, 9]));
//!
//! props.get_typed_mut::<DepthHistory>().unwrap().0.push(9);
//! assert_eq!(props.get_typed::<DepthHistory>(), Some(&DepthHistory(vec![12, 9, 9])));
//! ```

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};

use crate::error::{PassManagerError, PassResult};

/// Key/value store shared between the tasks of one pipeline run.
///
/// Values are stored as [`serde_json::Value`] under string keys. Data that
/// does not serialize (caches, handles, rich analysis results) goes into
/// the type-keyed slots instead, where each type holds at most one value.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// String-keyed properties.
    values: FxHashMap<String, Value>,

    /// Custom properties storage (type-erased).
    custom: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property and return the updated set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, returning the value it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Get a property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a property decoded into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the
    /// stored value does not have the shape of `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> PassResult<Option<T>> {
        self.values
            .get(key)
            .map(|value| {
                T::deserialize(value).map_err(|e| PassManagerError::Property {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Check whether a property is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Iterate over the keyed properties in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keyed properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no keyed property is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert a custom property.
    pub fn insert_typed<T: Any + Send + Sync>(&mut self, value: T) {
        self.custom.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a custom property.
    pub fn get_typed<T: Any>(&self) -> Option<&T> {
        self.custom
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Get a mutable custom property.
    pub fn get_typed_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.custom
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Remove a custom property.
    pub fn remove_typed<T: Any>(&mut self) -> Option<T> {
        self.custom
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_replaces_value() {
        let mut props = PropertySet::new();
        assert_eq!(props.set("x", 1), None);
        assert_eq!(props.set("x", 2), Some(json!(1)));
        assert_eq!(props.get("x"), Some(&json!(2)));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_get_as_type_mismatch() {
        let props = PropertySet::new().with("x", "not a number");
        let err = props.get_as::<i64>("x").unwrap_err();
        assert!(matches!(err, PassManagerError::Property { ref key, .. } if key == "x"));
        assert_eq!(props.get_as::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let mut props = PropertySet::new().with("fixed_point", true);
        assert!(props.contains_key("fixed_point"));
        assert_eq!(props.remove("fixed_point"), Some(json!(true)));
        assert!(props.is_empty());
    }

    #[test]
    #[allow(clippy::items_after_statements)]
    fn test_property_set_custom() {
        let mut props = PropertySet::new();

        #[derive(Debug, PartialEq)]
        struct CustomData(i32);

        props.insert_typed(CustomData(42));
        assert_eq!(props.get_typed::<CustomData>(), Some(&CustomData(42)));

        let removed = props.remove_typed::<CustomData>();
        assert_eq!(removed, Some(CustomData(42)));
        assert_eq!(props.get_typed::<CustomData>(), None);
    }
}
