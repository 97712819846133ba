//! Memory views: path-addressable handles over backing values.
//!
//! This module provides:
//! - [`Memory`]: the contract every backing store satisfies
//! - [`ObjectMemory`]: a store over the generic [`Value`] graph that ignores
//!   failed writes
//! - [`JsonMemory`]: a store over a `serde_json::Value` tree that reports them
//! - [`AdapterRegistry`] and [`MemoryFactory`]: wrapping values and foreign
//!   types as views
//!
//! Views are cheap handles. Cloning one shares the backing value, so a write
//! through either clone is visible through both.

mod adapter;
mod json;
mod object;

pub use adapter::{AdapterRegistry, IntoMemory, MemoryFactory};
pub use json::JsonMemory;
pub use object::ObjectMemory;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::value::Value;

/// A path-addressable view over a backing value.
pub trait Memory: Send + Sync + fmt::Debug {
    /// Read the value at `path`. A miss is `None`, never an error.
    fn try_get_value(&self, path: &str) -> Option<Value>;

    /// Write `value` at `path`.
    ///
    /// Whether a failed navigation is reported or ignored depends on the
    /// store; read-only violations are always reported.
    fn set_value(&self, path: &str, value: Value) -> Result<()>;

    /// Fingerprint that changes whenever the content may have changed.
    fn version(&self) -> String;

    /// Wrap `value` as a new view following this store's conventions.
    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory>;

    /// Serialize `value` to a JSON string.
    fn serialize(&self, value: &Value) -> Result<String>;

    /// Convert `value` to a structured JSON tree.
    fn to_tree(&self, value: &Value) -> Result<serde_json::Value>;

    /// Replace the whole backing value.
    fn set_root(&self, _value: Value) -> Result<()> {
        Err(Error::read_only(std::any::type_name::<Self>()))
    }

    /// Remove the value at `path`, returning whether anything was removed.
    fn remove_value(&self, _path: &str) -> Result<bool> {
        Err(Error::read_only(std::any::type_name::<Self>()))
    }

    /// A copy of the whole backing value. Views without a single root
    /// return null.
    fn snapshot(&self) -> Value {
        Value::Null
    }
}

/// Typed conversion helpers available on every view.
pub trait MemoryExt: Memory {
    /// Convert `value` into `T` through this store's tree form.
    fn convert<T: DeserializeOwned>(&self, value: &Value) -> Result<T> {
        Ok(serde_json::from_value(self.to_tree(value)?)?)
    }

    /// Read the value at `path` as `T`.
    ///
    /// `Ok(None)` on a miss; an error when the value does not fit `T`.
    fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        self.try_get_value(path)
            .map(|value| self.convert(&value))
            .transpose()
    }
}

impl<M: Memory + ?Sized> MemoryExt for M {}

impl<M: Memory + ?Sized> Memory for Arc<M> {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        (**self).try_get_value(path)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        (**self).set_value(path, value)
    }

    fn version(&self) -> String {
        (**self).version()
    }

    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
        (**self).create_memory_from(value)
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        (**self).serialize(value)
    }

    fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
        (**self).to_tree(value)
    }

    fn set_root(&self, value: Value) -> Result<()> {
        (**self).set_root(value)
    }

    fn remove_value(&self, path: &str) -> Result<bool> {
        (**self).remove_value(path)
    }

    fn snapshot(&self) -> Value {
        (**self).snapshot()
    }
}

/// Shared, lock-protected backing state for a view.
///
/// A poisoned lock is recovered: every update leaves the state consistent
/// before it can panic.
#[derive(Debug, Default)]
pub(crate) struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u32,
        items: Vec<String>,
    }

    #[test]
    fn test_convert_through_tree() {
        let memory = ObjectMemory::new(Value::from(json!({
            "order": {"id": 3, "items": ["tea"]}
        })));
        let order: Order = memory
            .get_as("order")
            .unwrap()
            .expect("order should resolve");
        assert_eq!(order, Order { id: 3, items: vec!["tea".into()] });

        let missing: Option<Order> = memory.get_as("nothing").unwrap();
        assert!(missing.is_none());
        assert!(memory.get_as::<Order>("order.items").is_err());
    }

    #[test]
    fn test_arc_dyn_memory_delegates() {
        let memory: Arc<dyn Memory> = Arc::new(JsonMemory::new(json!({"a": 1})));
        memory.set_value("a", Value::from(2)).unwrap();
        assert_eq!(memory.try_get_value("a"), Some(Value::from(2)));
        let n: i64 = memory.convert(&Value::from(5)).unwrap();
        assert_eq!(n, 5);
    }
}
