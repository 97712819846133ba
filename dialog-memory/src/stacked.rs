//! Layered views with innermost-first shadowing.
//!
//! A [`StackedMemory`] is an environment chain: reads try the innermost layer
//! first and fall back outward, so an inner binding shadows an outer one.
//! Stacks are read-only; writes must address a concrete view directly.
//!
//! ```
//! use dialog_memory::{Memory, StackedMemory, Value};
//! use serde_json::json;
//!
//! let mut stack = StackedMemory::new();
//! stack.push(json!({"x": 1}));
//! stack.push_local("x", Value::from(2));
//! assert_eq!(stack.try_get_value("x"), Some(Value::from(2)));
//!
//! stack.pop();
//! assert_eq!(stack.try_get_value("x"), Some(Value::from(1)));
//! ```

use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::memory::{IntoMemory, Memory, ObjectMemory};
use crate::path::enumerate;
use crate::value::Value;

/// Version reported by views that are not separately cacheable.
const UNVERSIONED: &str = "0";

/// An ordered stack of views read innermost-first.
///
/// Reading from an empty stack succeeds with null rather than missing.
#[derive(Debug, Clone, Default)]
pub struct StackedMemory {
    layers: Vec<Arc<dyn Memory>>,
}

impl StackedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new innermost layer.
    pub fn push(&mut self, memory: impl IntoMemory) {
        self.layers.push(memory.into_memory());
    }

    /// Remove and return the innermost layer.
    pub fn pop(&mut self) -> Option<Arc<dyn Memory>> {
        self.layers.pop()
    }

    /// Push a single `name = value` binding as the innermost layer.
    ///
    /// Paths continuing past `name` are resolved into `value` using the
    /// conventions of the current innermost layer.
    pub fn push_local(&mut self, name: impl Into<String>, value: Value) {
        let frame = LocalFrame::new(name, value, self.layers.last().cloned());
        self.layers.push(Arc::new(frame));
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn innermost(&self) -> Option<&Arc<dyn Memory>> {
        self.layers.last()
    }
}

impl FromIterator<Arc<dyn Memory>> for StackedMemory {
    /// Layers in push order: the last item is innermost.
    fn from_iter<I: IntoIterator<Item = Arc<dyn Memory>>>(iter: I) -> Self {
        Self {
            layers: iter.into_iter().collect(),
        }
    }
}

impl Memory for StackedMemory {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        if self.layers.is_empty() {
            return Some(Value::Null);
        }
        let found = self
            .layers
            .iter()
            .rev()
            .find_map(|layer| layer.try_get_value(path));
        if found.is_none() {
            trace!(path, layers = self.layers.len(), "Path not found in any layer");
        }
        found
    }

    fn set_value(&self, path: &str, _value: Value) -> Result<()> {
        Err(Error::read_only(format!("stacked memory (path '{}')", path)))
    }

    fn version(&self) -> String {
        UNVERSIONED.to_string()
    }

    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
        match self.innermost() {
            Some(layer) => layer.create_memory_from(value),
            None => Arc::new(ObjectMemory::new(value)),
        }
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        match self.innermost() {
            Some(layer) => layer.serialize(value),
            None => Ok(value.to_json()?.to_string()),
        }
    }

    fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
        match self.innermost() {
            Some(layer) => layer.to_tree(value),
            None => value.to_json(),
        }
    }
}

/// A one-variable scope, such as the current item of a loop.
///
/// A path whose first segment is exactly `name` reads `value`, or descends
/// into it for the rest of the path. Any other path misses.
#[derive(Debug, Clone)]
pub struct LocalFrame {
    name: String,
    value: Value,
    parent: Arc<dyn Memory>,
}

impl LocalFrame {
    /// Bind `name` to `value`.
    ///
    /// `parent` wraps `value` for nested lookups; without one the value is
    /// wrapped as an [`ObjectMemory`].
    pub fn new(name: impl Into<String>, value: Value, parent: Option<Arc<dyn Memory>>) -> Self {
        Self {
            name: name.into(),
            value,
            parent: parent.unwrap_or_else(|| Arc::new(ObjectMemory::empty())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Memory for LocalFrame {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        let first = enumerate(path).next()?;
        if first.is_index() || first.text() != self.name {
            return None;
        }
        let value = self.value.clone().resolve(self);
        if first.is_terminal() {
            return Some(value);
        }
        self.parent
            .create_memory_from(value)
            .try_get_value(first.rest(path))
    }

    fn set_value(&self, path: &str, _value: Value) -> Result<()> {
        Err(Error::read_only(format!("local '{}' (path '{}')", self.name, path)))
    }

    fn version(&self) -> String {
        UNVERSIONED.to_string()
    }

    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
        self.parent.create_memory_from(value)
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        self.parent.serialize(value)
    }

    fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
        self.parent.to_tree(value)
    }

    fn snapshot(&self) -> Value {
        let mut map = crate::value::Map::new();
        map.insert(self.name.clone(), self.value.clone().resolve(self));
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::JsonMemory;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_local_shadows_outer() {
        let mut stack = StackedMemory::new();
        stack.push(Value::from(json!({"x": 1, "y": "outer"})));
        stack.push_local("x", Value::from(2));

        assert_eq!(stack.try_get_value("x"), Some(Value::from(2)));
        assert_eq!(stack.try_get_value("y"), Some(Value::from("outer")));
        assert_eq!(stack.len(), 2);

        stack.pop();
        assert_eq!(stack.try_get_value("x"), Some(Value::from(1)));
    }

    #[test]
    fn test_empty_stack_reads_null() {
        // An empty stack answers every read with null instead of a miss.
        let stack = StackedMemory::new();
        assert!(stack.is_empty());
        assert_eq!(stack.try_get_value("anything"), Some(Value::Null));
        assert_eq!(stack.try_get_value(""), Some(Value::Null));
    }

    #[test]
    fn test_miss_in_every_layer() {
        let mut stack = StackedMemory::new();
        stack.push(json!({"a": 1}));
        stack.push(json!({"b": 2}));
        assert_eq!(stack.try_get_value("a"), Some(Value::from(1)));
        assert_eq!(stack.try_get_value("c"), None);
    }

    #[test]
    fn test_writes_always_fail() {
        let mut stack = StackedMemory::new();
        let inner = ObjectMemory::empty();
        stack.push(inner.clone());

        let err = stack.set_value("a", Value::from(1)).unwrap_err();
        assert!(err.is_read_only());
        assert_eq!(inner.try_get_value("a"), None);
        assert!(stack.set_root(Value::Null).is_err());
        assert!(StackedMemory::new().set_value("a", Value::Null).is_err());
    }

    #[test]
    fn test_version_is_constant() {
        let mut stack = StackedMemory::new();
        let inner = ObjectMemory::empty();
        stack.push(inner.clone());
        inner.set_value("a", Value::from(1)).unwrap();
        assert_eq!(stack.version(), "0");
    }

    #[test]
    fn test_local_descends_into_value() {
        let mut stack = StackedMemory::new();
        stack.push(json!({"items": []}));
        stack.push_local(
            "item",
            Value::from(json!({"Name": "tea", "sizes": ["s", "m"]})),
        );

        assert_eq!(stack.try_get_value("item.name"), Some(Value::from("tea")));
        assert_eq!(stack.try_get_value("item.sizes[1]"), Some(Value::from("m")));
        assert_eq!(stack.try_get_value("item['Name']"), Some(Value::from("tea")));
        assert_eq!(stack.try_get_value("item.missing"), None);
    }

    #[test]
    fn test_local_name_matches_exactly() {
        let mut stack = StackedMemory::new();
        stack.push(json!({"Item": "outer"}));
        stack.push_local("item", Value::from("inner"));

        assert_eq!(stack.try_get_value("item"), Some(Value::from("inner")));
        assert_eq!(stack.try_get_value("Item"), Some(Value::from("outer")));
        assert_eq!(stack.try_get_value("items"), None);
    }

    #[test]
    fn test_local_uses_innermost_conventions() {
        let mut stack = StackedMemory::new();
        stack.push(JsonMemory::new(json!({})));
        stack.push_local("row", Value::from(json!({"id": 1})));

        let nested = stack.create_memory_from(Value::from(json!({"k": 1})));
        assert_eq!(nested.version().len(), 64);
        assert_eq!(stack.try_get_value("row.id"), Some(Value::from(1)));
    }

    #[test]
    fn test_local_on_empty_stack() {
        let mut stack = StackedMemory::new();
        stack.push_local("n", Value::from(json!([1, 2, 3])));
        assert_eq!(stack.try_get_value("n[2]"), Some(Value::from(3)));
        assert_eq!(stack.try_get_value("m"), None);
    }

    #[test]
    fn test_nested_locals() {
        let mut stack = StackedMemory::new();
        stack.push(json!({}));
        stack.push_local("outer", Value::from(json!({"v": 1})));
        stack.push_local("inner", Value::from(json!({"v": 2})));

        assert_eq!(stack.try_get_value("outer.v"), Some(Value::from(1)));
        assert_eq!(stack.try_get_value("inner.v"), Some(Value::from(2)));
    }

    #[test]
    fn test_local_deferred_value() {
        let frame = LocalFrame::new("now", Value::deferred(|_| Value::from("later")), None);
        assert_eq!(frame.try_get_value("now"), Some(Value::from("later")));
        assert!(frame.set_value("now", Value::Null).is_err());
        assert_eq!(frame.name(), "now");
        assert!(matches!(frame.value(), Value::Deferred(_)));
    }

    #[test]
    fn test_local_deferred_nested() {
        let mut stack = StackedMemory::new();
        stack.push(json!({}));
        stack.push_local(
            "row",
            Value::deferred(|_| Value::from(json!({"id": 4, "tags": ["a"]}))),
        );

        assert_eq!(stack.try_get_value("row.id"), Some(Value::from(4)));
        assert_eq!(stack.try_get_value("row.tags[0]"), Some(Value::from("a")));
        assert_eq!(
            stack.try_get_value("row"),
            Some(Value::from(json!({"id": 4, "tags": ["a"]})))
        );
    }

    #[test]
    fn test_from_layers() {
        let layers: Vec<Arc<dyn Memory>> = vec![
            json!({"a": "outer"}).into_memory(),
            json!({"a": "inner"}).into_memory(),
        ];
        let stack: StackedMemory = layers.into_iter().collect();
        assert_eq!(stack.try_get_value("a"), Some(Value::from("inner")));
    }
}
