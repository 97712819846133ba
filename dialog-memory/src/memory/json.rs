//! Store over a structured JSON tree.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::{Memory, ObjectMemory, Shared};
use crate::error::Result;
use crate::resolver::{remove_path, set_path, try_get_path};
use crate::value::Value;

/// A view over a `serde_json::Value` tree.
///
/// Unlike [`ObjectMemory`], every failed write is reported: an out-of-range
/// index, a missing intermediate key, or a type mismatch along the path.
/// Object keys are matched exactly first, then ignoring case.
///
/// The version is a SHA-256 fingerprint of the tree, so two views over equal
/// content report the same version.
#[derive(Debug, Clone, Default)]
pub struct JsonMemory {
    root: Shared<serde_json::Value>,
}

impl JsonMemory {
    /// Create a view over `root`.
    pub fn new(root: serde_json::Value) -> Self {
        Self {
            root: Shared::new(root),
        }
    }

    /// Parse `text` as JSON and create a view over it.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// A copy of the backing tree.
    pub fn tree(&self) -> serde_json::Value {
        self.root.read().clone()
    }
}

impl From<serde_json::Value> for JsonMemory {
    fn from(root: serde_json::Value) -> Self {
        Self::new(root)
    }
}

impl Memory for JsonMemory {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        try_get_path(&*self.root.read(), path).map(Value::from)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let value = value.to_json()?;
        set_path(&mut *self.root.write(), path, value)
    }

    fn version(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.root.read().to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
        match value.to_json() {
            Ok(tree) => Arc::new(JsonMemory::new(tree)),
            Err(_) => Arc::new(ObjectMemory::new(value)),
        }
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(serde_json::to_string(&value.to_json()?)?)
    }

    fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
        value.to_json()
    }

    fn set_root(&self, value: Value) -> Result<()> {
        let tree = value.to_json()?;
        *self.root.write() = tree;
        Ok(())
    }

    fn remove_value(&self, path: &str) -> Result<bool> {
        remove_path(&mut *self.root.write(), path)
    }

    fn snapshot(&self) -> Value {
        Value::from(self.tree())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scenario() -> JsonMemory {
        JsonMemory::new(json!({"a": [10, 20], "b": {"C": 5}}))
    }

    #[test]
    fn test_scenario() {
        let memory = scenario();
        assert_eq!(memory.try_get_value("a[1]"), Some(Value::from(20)));
        assert_eq!(memory.try_get_value("a[2]"), None);
        assert_eq!(memory.try_get_value("b.c"), Some(Value::from(5)));

        memory.set_value("a[2]", Value::from(30)).unwrap();
        assert_eq!(memory.tree()["a"], json!([10, 20, 30]));

        let err = memory.set_value("b.c.d", Value::from(1)).unwrap_err();
        assert!(matches!(err, Error::NotAnObject { .. }));
        assert_eq!(memory.tree()["b"], json!({"C": 5}));
    }

    #[test]
    fn test_write_failures_propagate() {
        let memory = scenario();
        assert!(matches!(
            memory.set_value("a[9]", Value::from(1)),
            Err(Error::IndexOutOfRange { index: 9, len: 2, .. })
        ));
        assert!(matches!(
            memory.set_value("x.y", Value::from(1)),
            Err(Error::PathNotFound { .. })
        ));
        assert!(matches!(
            memory.set_value("b[0]", Value::from(1)),
            Err(Error::NotAList { .. })
        ));
        assert!(matches!(
            memory.set_value("a", Value::deferred(|_| Value::Null)),
            Err(Error::UnsupportedConversion(_))
        ));
    }

    #[test]
    fn test_key_write_keeps_existing_casing() {
        let memory = scenario();
        memory.set_value("b.c", Value::from(6)).unwrap();
        assert_eq!(memory.tree()["b"], json!({"C": 6}));
    }

    #[test]
    fn test_version_is_content_fingerprint() {
        let a = scenario();
        let b = scenario();
        assert_eq!(a.version(), b.version());
        assert_eq!(a.version().len(), 64);

        let before = a.version();
        a.set_value("a[0]", Value::from(11)).unwrap();
        assert_ne!(a.version(), before);

        a.set_value("a[0]", Value::from(10)).unwrap();
        assert_eq!(a.version(), before);
    }

    #[test]
    fn test_parse_and_remove() {
        let memory = JsonMemory::parse(r#"{"items": ["x", "y"], "k": 1}"#).unwrap();
        assert!(memory.remove_value("items[0]").unwrap());
        assert!(memory.remove_value("K").unwrap());
        assert_eq!(memory.tree(), json!({"items": ["y"]}));
        assert!(memory.remove_value("nothing.here").is_err());

        assert!(matches!(
            JsonMemory::parse("{not json"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_create_memory_from() {
        let memory = scenario();
        let nested = memory.create_memory_from(memory.try_get_value("b").unwrap());
        assert_eq!(nested.try_get_value("C"), Some(Value::from(5)));
        assert!(nested.set_value("z.z", Value::from(1)).is_err());

        let deferred = memory.create_memory_from(Value::deferred(|_| Value::Null));
        assert_eq!(deferred.version(), "0");
    }

    #[test]
    fn test_set_root_and_snapshot() {
        let memory = scenario();
        memory.set_root(Value::from(json!({"fresh": true}))).unwrap();
        assert_eq!(memory.snapshot(), json!({"fresh": true}));
    }
}
