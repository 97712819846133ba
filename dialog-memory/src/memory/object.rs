//! Store over the generic value graph.

use std::sync::Arc;

use tracing::debug;

use super::{Memory, Shared};
use crate::error::Result;
use crate::resolver::{lookup, remove_path, set_path, Lookup};
use crate::value::Value;

#[derive(Debug, Default)]
struct State {
    root: Value,
    version: u64,
}

/// A view over a [`Value`] graph: maps, lists and reflected objects.
///
/// Failed writes leave the graph unchanged and are otherwise ignored, so a
/// mistyped path cannot corrupt state. Writes to read-only properties are the
/// exception and are reported. Deferred values are resolved against this
/// view wherever a read meets them: on the way down a path, at its end, and
/// inside the lists and dictionaries it returns.
///
/// The version is a counter bumped on every successful mutation.
#[derive(Debug, Clone, Default)]
pub struct ObjectMemory {
    state: Shared<State>,
}

impl ObjectMemory {
    /// Create a view over `root`.
    pub fn new(root: impl Into<Value>) -> Self {
        Self {
            state: Shared::new(State {
                root: root.into(),
                version: 0,
            }),
        }
    }

    /// An empty dictionary root.
    pub fn empty() -> Self {
        Self::new(Value::Map(Default::default()))
    }
}

impl Memory for ObjectMemory {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        let mut step = {
            let state = self.state.read();
            if state.root.is_null() {
                return None;
            }
            lookup(&state.root, path)?
        };
        // The lock is released so a binding may read this view again.
        loop {
            match step {
                Lookup::Found(value) => return Some(value.resolve(self)),
                Lookup::Deferred(deferred, rest) => {
                    step = lookup(&deferred.resolve(self), rest)?;
                }
            }
        }
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let mut state = self.state.write();
        if state.root.is_null() {
            debug!(path, "Ignoring write into a null root");
            return Ok(());
        }
        match set_path(&mut state.root, path, value) {
            Ok(()) => {
                state.version += 1;
                Ok(())
            }
            Err(e) if e.is_read_only() => Err(e),
            Err(e) => {
                debug!(path, error = %e, "Ignoring failed write");
                Ok(())
            }
        }
    }

    fn version(&self) -> String {
        self.state.read().version.to_string()
    }

    fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
        Arc::new(ObjectMemory::new(value))
    }

    fn serialize(&self, value: &Value) -> Result<String> {
        Ok(self.to_tree(value)?.to_string())
    }

    fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
        value.to_json()
    }

    fn set_root(&self, value: Value) -> Result<()> {
        let mut state = self.state.write();
        state.root = value;
        state.version += 1;
        Ok(())
    }

    fn remove_value(&self, path: &str) -> Result<bool> {
        let mut state = self.state.write();
        match remove_path(&mut state.root, path) {
            Ok(removed) => {
                if removed {
                    state.version += 1;
                }
                Ok(removed)
            }
            Err(e) if e.is_read_only() => Err(e),
            Err(e) => {
                debug!(path, error = %e, "Ignoring failed removal");
                Ok(false)
            }
        }
    }

    fn snapshot(&self) -> Value {
        let root = self.state.read().root.clone();
        root.resolve(self)
    }
}
