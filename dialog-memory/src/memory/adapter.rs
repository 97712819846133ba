//! Wrapping values and foreign types as memory views.
//!
//! Types known at compile time convert through [`IntoMemory`]. Types only
//! known at runtime go through [`MemoryFactory::create`], which handles the
//! crate's own value types and otherwise consults the process-wide
//! [`AdapterRegistry`], keyed by `TypeId`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use tracing::debug;

use super::{JsonMemory, Memory, ObjectMemory};
use crate::value::Value;

type Factory = Arc<dyn Fn(&dyn Any) -> Option<Arc<dyn Memory>> + Send + Sync>;

static GLOBAL: LazyLock<AdapterRegistry> = LazyLock::new(AdapterRegistry::new);

/// Registry of adapter factories turning foreign objects into views.
///
/// Safe to share between threads; registration and lookup may race freely.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: RwLock<HashMap<TypeId, (&'static str, Factory)>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static AdapterRegistry {
        &GLOBAL
    }

    /// Register the adapter for `T`, replacing any earlier one.
    pub fn register<T, F>(&self, adapter: F)
    where
        T: Any,
        F: Fn(&T) -> Arc<dyn Memory> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move |object: &dyn Any| object.downcast_ref::<T>().map(&adapter));
        let name = std::any::type_name::<T>();
        let replaced = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), (name, factory))
            .is_some();
        if replaced {
            debug!(type_name = name, "Replaced memory adapter");
        }
    }

    /// Remove the adapter for `T`. Returns whether one was registered.
    pub fn unregister<T: Any>(&self) -> bool {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&TypeId::of::<T>())
            .is_some()
    }

    /// Whether an adapter is registered for `T`.
    pub fn contains<T: Any>(&self) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Adapt `object` with the adapter registered for its concrete type.
    pub fn create(&self, object: &dyn Any) -> Option<Arc<dyn Memory>> {
        // Clone the factory out so the adapter runs without the lock held.
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&object.type_id())
            .map(|(_, factory)| Arc::clone(factory))?;
        factory(object)
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = factories.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &names)
            .finish()
    }
}

/// Runtime conversion of arbitrary objects to views.
pub struct MemoryFactory;

impl MemoryFactory {
    /// Wrap `object` as a view.
    ///
    /// Views, [`Value`]s and JSON trees are handled directly; anything else
    /// needs an adapter in the global registry.
    pub fn create(object: &dyn Any) -> Option<Arc<dyn Memory>> {
        if let Some(memory) = object.downcast_ref::<Arc<dyn Memory>>() {
            return Some(Arc::clone(memory));
        }
        if let Some(value) = object.downcast_ref::<Value>() {
            return Some(Arc::new(ObjectMemory::new(value.clone())));
        }
        if let Some(tree) = object.downcast_ref::<serde_json::Value>() {
            return Some(Arc::new(JsonMemory::new(tree.clone())));
        }
        let memory = AdapterRegistry::global().create(object);
        if memory.is_none() {
            debug!("No memory adapter for object");
        }
        memory
    }
}

/// Compile-time conversion to a view.
pub trait IntoMemory {
    fn into_memory(self) -> Arc<dyn Memory>;
}

impl IntoMemory for Arc<dyn Memory> {
    fn into_memory(self) -> Arc<dyn Memory> {
        self
    }
}

impl IntoMemory for Value {
    fn into_memory(self) -> Arc<dyn Memory> {
        Arc::new(ObjectMemory::new(self))
    }
}

impl IntoMemory for serde_json::Value {
    fn into_memory(self) -> Arc<dyn Memory> {
        Arc::new(JsonMemory::new(self))
    }
}

impl IntoMemory for ObjectMemory {
    fn into_memory(self) -> Arc<dyn Memory> {
        Arc::new(self)
    }
}

impl IntoMemory for JsonMemory {
    fn into_memory(self) -> Arc<dyn Memory> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use serde_json::json;

    /// A foreign key-value store exposed through an adapter.
    #[derive(Debug, Clone)]
    struct Settings {
        entries: Vec<(String, String)>,
    }

    #[derive(Debug)]
    struct SettingsMemory(Settings);

    impl Memory for SettingsMemory {
        fn try_get_value(&self, path: &str) -> Option<Value> {
            self.0
                .entries
                .iter()
                .find(|(k, _)| k == path)
                .map(|(_, v)| Value::from(v.as_str()))
        }

        fn set_value(&self, path: &str, _value: Value) -> Result<()> {
            Err(crate::Error::read_only(path))
        }

        fn version(&self) -> String {
            "static".to_string()
        }

        fn create_memory_from(&self, value: Value) -> Arc<dyn Memory> {
            Arc::new(ObjectMemory::new(value))
        }

        fn serialize(&self, value: &Value) -> Result<String> {
            Ok(value.to_json()?.to_string())
        }

        fn to_tree(&self, value: &Value) -> Result<serde_json::Value> {
            value.to_json()
        }
    }

    fn settings() -> Settings {
        Settings {
            entries: vec![("region".to_string(), "eu".to_string())],
        }
    }

    #[test]
    fn test_register_and_create() {
        let registry = AdapterRegistry::new();
        assert!(registry.create(&settings()).is_none());

        registry.register::<Settings, _>(|s: &Settings| {
            Arc::new(SettingsMemory(s.clone())) as Arc<dyn Memory>
        });
        assert!(registry.contains::<Settings>());

        let memory = registry.create(&settings()).unwrap();
        assert_eq!(memory.try_get_value("region"), Some(Value::from("eu")));
        assert!(registry.create(&42u8).is_none());

        assert!(registry.unregister::<Settings>());
        assert!(!registry.contains::<Settings>());
    }

    #[test]
    fn test_factory_handles_builtin_types() {
        let tree = json!({"a": 1});
        let memory = MemoryFactory::create(&tree).unwrap();
        assert_eq!(memory.try_get_value("a"), Some(Value::from(1)));
        assert_eq!(memory.version().len(), 64);

        let value = Value::from(json!({"b": 2}));
        let memory = MemoryFactory::create(&value).unwrap();
        assert_eq!(memory.version(), "0");

        let shared: Arc<dyn Memory> = Arc::new(ObjectMemory::empty());
        let memory = MemoryFactory::create(&shared).unwrap();
        memory.set_value("x", Value::from(1)).unwrap();
        assert_eq!(shared.try_get_value("x"), Some(Value::from(1)));

        assert!(MemoryFactory::create(&"plain string").is_none());
    }

    #[test]
    fn test_concurrent_first_use() {
        #[derive(Debug)]
        struct Marker(usize);

        let registry = AdapterRegistry::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    registry.register::<Marker, _>(|m: &Marker| {
                        Arc::new(ObjectMemory::new(Value::from(m.0))) as Arc<dyn Memory>
                    });
                    let memory = registry.create(&Marker(i)).unwrap();
                    assert!(memory.snapshot() == Value::from(i));
                });
            }
        });
        assert!(registry.contains::<Marker>());
    }

    #[test]
    fn test_into_memory() {
        let memory = json!({"k": "v"}).into_memory();
        assert_eq!(memory.try_get_value("K"), Some(Value::from("v")));

        let memory = Value::from(json!([1, 2])).into_memory();
        assert_eq!(memory.try_get_value("[1]"), Some(Value::from(2)));

        let again = Arc::clone(&memory).into_memory();
        assert!(Arc::ptr_eq(&memory, &again));
    }

    #[test]
    fn test_debug_lists_adapters() {
        let registry = AdapterRegistry::new();
        registry.register::<Settings, _>(|s: &Settings| {
            Arc::new(SettingsMemory(s.clone())) as Arc<dyn Memory>
        });
        assert!(format!("{:?}", registry).contains("Settings"));
    }
}
