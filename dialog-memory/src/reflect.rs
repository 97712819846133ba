//! Reflected property access for typed objects.
//!
//! A typed object joins the generic object graph by implementing [`Reflect`],
//! normally through `#[derive(Reflect)]`. Conformance is declared at compile
//! time; nothing probes a type for a shape at runtime.
//!
//! ```
//! use dialog_memory::{ObjectMemory, Memory, Reflect, Value};
//!
//! #[derive(Debug, Clone, Reflect)]
//! struct Profile {
//!     name: String,
//!     #[reflect(read_only)]
//!     id: u64,
//! }
//!
//! let memory = ObjectMemory::new(Value::object(Profile { name: "Ada".into(), id: 7 }));
//! assert_eq!(memory.try_get_value("NAME"), Some(Value::from("Ada")));
//! assert!(memory.set_value("id", Value::from(8)).is_err());
//! ```

use std::any::Any;
use std::fmt;

use crate::error::Result;
use crate::value::{eq_ignore_case, Map, Value};

pub use dialog_memory_derive::Reflect;

/// Metadata for one reflected property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    /// Property name as exposed to paths
    pub name: &'static str,
    /// Whether paths may assign it
    pub writable: bool,
}

impl Property {
    pub const fn new(name: &'static str, writable: bool) -> Self {
        Self { name, writable }
    }
}

/// Property access for a typed object.
///
/// `get` and `set` take the exact property name from [`properties`];
/// case-insensitive matching happens in [`find_property`].
///
/// `set` does not consult [`Property::writable`]. Path resolution checks it
/// before a terminal assignment, and uses `set` unconditionally to write back
/// a nested value it navigated through.
///
/// [`properties`]: Reflect::properties
/// [`find_property`]: Reflect::find_property
pub trait Reflect: Send + Sync + fmt::Debug + Any {
    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// All exposed properties.
    fn properties(&self) -> &'static [Property];

    /// Read a property by exact name.
    fn get(&self, name: &str) -> Option<Value>;

    /// Assign a property by exact name.
    fn set(&mut self, name: &str, value: Value) -> Result<()>;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn Reflect>;

    /// Upcast for downcasting back to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Find a property by name, exact match first, then ignoring case.
    fn find_property(&self, name: &str) -> Option<&'static Property> {
        let properties = self.properties();
        properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| properties.iter().find(|p| eq_ignore_case(p.name, name)))
    }

    /// Snapshot of all readable properties.
    fn to_map(&self) -> Map {
        self.properties()
            .iter()
            .filter_map(|p| self.get(p.name).map(|v| (p.name.to_string(), v)))
            .collect()
    }
}

impl Clone for Box<dyn Reflect> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl dyn Reflect {
    /// Downcast to a concrete type.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
