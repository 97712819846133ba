//! Core value types: Value, Map, Deferred.

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::memory::Memory;
use crate::reflect::Reflect;

/// Dictionary-backed object: ordered, keyed by string.
pub type Map = BTreeMap<String, Value>;

/// Maximum chain of deferred values resolved for a single read.
const MAX_DEFERRED_DEPTH: usize = 16;

/// A value in the generic object graph.
///
/// Lists and maps are held inline; typed objects are held behind the
/// [`Reflect`] capability so they can be addressed by property name.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer or floating point number
    Number(Number),
    /// String
    String(String),
    /// Indexable list
    List(Vec<Value>),
    /// Dictionary
    Map(Map),
    /// Typed object exposing reflected properties
    Object(Box<dyn Reflect>),
    /// Value computed on read from the view that resolved it
    Deferred(Deferred),
}

type Binder = dyn Fn(&dyn Memory) -> Value + Send + Sync;

/// Lazily bound value.
///
/// Holds a function evaluated against the memory view that completed the
/// read, so a property can be defined in terms of other data in the same
/// root. Reads resolve it before returning; it never escapes a lookup.
#[derive(Clone)]
pub struct Deferred(Arc<Binder>);

impl Deferred {
    /// Create a deferred value from a binding function.
    pub fn new(bind: impl Fn(&dyn Memory) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(bind))
    }

    /// Evaluate against a memory view.
    pub fn resolve(&self, memory: &dyn Memory) -> Value {
        (self.0)(memory)
    }

    /// Whether both handles share the same binding function.
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl Value {
    /// Wrap a typed object.
    pub fn object(object: impl Reflect) -> Self {
        Value::Object(Box::new(object))
    }

    /// Create a deferred value.
    pub fn deferred(bind: impl Fn(&dyn Memory) -> Value + Send + Sync + 'static) -> Self {
        Value::Deferred(Deferred::new(bind))
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Deferred(_) => "deferred",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Resolve every deferred value in this value against `memory`.
    ///
    /// Lists and dictionaries are resolved element by element, so the result
    /// holds no deferred value outside typed objects. A deferred value that
    /// yields another deferred value is resolved again, up to a fixed depth
    /// after which the result is null.
    pub fn resolve(self, memory: &dyn Memory) -> Value {
        match self.resolve_chain(memory) {
            Value::List(items) => {
                Value::List(items.into_iter().map(|v| v.resolve(memory)).collect())
            }
            Value::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, v.resolve(memory)))
                    .collect(),
            ),
            resolved => resolved,
        }
    }

    fn resolve_chain(self, memory: &dyn Memory) -> Value {
        let mut current = self;
        for _ in 0..MAX_DEFERRED_DEPTH {
            match current {
                Value::Deferred(deferred) => current = deferred.resolve(memory),
                resolved => return resolved,
            }
        }
        tracing::warn!(
            "Deferred value chain exceeded {} levels, treating as null",
            MAX_DEFERRED_DEPTH
        );
        Value::Null
    }

    /// Convert to a structured JSON tree.
    ///
    /// Typed objects become JSON objects of their properties. Deferred values
    /// have no tree form.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<serde_json::Map<_, _>>>()?,
            ),
            Value::Object(object) => Value::Map(object.to_map()).to_json()?,
            Value::Deferred(_) => {
                return Err(Error::UnsupportedConversion(
                    "deferred value has no tree form".to_string(),
                ))
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.type_name() == b.type_name() && a.to_map() == b.to_map()
            }
            (Value::Deferred(a), Value::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        *self == Value::from(other.clone())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{}", json),
            Err(_) => f.write_str("<deferred>"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => serialize_map(map, serializer),
            Value::Object(object) => serialize_map(&object.to_map(), serializer),
            Value::Deferred(_) => Err(S::Error::custom("deferred values cannot be serialized")),
        }
    }
}

fn serialize_map<S: Serializer>(map: &Map, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut out = serializer.serialize_map(Some(map.len()))?;
    for (key, value) in map {
        out.serialize_entry(key, value)?;
    }
    out.end()
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}
