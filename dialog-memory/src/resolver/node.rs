//! The capabilities path resolution needs from a value graph.

use std::borrow::Cow;

use crate::error::Error;
use crate::value::{find_key, Value};

/// Why a keyed write or removal failed.
#[derive(Debug)]
pub enum KeyWriteError {
    /// The target is neither a dictionary nor an object
    NotKeyed,
    /// Typed objects do not gain new properties
    UnknownProperty,
    /// The property exists but cannot be assigned; carries a display name
    ReadOnly(String),
    /// The property rejected the value
    Rejected(Error),
}

/// A node in a value graph that paths can walk.
///
/// Lists are `Vec`s of the same node type. Keyed nodes are dictionaries or
/// typed objects; name lookups match exactly first, then ignoring case.
pub trait PathNode: Clone {
    /// The elements, if this node is list-like.
    fn as_list(&self) -> Option<&[Self]>;

    /// Mutable elements, if this node is list-like.
    fn as_list_mut(&mut self) -> Option<&mut Vec<Self>>;

    /// Whether this node supports name lookups.
    fn is_keyed(&self) -> bool;

    /// Child by name. `None` if the node is not keyed or has no such key.
    fn key(&self, name: &str) -> Option<Cow<'_, Self>>;

    /// Run `update` against the named child in place.
    ///
    /// `None` if the node is not keyed or has no such key; nothing is
    /// created.
    fn update_key(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut Self) -> crate::Result<()>,
    ) -> Option<crate::Result<()>>;

    /// Assign the named child, overwriting a key that matches ignoring case.
    fn assign_key(&mut self, name: &str, value: Self) -> Result<(), KeyWriteError>;

    /// Remove the named child. `Ok(false)` if there was nothing to remove.
    fn remove_key(&mut self, name: &str) -> Result<bool, KeyWriteError>;

    /// Whether this node is a value bound at read time.
    fn is_deferred(&self) -> bool {
        false
    }
}

impl PathNode for Value {
    fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    fn as_list(&self) -> Option<&[Self]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    fn as_list_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    fn is_keyed(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Object(_))
    }

    fn key(&self, name: &str) -> Option<Cow<'_, Self>> {
        match self {
            Value::Map(map) => {
                let key = find_key(|| map.keys(), name)?;
                map.get(key).map(Cow::Borrowed)
            }
            Value::Object(object) => {
                let property = object.find_property(name)?;
                object.get(property.name).map(Cow::Owned)
            }
            _ => None,
        }
    }

    fn update_key(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut Self) -> crate::Result<()>,
    ) -> Option<crate::Result<()>> {
        match self {
            Value::Map(map) => {
                let key = find_key(|| map.keys(), name)?.clone();
                map.get_mut(&key).map(update)
            }
            Value::Object(object) => {
                // Typed properties are values, not places: update a copy and
                // write it back.
                let property = object.find_property(name)?;
                let mut child = object.get(property.name)?;
                Some(update(&mut child).and_then(|()| object.set(property.name, child)))
            }
            _ => None,
        }
    }

    fn assign_key(&mut self, name: &str, value: Self) -> Result<(), KeyWriteError> {
        match self {
            Value::Map(map) => {
                let key = find_key(|| map.keys(), name)
                    .cloned()
                    .unwrap_or_else(|| name.to_string());
                map.insert(key, value);
                Ok(())
            }
            Value::Object(object) => {
                let property = object
                    .find_property(name)
                    .ok_or(KeyWriteError::UnknownProperty)?;
                if !property.writable {
                    return Err(KeyWriteError::ReadOnly(format!(
                        "{}.{}",
                        object.type_name(),
                        property.name
                    )));
                }
                object
                    .set(property.name, value)
                    .map_err(KeyWriteError::Rejected)
            }
            _ => Err(KeyWriteError::NotKeyed),
        }
    }

    fn remove_key(&mut self, name: &str) -> Result<bool, KeyWriteError> {
        match self {
            Value::Map(map) => {
                let key = find_key(|| map.keys(), name).cloned();
                Ok(key.and_then(|k| map.remove(&k)).is_some())
            }
            Value::Object(object) => match object.find_property(name) {
                Some(property) => Err(KeyWriteError::ReadOnly(format!(
                    "{}.{}",
                    object.type_name(),
                    property.name
                ))),
                None => Ok(false),
            },
            _ => Err(KeyWriteError::NotKeyed),
        }
    }
}

impl PathNode for serde_json::Value {
    fn as_list(&self) -> Option<&[Self]> {
        self.as_array().map(Vec::as_slice)
    }

    fn as_list_mut(&mut self) -> Option<&mut Vec<Self>> {
        self.as_array_mut()
    }

    fn is_keyed(&self) -> bool {
        self.is_object()
    }

    fn key(&self, name: &str) -> Option<Cow<'_, Self>> {
        let map = self.as_object()?;
        let key = find_key(|| map.keys(), name)?;
        map.get(key).map(Cow::Borrowed)
    }

    fn update_key(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut Self) -> crate::Result<()>,
    ) -> Option<crate::Result<()>> {
        let map = self.as_object_mut()?;
        let key = find_key(|| map.keys(), name)?.clone();
        map.get_mut(&key).map(update)
    }

    fn assign_key(&mut self, name: &str, value: Self) -> Result<(), KeyWriteError> {
        let map = self.as_object_mut().ok_or(KeyWriteError::NotKeyed)?;
        let key = find_key(|| map.keys(), name)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        map.insert(key, value);
        Ok(())
    }

    fn remove_key(&mut self, name: &str) -> Result<bool, KeyWriteError> {
        let map = self.as_object_mut().ok_or(KeyWriteError::NotKeyed)?;
        let key = find_key(|| map.keys(), name).cloned();
        Ok(key.and_then(|k| map.remove(&k)).is_some())
    }
}
