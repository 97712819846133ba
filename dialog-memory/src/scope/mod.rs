//! Named memory scopes for one turn.
//!
//! A [`ScopeRegistry`] maps scope names (`user`, `turn`, `dialog`, ...) to
//! the views that back them. The first segment of a path selects the scope
//! and the rest is resolved inside it. The registry is an explicit context
//! object: callers build one per turn and pass it down.
//!
//! ```
//! use dialog_memory::{JsonMemory, ScopeRegistry, Value};
//! use serde_json::json;
//!
//! let mut registry = ScopeRegistry::standard();
//! registry.bind("dialog", JsonMemory::new(json!({"name": "Ada"}))).unwrap();
//!
//! assert_eq!(registry.try_get_value("$name"), Some(Value::from("Ada")));
//! registry.set_value("turn.count", Value::from(1)).unwrap();
//! assert!(registry.set_value("settings.x", Value::from(1)).is_err());
//! ```

mod alias;
mod config;

pub use alias::{AliasResolver, PathResolver};
pub use config::{AliasSpec, RegistryConfig, ScopeSpec};

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::{IntoMemory, Memory, ObjectMemory};
use crate::path::has_segments;
use crate::value::{eq_ignore_case, Map, Value};

/// Standard scope names.
pub mod names {
    pub const USER: &str = "user";
    pub const CONVERSATION: &str = "conversation";
    pub const TURN: &str = "turn";
    pub const DIALOG: &str = "dialog";
    pub const DIALOG_CLASS: &str = "dialogclass";
    pub const CLASS: &str = "class";
    pub const THIS: &str = "this";
    pub const SETTINGS: &str = "settings";
}

/// Segment selecting the first element of a list.
const FIRST: &str = ".first()";

/// A named scope and the view bound to it.
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    memory: Arc<dyn Memory>,
    read_only: bool,
    include_in_snapshot: bool,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &Arc<dyn Memory> {
        &self.memory
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn from_spec(spec: &ScopeSpec) -> Self {
        Self {
            name: spec.name.clone(),
            memory: Arc::new(ObjectMemory::empty()),
            read_only: spec.read_only,
            include_in_snapshot: spec.include_in_snapshot,
        }
    }
}

/// Directory of named scopes with path aliases.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: Vec<Scope>,
    resolvers: Vec<Box<dyn PathResolver>>,
    changes: AtomicU64,
}

impl ScopeRegistry {
    /// An empty registry with no scopes or aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard scopes and aliases, each scope backed by an empty
    /// dictionary.
    pub fn standard() -> Self {
        Self::build(&RegistryConfig::default())
    }

    /// Build a registry from a configuration after validating it.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &RegistryConfig) -> Self {
        Self {
            scopes: config.scopes.iter().map(Scope::from_spec).collect(),
            resolvers: config
                .aliases
                .iter()
                .map(|spec| Box::new(AliasResolver::from(spec)) as Box<dyn PathResolver>)
                .collect(),
            changes: AtomicU64::new(0),
        }
    }

    /// Bind the view backing an existing scope.
    pub fn bind(&mut self, name: &str, memory: impl IntoMemory) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| self.unknown_scope(name))?;
        self.scopes[index].memory = memory.into_memory();
        *self.changes.get_mut() += 1;
        Ok(())
    }

    /// Add a scope, or rebind it if one with the same name exists.
    pub fn add_scope(&mut self, spec: &ScopeSpec, memory: impl IntoMemory) {
        let scope = Scope {
            memory: memory.into_memory(),
            ..Scope::from_spec(spec)
        };
        match self.position(&spec.name) {
            Some(index) => self.scopes[index] = scope,
            None => self.scopes.push(scope),
        }
        *self.changes.get_mut() += 1;
    }

    /// Append a path resolver, applied after the existing ones.
    pub fn add_resolver(&mut self, resolver: impl PathResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Look up a scope by name, ignoring case.
    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.position(name).map(|i| &self.scopes[i])
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.scopes.iter().position(|s| eq_ignore_case(&s.name, name))
    }

    fn unknown_scope(&self, name: &str) -> Error {
        Error::unknown_scope(name, self.scopes.iter().map(|s| s.name.as_str()))
    }

    /// Apply every path resolver in order.
    pub fn transform_path<'p>(&self, path: &'p str) -> Cow<'p, str> {
        let mut current = Cow::Borrowed(path);
        for resolver in &self.resolvers {
            let rewritten = match resolver.transform_path(&current) {
                Cow::Owned(rewritten) => Some(rewritten),
                Cow::Borrowed(_) => None,
            };
            if let Some(rewritten) = rewritten {
                current = Cow::Owned(rewritten);
            }
        }
        current
    }

    /// Split `path` into its scope and the path within that scope.
    ///
    /// The text before the first `.` or `[` names the scope. A bracket stays
    /// with the remainder, so `user['name']` leaves `['name']`. A path
    /// without either names a whole scope and leaves an empty remainder.
    pub fn resolve_scope<'p>(&self, path: &'p str) -> Result<(&Scope, &'p str)> {
        let path = path.trim();
        if let Some(split) = path.find(['.', '[']) {
            let (head, rest) = path.split_at(split);
            if !head.is_empty() {
                if let Some(scope) = self.scope(head) {
                    return Ok((scope, rest.strip_prefix('.').unwrap_or(rest)));
                }
            }
        }
        self.scope(path)
            .map(|scope| (scope, ""))
            .ok_or_else(|| self.unknown_scope(path))
    }

    /// Expand `{inner}` to the string stored at `inner`.
    fn expand<'p>(&self, path: &'p str) -> Option<Cow<'p, str>> {
        let trimmed = path.trim();
        match trimmed.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            Some(inner) => match self.try_get_value(inner)? {
                Value::String(target) => Some(Cow::Owned(target)),
                other => {
                    debug!(path, kind = other.kind(), "Indirect path is not a string");
                    None
                }
            },
            None => Some(Cow::Borrowed(path)),
        }
    }

    fn expand_for_write<'p>(&self, path: &'p str) -> Result<Cow<'p, str>> {
        self.expand(path)
            .ok_or_else(|| Error::path_not_found(path, path.trim()))
    }

    /// Read the value at `path`.
    ///
    /// A path naming only a scope returns a snapshot of the whole scope.
    /// `.first()` selects the first element of the list before it, looking
    /// one level into a nested list; any path after the last `.first()` is
    /// resolved inside that element.
    pub fn try_get_value(&self, path: &str) -> Option<Value> {
        let path = self.transform_path(path);
        let path = self.expand(&path)?;
        let (scope, remaining) = match self.resolve_scope(&path) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(path = %path, error = %e, "Read from unknown scope");
                return None;
            }
        };
        if !has_segments(remaining) {
            return Some(scope.memory.snapshot());
        }

        if let Some((head, tail)) = split_first(&path) {
            let (scope, remaining) = self.resolve_scope(head).ok()?;
            let list = if has_segments(remaining) {
                scope.memory.try_get_value(remaining)?
            } else {
                scope.memory.snapshot()
            };
            let first = first_nested(list)?;
            if !has_segments(tail) {
                return Some(first);
            }
            return scope.memory.create_memory_from(first).try_get_value(tail);
        }

        scope.memory.try_get_value(remaining)
    }

    /// Write `value` at `path`.
    ///
    /// A path naming only a scope replaces the scope's whole value. Writes
    /// to read-only scopes and unknown scopes fail.
    pub fn set_value(&self, path: &str, value: Value) -> Result<()> {
        let path = self.transform_path(path);
        let path = self.expand_for_write(&path)?;
        let (scope, remaining) = self.resolve_scope(&path)?;
        if scope.read_only {
            return Err(Error::read_only(format!("scope '{}'", scope.name)));
        }
        if !has_segments(remaining) {
            scope.memory.set_root(value)?;
        } else {
            scope.memory.set_value(remaining, value)?;
        }
        self.changes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove the value at `path`. Whole scopes cannot be removed.
    pub fn remove_value(&self, path: &str) -> Result<bool> {
        let path = self.transform_path(path);
        let path = self.expand_for_write(&path)?;
        let (scope, remaining) = self.resolve_scope(&path)?;
        if scope.read_only || !has_segments(remaining) {
            return Err(Error::read_only(format!("scope '{}'", scope.name)));
        }
        let removed = scope.memory.remove_value(remaining)?;
        if removed {
            self.changes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    /// Fingerprint of the registry's content.
    ///
    /// Covers the writes and bindings made through the registry and every
    /// scope's own version, so a write made directly to a bound view changes
    /// it as well.
    pub fn version(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.changes.load(Ordering::Relaxed).to_le_bytes());
        for scope in &self.scopes {
            hasher.update(scope.name.as_bytes());
            hasher.update(b"\0");
            hasher.update(scope.memory.version().as_bytes());
            hasher.update(b"\0");
        }
        format!("{:x}", hasher.finalize())
    }

    /// Every snapshot-visible scope's value, keyed by scope name.
    pub fn memory_snapshot(&self) -> Value {
        let map: Map = self
            .scopes
            .iter()
            .filter(|s| s.include_in_snapshot)
            .map(|s| (s.name.clone(), s.memory.snapshot()))
            .collect();
        Value::Map(map)
    }
}

/// Split `path` around its last `.first()`, matched ignoring case.
fn split_first(path: &str) -> Option<(&str, &str)> {
    // ASCII lowercasing keeps byte offsets.
    let at = path.to_ascii_lowercase().rfind(FIRST)?;
    Some((&path[..at], &path[at + FIRST.len()..]))
}

/// First element of a list, or of its first element when that is a list too.
fn first_nested(list: Value) -> Option<Value> {
    let Value::List(items) = list else {
        return None;
    };
    match items.into_iter().next()? {
        Value::List(inner) => inner.into_iter().next(),
        first => Some(first),
    }
}

impl Memory for ScopeRegistry {
    fn try_get_value(&self, path: &str) -> Option<Value> {
        ScopeRegistry::try_get_value(self, path)
    }

    fn set_value(&self, path: &str, value: Value) -> Result<()> {
        ScopeRegistry::set_value(self, path, value)
    }

    fn version(&self) -> String {
        ScopeRegistry::version(self)
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

    fn remove_value(&self, path: &str) -> Result<bool> {
        ScopeRegistry::remove_value(self, path)
    }

    fn snapshot(&self) -> Value {
        self.memory_snapshot()
    }
}
