//! # dialog-memory
//!
//! Path-addressed memory for conversational bots: the layer expression
//! evaluation uses to read and write conversation data such as
//! `user.profile.tags[0]` or `turn.recognized.entities.city`.
//!
//! ## Core Components
//!
//! - **Path**: lexing of dotted and bracketed paths into segments
//! - **Resolver**: reading and writing through value graphs by path
//! - **Memory**: views over backing values ([`ObjectMemory`], [`JsonMemory`])
//! - **Stacked**: layered views with shadowing and single-variable frames
//! - **Scope**: named scopes (`user`, `turn`, `dialog`, ...) with path aliases
//!
//! ## Example
//!
//! ```rust
//! use dialog_memory::{Memory, ObjectMemory, StackedMemory, Value};
//! use serde_json::json;
//!
//! let memory = ObjectMemory::new(json!({"a": [10, 20], "b": {"C": 5}}));
//! assert_eq!(memory.try_get_value("b.c"), Some(Value::from(5)));
//!
//! memory.set_value("a[2]", Value::from(30)).unwrap();
//! assert_eq!(memory.try_get_value("a[2]"), Some(Value::from(30)));
//!
//! let mut stack = StackedMemory::new();
//! stack.push(memory);
//! stack.push_local("item", Value::from("current"));
//! assert_eq!(stack.try_get_value("item"), Some(Value::from("current")));
//! ```

// Self-alias for derive macro support within the crate
extern crate self as dialog_memory;

pub mod error;
pub mod memory;
pub mod path;
pub mod reflect;
pub mod resolver;
pub mod scope;
pub mod stacked;
pub mod value;

// Re-exports for convenience
pub use error::{Error, Result};
pub use memory::{
    AdapterRegistry, IntoMemory, JsonMemory, Memory, MemoryExt, MemoryFactory, ObjectMemory,
};
pub use path::{enumerate, PathSegment, PathSegments};
pub use reflect::{Property, Reflect};
pub use resolver::{lookup, remove_path, set_path, try_get_path, Lookup, PathNode};
pub use scope::{
    names as scope_names, AliasResolver, AliasSpec, PathResolver, RegistryConfig, Scope,
    ScopeRegistry, ScopeSpec,
};
pub use stacked::{LocalFrame, StackedMemory};
pub use value::{Deferred, FromValue, IntoValue, Map, Value};
