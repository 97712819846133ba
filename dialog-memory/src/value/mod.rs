//! Values addressed by memory paths.
//!
//! [`Value`] is the generic object graph: scalars, lists, dictionaries, typed
//! objects exposed through [`Reflect`](crate::reflect::Reflect), and deferred
//! values bound at read time. It converts losslessly to and from
//! `serde_json::Value` except for deferred values, which have no tree form.

mod convert;
mod types;

pub use convert::{FromValue, IntoValue};
pub use types::{Deferred, Map, Value};

pub(crate) use convert::mismatch;

/// Key comparison used by every name lookup: ordinal, ignoring case.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Find the key matching `name`: exact first, then ignoring case.
///
/// `keys` is called once per pass so any map's key iterator can be used.
pub(crate) fn find_key<'k, I>(keys: impl Fn() -> I, name: &str) -> Option<&'k String>
where
    I: Iterator<Item = &'k String>,
{
    keys()
        .find(|k| k.as_str() == name)
        .or_else(|| keys().find(|k| eq_ignore_case(k, name)))
}
