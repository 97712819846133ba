//! Path resolution over value graphs.
//!
//! Reads walk the segments of a path from the root; a numeric segment needs a
//! list and an in-range index, a name segment needs a keyed node with a
//! matching key. Any miss makes the whole read a miss.
//!
//! Writes walk the non-terminal segments the same way and mutate only at the
//! terminal one. Missing intermediate containers are never created: setting
//! `a.b.c` when `a.b` does not exist fails rather than building `a.b`.
//! A terminal index equal to the list length appends; anything beyond that is
//! out of range.
//!
//! ```
//! use dialog_memory::resolver::{set_path, try_get_path};
//! use serde_json::json;
//!
//! let mut root = json!({"a": [10, 20], "b": {"C": 5}});
//! assert_eq!(try_get_path(&root, "a[1]"), Some(json!(20)));
//! assert_eq!(try_get_path(&root, "b.c"), Some(json!(5)));
//!
//! set_path(&mut root, "a[2]", json!(30)).unwrap();
//! assert_eq!(root["a"], json!([10, 20, 30]));
//! assert!(set_path(&mut root, "a[4]", json!(50)).is_err());
//! ```

mod node;
#[cfg(test)]
mod proptest;

pub use node::{KeyWriteError, PathNode};

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::path::{enumerate, has_segments, PathSegment, PathSegments};

/// Resolve `path` against `root`.
///
/// An empty path is a miss; callers that want the whole root handle that
/// themselves. A deferred node before the end of the path is a miss too; use
/// [`lookup`] to continue past it.
pub fn try_get_path<N: PathNode>(root: &N, path: &str) -> Option<N> {
    match lookup(root, path)? {
        Lookup::Found(value) => Some(value),
        Lookup::Deferred(..) => None,
    }
}

/// Outcome of [`lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'p, N> {
    /// The node at the end of the path.
    Found(N),
    /// A deferred node reached before the end of the path, and the part of
    /// the path below it.
    Deferred(N, &'p str),
}

/// Resolve `path` against `root`, stopping at the first deferred node that
/// still has segments below it.
///
/// The caller binds the deferred node and resolves the remaining path against
/// the result.
pub fn lookup<'p, N: PathNode>(root: &N, path: &'p str) -> Option<Lookup<'p, N>> {
    if !has_segments(path) {
        return None;
    }
    lookup_in(root, path, enumerate(path))
}

fn lookup_in<'p, N: PathNode>(
    node: &N,
    path: &'p str,
    mut segments: PathSegments<'p>,
) -> Option<Lookup<'p, N>> {
    let Some(segment) = segments.next() else {
        return Some(Lookup::Found(node.clone()));
    };
    let child: Cow<'_, N> = match segment.index() {
        Some(index) => {
            let items = node.as_list()?;
            Cow::Borrowed(items.get(usize::try_from(index).ok()?)?)
        }
        None => node.key(segment.text())?,
    };
    if child.is_deferred() && !segment.is_terminal() {
        return Some(Lookup::Deferred(child.into_owned(), segment.rest(path)));
    }
    lookup_in(&*child, path, segments)
}

/// Assign `value` at `path` within `root`.
pub fn set_path<N: PathNode>(root: &mut N, path: &str, value: N) -> Result<()> {
    let mut segments = enumerate(path);
    let first = segments
        .next()
        .ok_or_else(|| Error::path_not_found(path, ""))?;
    set_in(root, path, first, segments, value)
}

fn set_in<N: PathNode>(
    node: &mut N,
    path: &str,
    segment: PathSegment<'_>,
    mut rest: PathSegments<'_>,
    value: N,
) -> Result<()> {
    let Some(next) = rest.next() else {
        return assign(node, path, &segment, value);
    };
    descend(node, path, &segment, |child| {
        set_in(child, path, next, rest, value)
    })
}

/// Remove the value at `path` within `root`.
///
/// Returns whether anything was removed. A list element removal shifts the
/// following elements down.
pub fn remove_path<N: PathNode>(root: &mut N, path: &str) -> Result<bool> {
    let mut segments = enumerate(path);
    let first = segments
        .next()
        .ok_or_else(|| Error::path_not_found(path, ""))?;
    remove_in(root, path, first, segments)
}

fn remove_in<N: PathNode>(
    node: &mut N,
    path: &str,
    segment: PathSegment<'_>,
    mut rest: PathSegments<'_>,
) -> Result<bool> {
    let Some(next) = rest.next() else {
        return match segment.index() {
            Some(index) => {
                let items = node
                    .as_list_mut()
                    .ok_or_else(|| Error::not_a_list(path, segment.text()))?;
                match usize::try_from(index) {
                    Ok(i) if i < items.len() => {
                        items.remove(i);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
            None => node
                .remove_key(segment.text())
                .map_err(|e| key_write_error(e, path, &segment)),
        };
    };
    let mut removed = false;
    descend(node, path, &segment, |child| {
        removed = remove_in(child, path, next, rest)?;
        Ok(())
    })?;
    Ok(removed)
}

/// Step into the child named by a non-terminal segment and run `f` on it.
fn descend<N: PathNode>(
    node: &mut N,
    path: &str,
    segment: &PathSegment<'_>,
    f: impl FnOnce(&mut N) -> Result<()>,
) -> Result<()> {
    match segment.index() {
        Some(index) => {
            let items = node
                .as_list_mut()
                .ok_or_else(|| Error::not_a_list(path, segment.text()))?;
            let child = usize::try_from(index)
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| Error::path_not_found(path, segment.text()))?;
            f(child)
        }
        None => {
            if !node.is_keyed() {
                return Err(Error::not_an_object(path, segment.text()));
            }
            node.update_key(segment.text(), f)
                .unwrap_or_else(|| Err(Error::path_not_found(path, segment.text())))
        }
    }
}

fn assign<N: PathNode>(node: &mut N, path: &str, segment: &PathSegment<'_>, value: N) -> Result<()> {
    match segment.index() {
        Some(index) => {
            let items = node
                .as_list_mut()
                .ok_or_else(|| Error::not_a_list(path, segment.text()))?;
            let len = items.len();
            match usize::try_from(index) {
                Ok(i) if i < len => items[i] = value,
                Ok(i) if i == len => items.push(value),
                _ => return Err(Error::index_out_of_range(path, index, len)),
            }
            Ok(())
        }
        None => node
            .assign_key(segment.text(), value)
            .map_err(|e| key_write_error(e, path, segment)),
    }
}

fn key_write_error(error: KeyWriteError, path: &str, segment: &PathSegment<'_>) -> Error {
    match error {
        KeyWriteError::NotKeyed => Error::not_an_object(path, segment.text()),
        KeyWriteError::UnknownProperty => Error::path_not_found(path, segment.text()),
        KeyWriteError::ReadOnly(target) => Error::read_only(target),
        KeyWriteError::Rejected(error) => error,
    }
}
