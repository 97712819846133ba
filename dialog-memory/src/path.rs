//! Path lexing.
//!
//! A path such as `user.profile.tags[0]` or `turn.items["first"]` is split on
//! `.`, `[` and `]` into segments. Empty tokens between adjacent delimiters are
//! dropped, a matching pair of `'` or `"` around a token is stripped, and any
//! token that parses as an integer becomes an index segment.
//!
//! There is no escaping: names cannot contain the delimiter characters.
//!
//! ```
//! use dialog_memory::path::enumerate;
//!
//! let segments: Vec<_> = enumerate("a.b[2][\"c\"]").collect();
//! assert_eq!(segments.len(), 4);
//! assert_eq!(segments[2].index(), Some(2));
//! assert_eq!(segments[3].text(), "c");
//! assert!(segments[3].is_terminal());
//! ```

use std::fmt;
use std::iter::FusedIterator;

const DELIMITERS: [char; 3] = ['.', '[', ']'];

/// One step of a path: a property name or a list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment<'a> {
    text: &'a str,
    index: Option<i64>,
    is_terminal: bool,
    start: usize,
    end: usize,
}

impl<'a> PathSegment<'a> {
    fn new(raw: &'a str, start: usize, end: usize, is_terminal: bool) -> Self {
        let text = strip_quotes(raw);
        Self {
            text,
            index: text.parse::<i64>().ok(),
            is_terminal,
            start,
            end,
        }
    }

    /// Segment text with surrounding quotes removed.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Numeric index, if the text parses as an integer.
    ///
    /// Integer-looking segments are always indices, never property names.
    pub fn index(&self) -> Option<i64> {
        self.index
    }

    /// Whether this is an index segment.
    pub fn is_index(&self) -> bool {
        self.index.is_some()
    }

    /// Whether this is the last segment of the path.
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    /// Byte range of the raw token (quotes included) within the path.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// The part of `path` following this segment.
    ///
    /// `path` must be the string this segment was enumerated from.
    pub fn rest<'p>(&self, path: &'p str) -> &'p str {
        &path[self.end..]
    }
}

impl fmt::Display for PathSegment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "[{}]", index),
            None => f.write_str(self.text),
        }
    }
}

/// Iterator over the segments of a path.
///
/// Cloning restarts nothing and shares nothing: each clone continues
/// independently from the same position. Call [`enumerate`] again to start
/// from the beginning.
#[derive(Debug, Clone)]
pub struct PathSegments<'a> {
    path: &'a str,
    next: Option<(usize, usize)>,
}

impl<'a> Iterator for PathSegments<'a> {
    type Item = PathSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, end) = self.next.take()?;
        self.next = next_token(self.path, end);
        Some(PathSegment::new(
            &self.path[start..end],
            start,
            end,
            self.next.is_none(),
        ))
    }
}

impl FusedIterator for PathSegments<'_> {}

/// Lex `path` into segments.
///
/// Never fails; malformed paths simply yield segments that later fail to
/// resolve. An empty path yields no segments.
pub fn enumerate(path: &str) -> PathSegments<'_> {
    PathSegments {
        path,
        next: next_token(path, 0),
    }
}

/// Whether `path` has at least one segment.
pub fn has_segments(path: &str) -> bool {
    next_token(path, 0).is_some()
}

fn next_token(path: &str, from: usize) -> Option<(usize, usize)> {
    let start = from + path[from..].find(|c: char| !DELIMITERS.contains(&c))?;
    let end = path[start..]
        .find(|c: char| DELIMITERS.contains(&c))
        .map_or(path.len(), |offset| start + offset);
    Some((start, end))
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}
