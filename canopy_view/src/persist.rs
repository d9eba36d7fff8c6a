// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simple key/list persistence for per-view state.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// Error returned by [`ViewStateMap::decode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    /// 1-based line number of the malformed line.
    pub line: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed view-state line {}", self.line)
    }
}

impl core::error::Error for DecodeError {}

/// Per-view persisted state as keys mapping to scalars or lists.
///
/// Containers use this to carry pan/zoom, collapsed-section lists, and
/// similar view state across sessions. The textual encoding is an internal
/// detail of the process that wrote it — it round-trips through
/// [`encode`](Self::encode)/[`decode`](Self::decode) but is not a
/// contractual format.
///
/// Keys keep their first-set order so encodes are stable. Scalars and lists
/// share one namespace; setting a key overwrites whatever kind it held.
///
/// # Example
///
/// ```
/// use canopy_view::ViewStateMap;
///
/// let mut state = ViewStateMap::new();
/// state.set_scalar("zoom", "1.5");
/// state.set_list("collapsed", ["inputs", "advanced"]);
///
/// let encoded = state.encode();
/// let decoded = ViewStateMap::decode(&encoded).unwrap();
/// assert_eq!(decoded.scalar("zoom"), Some("1.5"));
/// assert_eq!(decoded.list("collapsed"), Some(&["inputs".to_string(), "advanced".to_string()][..]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewStateMap {
    entries: Vec<(String, Value)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Value {
    Scalar(String),
    List(Vec<String>),
}

impl ViewStateMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets a scalar value, replacing any previous value for the key.
    pub fn set_scalar(&mut self, key: &str, value: &str) {
        self.set(key, Value::Scalar(value.to_string()));
    }

    /// Sets a list value, replacing any previous value for the key.
    pub fn set_list<'a>(&mut self, key: &str, items: impl IntoIterator<Item = &'a str>) {
        let items = items.into_iter().map(ToString::to_string).collect();
        self.set(key, Value::List(items));
    }

    fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Removes a key.
    ///
    /// Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Returns the scalar value for a key, if it holds one.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, v)| match v {
            Value::Scalar(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    /// Returns the list value for a key, if it holds one.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.entries.iter().find_map(|(k, v)| match v {
            Value::List(items) if k == key => Some(items.as_slice()),
            _ => None,
        })
    }

    /// Encodes the map as text.
    ///
    /// One line per key: `key=value` for scalars, `key[]=a\u{1f}b` for lists
    /// (unit separator between items). Keys and items must not contain
    /// newlines; list items must not contain the separator.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            match value {
                Value::Scalar(s) => {
                    out.push('=');
                    out.push_str(s);
                }
                Value::List(items) => {
                    out.push_str("[]=");
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push('\u{1f}');
                        }
                        out.push_str(item);
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// Decodes text produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for a line without a `=` separator.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let mut map = Self::new();
        for (i, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (key, rest) = line.split_once('=').ok_or(DecodeError { line: i + 1 })?;
            match key.strip_suffix("[]") {
                Some(key) => {
                    let items: Vec<&str> = if rest.is_empty() {
                        Vec::new()
                    } else {
                        rest.split('\u{1f}').collect()
                    };
                    map.set_list(key, items);
                }
                None => map.set_scalar(key, rest),
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn round_trip() {
        let mut state = ViewStateMap::new();
        state.set_scalar("pan.x", "120.5");
        state.set_scalar("pan.y", "-44");
        state.set_list("collapsed", ["inputs", "outputs"]);
        state.set_list("pinned", []);

        let decoded = ViewStateMap::decode(&state.encode()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn set_overwrites_across_kinds() {
        let mut state = ViewStateMap::new();
        state.set_scalar("k", "v");
        state.set_list("k", ["a"]);
        assert_eq!(state.scalar("k"), None);
        assert_eq!(state.list("k"), Some(&["a".to_string()][..]));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut state = ViewStateMap::new();
        state.set_scalar("k", "v");
        assert!(state.remove("k"));
        assert!(!state.remove("k"));
        assert!(state.is_empty());
    }

    #[test]
    fn encode_order_is_stable() {
        let mut state = ViewStateMap::new();
        state.set_scalar("b", "2");
        state.set_scalar("a", "1");
        state.set_scalar("b", "3");
        assert_eq!(state.encode(), "b=3\na=1\n");
    }

    #[test]
    fn malformed_line_is_reported() {
        let err = ViewStateMap::decode("pan.x=1\nbroken\n").unwrap_err();
        assert_eq!(err, DecodeError { line: 2 });
    }

    #[test]
    fn empty_list_round_trips() {
        let mut state = ViewStateMap::new();
        state.set_list("collapsed", []);
        let decoded = ViewStateMap::decode(&state.encode()).unwrap();
        assert_eq!(decoded.list("collapsed"), Some(&vec![][..]));
    }
}
