#![forbid(unsafe_code)]

//! Query-string snapshot model.
//!
//! A [`Query`] is an ordered mapping from parameter name to [`QueryValue`],
//! mirroring how client-side routers report the current URL:
//!
//! - `?q=rust` → `Text("rust")`
//! - `?flag` → `Null` (present, no `=value` part)
//! - `?tag=a&tag=b` → `List([Some("a"), Some("b")])` (repeated key; a bare
//!   repeat contributes a `None` element)
//!
//! [`Query::parse`] and [`Query::encode`] convert between this model and a
//! percent-encoded query string. Both sides use `form_urlencoded`, so `+`,
//! `%XX` escapes and non-ASCII text round-trip.
//!
//! Entry order is preserved: parsing keeps first-appearance order, and
//! [`set`](Query::set) rewrites a key in place rather than reordering it.

use std::fmt;

/// One query entry as the router reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    /// Key present with no `=value` part (`?flag`).
    Null,
    /// Single occurrence (`?q=rust`).
    Text(String),
    /// Repeated key; `None` elements are valueless occurrences.
    List(Vec<Option<String>>),
}

impl QueryValue {
    fn occurrences(&self) -> Vec<Option<&str>> {
        match self {
            Self::Null => vec![None],
            Self::Text(s) => vec![Some(s.as_str())],
            Self::List(items) => items.iter().map(|i| i.as_deref()).collect(),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Some).collect())
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(|v| Some(v.to_owned())).collect())
    }
}

/// An ordered query-parameter snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    entries: Vec<(String, QueryValue)>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the query has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `key` to `value`, rewriting in place if present, appending
    /// otherwise.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Record one raw occurrence of `key`, as seen while scanning a query
    /// string left to right. A repeated key is promoted to a `List`.
    pub fn append(&mut self, key: impl Into<String>, occurrence: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            None => {
                let value = match occurrence {
                    None => QueryValue::Null,
                    Some(s) => QueryValue::Text(s),
                };
                self.entries.push((key, value));
            }
            Some((_, existing)) => {
                let mut items = match std::mem::replace(existing, QueryValue::Null) {
                    QueryValue::Null => vec![None],
                    QueryValue::Text(s) => vec![Some(s)],
                    QueryValue::List(items) => items,
                };
                items.push(occurrence);
                *existing = QueryValue::List(items);
            }
        }
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a query string (with or without a leading `?`).
    ///
    /// Never fails: malformed escapes decode lossily, empty pairs are
    /// skipped.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        let mut query = Self::new();
        for pair in input.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = match pair.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (pair, None),
            };
            query.append(decode_component(raw_key), raw_value.map(decode_component));
        }
        query
    }

    /// Encode into a percent-encoded query string (no leading `?`).
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            for occurrence in value.occurrences() {
                if !out.is_empty() {
                    out.push('&');
                }
                out.push_str(&encode_component(key));
                if let Some(v) = occurrence {
                    out.push('=');
                    out.push_str(&encode_component(v));
                }
            }
        }
        out
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromIterator<(String, QueryValue)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, QueryValue)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.set(key, value);
        }
        query
    }
}

fn decode_component(raw: &str) -> String {
    // The component contains no literal `&` or `=` (already split), so the
    // pair parser sees exactly one key.
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
