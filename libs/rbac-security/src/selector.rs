use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{AND, OR};

/// A value inside a [`Selector`].
///
/// Mirrors the JSON document shape of a query predicate while keeping the
/// representation typed: scalars, nested selectors, and ordered lists.
/// Lists hold nested selectors for combinators (`$and`, `$or`) and plain
/// literals for operators such as `$in`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorValue {
    /// JSON `null`.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(serde_json::Number),
    /// String literal.
    String(String),
    /// Ordered list of values.
    List(Vec<SelectorValue>),
    /// Nested selector.
    Selector(Selector),
}

impl SelectorValue {
    /// Borrow the string literal, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the nested selector, if this is one.
    #[must_use]
    pub fn as_selector(&self) -> Option<&Selector> {
        match self {
            Self::Selector(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[SelectorValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for SelectorValue {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for SelectorValue {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for SelectorValue {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for SelectorValue {
    #[inline]
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for SelectorValue {
    #[inline]
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<serde_json::Number> for SelectorValue {
    #[inline]
    fn from(n: serde_json::Number) -> Self {
        Self::Number(n)
    }
}

impl From<Selector> for SelectorValue {
    #[inline]
    fn from(s: Selector) -> Self {
        Self::Selector(s)
    }
}

impl From<Vec<Selector>> for SelectorValue {
    fn from(selectors: Vec<Selector>) -> Self {
        Self::List(selectors.into_iter().map(Self::Selector).collect())
    }
}

impl From<Vec<SelectorValue>> for SelectorValue {
    #[inline]
    fn from(items: Vec<SelectorValue>) -> Self {
        Self::List(items)
    }
}

/// A document-query predicate: field names (or combinator keys) mapped to values.
///
/// Keys are kept sorted so that serializing the same selector always yields
/// the same bytes.
///
/// # Examples
///
/// ```
/// use rbac_security::Selector;
///
/// let owned = Selector::new().with("createdBy", "u1");
/// let merged = Selector::new().with("docType", "wallet").append(owned);
///
/// assert_eq!(
///     merged.to_string(),
///     r#"{"$and":[{"docType":"wallet"},{"createdBy":"u1"}]}"#,
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(BTreeMap<String, SelectorValue>);

impl Selector {
    /// Create an empty selector (matches every document).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SelectorValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SelectorValue>,
    ) -> Option<SelectorValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Conjunction of `selectors` under a single `$and` key.
    #[must_use]
    pub fn and(selectors: Vec<Selector>) -> Self {
        Self::new().with(AND, selectors)
    }

    /// Disjunction of `selectors` under a single `$or` key.
    #[must_use]
    pub fn or(selectors: Vec<Selector>) -> Self {
        Self::new().with(OR, selectors)
    }

    /// Narrow this selector with `other`.
    ///
    /// The result is always the two-element conjunction
    /// `{"$and": [self, other]}`. Keys present on both sides are not
    /// reconciled; each side is kept verbatim.
    #[must_use]
    pub fn append(self, other: Selector) -> Self {
        Self::and(vec![self, other])
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SelectorValue> {
        self.0.get(key)
    }

    /// The string value stored under `key`, if any.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SelectorValue::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SelectorValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<SelectorValue>> FromIterator<(K, V)> for Selector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
