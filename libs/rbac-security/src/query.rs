//! Read-query envelope.
//!
//! [`Query`] models a document-store query (`selector`, paging, projection,
//! ordering). Options the engine does not interpret (`bookmark`,
//! `use_index`, ...) are kept in [`Query::options`] and written back
//! unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::selector::Selector;

/// A read-query against the document store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Predicate selecting matching documents.
    #[serde(default)]
    pub selector: Selector,
    /// Maximum number of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Number of results to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Fields to return (projection). `None` returns whole documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Result ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    /// Any other top-level options, carried through verbatim.
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl Query {
    /// Create a query for `selector` with every option unset.
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Parse a query from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if `raw` is not valid JSON
    /// or does not have the shape of a query.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Render the query as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The resource named by the selector's top-level `field`.
    ///
    /// Only string values count; a missing or non-string value yields `None`.
    #[must_use]
    pub fn resource(&self, field: &str) -> Option<&str> {
        self.selector.get_str(field)
    }
}

/// Sort direction for a single field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering requested for one field.
///
/// Values other than `"asc"` / `"desc"` are not interpreted by the engine and
/// are written back as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortOrder {
    Direction(SortDirection),
    Other(serde_json::Value),
}

impl SortOrder {
    /// The direction, if the value is a recognised one.
    #[must_use]
    pub fn direction(&self) -> Option<SortDirection> {
        match self {
            Self::Direction(d) => Some(*d),
            Self::Other(_) => None,
        }
    }
}

impl From<SortDirection> for SortOrder {
    fn from(direction: SortDirection) -> Self {
        Self::Direction(direction)
    }
}

/// Ordered mapping of field name to [`SortOrder`].
///
/// Serialized as a JSON object whose key order is the sort priority.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sort(Vec<(String, SortOrder)>);

impl Sort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field with the lowest priority so far.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: impl Into<SortOrder>) -> Self {
        self.0.push((field.into(), order.into()));
        self
    }

    /// Fields in priority order.
    #[must_use]
    pub fn fields(&self) -> &[(String, SortOrder)] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Sort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, order) in &self.0 {
            map.serialize_entry(field, order)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Sort {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SortVisitor)
    }
}

struct SortVisitor;

impl<'de> Visitor<'de> for SortVisitor {
    type Value = Sort;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of field names to sort orders")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Sort, A::Error> {
        let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry::<String, SortOrder>()? {
            fields.push(entry);
        }
        Ok(Sort(fields))
    }
}
