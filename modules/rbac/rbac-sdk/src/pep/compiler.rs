//! Rule application.
//!
//! Folds an allowing [`Rule`] into a caller-supplied [`Query`]:
//!
//! | Rule field | Present | Absent |
//! |------------|---------|--------|
//! | `selector_append` (non-empty) | `selector = {"$and": [selector, append]}` | selector untouched |
//! | `field_filter` | replaces `fields` | `fields` untouched |
//!
//! The selector is never deep-merged: both sides are kept verbatim under
//! `$and`, so an appended condition can only narrow the result set.

use rbac_security::Query;

use crate::models::Rule;

/// Apply `rule` to `query` and return the rewritten query.
///
/// A rule with `allow == false` contributes nothing and `query` is
/// returned unchanged.
#[must_use]
pub fn apply_rule(mut query: Query, rule: &Rule) -> Query {
    if !rule.allow {
        return query;
    }

    if let Some(append) = rule.selector_append.as_ref().filter(|s| !s.is_empty()) {
        let original = std::mem::take(&mut query.selector);
        query.selector = original.append(append.clone());
    }

    if let Some(fields) = &rule.field_filter {
        query.fields = Some(fields.clone());
    }

    query
}
