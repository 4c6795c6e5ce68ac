#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Value types shared by the ledger RBAC engine and its callers.
//!
//! - [`CallerContext`] - resolved caller identity and roles
//! - [`Selector`], [`SelectorValue`] - document-query predicate tree
//! - [`Query`], [`Sort`] - read-query envelope that the engine rewrites
pub mod constants;
pub mod context;
pub mod query;
pub mod selector;

pub use context::{CallerContext, CallerContextBuilder, parse_roles};
pub use query::{Query, Sort, SortDirection, SortOrder};
pub use selector::{Selector, SelectorValue};
