#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Ledger RBAC SDK
//!
//! Role-based authorization for named operations and document-store
//! read-queries:
//!
//! - [`IdentityProvider`] - Where the caller's ID and roles come from
//! - [`RolePermissions`], [`Permissions`] - Immutable permission table
//! - [`Rule`], [`RuleFn`] - Caller-aware resource rules
//! - [`AuthError`], [`ErrorKind`] - Error taxonomy with stable codes
//! - [`pep`] - PEP helpers ([`AuthService`], [`apply_rule`])
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rbac_sdk::AuthService;
//!
//! // Build the table once and share it.
//! let table = Arc::new(permission_table());
//!
//! // One engine per request.
//! let auth = AuthService::new(&identity, Arc::clone(&table), "roles")?;
//!
//! // Gate an operation.
//! let payload = auth.with_auth("createWallet", args, create_wallet)?;
//!
//! // Narrow a caller-supplied query.
//! let query = auth.validate_query_perms(raw_query, "query")?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod pep;

pub use api::IdentityProvider;
pub use error::{AuthError, ErrorKind, IdentityError};
pub use models::{ContractPermissions, Permissions, ResourcePermissions, RolePermissions, Rule, RuleFn};
pub use pep::{AuthService, apply_rule};
