#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Ledger RBAC configuration
//!
//! Declarative permission tables for [`rbac_sdk::AuthService`].
//!
//! ## Configuration
//!
//! ```yaml
//! roles_attribute: roles
//! resource_field: docType
//! roles:
//!   admin:
//!     contracts:
//!       createTransfer: true
//!     resources:
//!       asset:
//!         query:
//!           allow: true
//!           field_filter: [createdBy, created]
//!   user:
//!     contracts:
//!       createWallet: true
//!     resources:
//!       wallet:
//!         query:
//!           allow: true
//!           selector_append:
//!             createdBy: "${caller_id}"
//! ```
//!
//! `roles_attribute` and `resource_field` can be overridden from the
//! environment, e.g. `RBAC_ROLES_ATTRIBUTE=groups`. The permission table is
//! read from the file only; other `RBAC_*` variables are ignored.

pub mod config;
pub mod domain;
pub mod error;

pub use config::{RbacConfig, RoleConfig, RuleConfig};
pub use domain::Service;
pub use error::ConfigError;
