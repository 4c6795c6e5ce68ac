#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Identity Plugin
//!
//! This plugin provides static token-to-identity mapping for development and testing.
//!
//! ## Modes
//!
//! - **`accept_all`** (default): Accepts any non-empty token, returns the configured default identity.
//!
//! - **`static_tokens`**: Maps specific tokens to specific identities. Useful for tests
//!   with distinct callers and roles.
//!
//! ## Configuration
//!
//! ```yaml
//! mode: static_tokens
//! default_identity:
//!   caller_id: "anonymous"
//!   attributes:
//!     roles: "user"
//! tokens:
//!   - token: "token-admin"
//!     identity:
//!       caller_id: "admin-1"
//!       attributes:
//!         roles: "admin,user"
//! ```

pub mod config;
pub mod domain;

pub use config::{IdentityConfig, IdentityMode, StaticIdentityPluginConfig, TokenMapping};
pub use domain::{Service, StaticIdentity};
