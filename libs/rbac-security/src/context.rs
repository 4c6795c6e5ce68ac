use serde::{Deserialize, Serialize};

use crate::constants::ROLE_DELIMITER;

/// `CallerContext` holds the identity the engine authorizes against.
///
/// Built once from the identity provider (or directly in tests) and never
/// mutated afterwards. Roles keep the order the provider returned them in;
/// duplicates are allowed and have no effect on decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Caller identifier as reported by the identity provider.
    caller_id: String,
    /// Roles held by the caller.
    #[serde(default)]
    roles: Vec<String>,
}

impl CallerContext {
    /// Create a new `CallerContext` builder
    #[must_use]
    pub fn builder() -> CallerContextBuilder {
        CallerContextBuilder::default()
    }

    /// Get the caller ID
    #[must_use]
    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    /// Get the caller's roles in provider order
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns `true` if the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Default)]
pub struct CallerContextBuilder {
    caller_id: Option<String>,
    roles: Vec<String>,
}

impl CallerContextBuilder {
    #[must_use]
    pub fn caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Replace the roles with the ones parsed from a raw attribute value.
    #[must_use]
    pub fn roles_attribute(mut self, raw: &str) -> Self {
        self.roles = parse_roles(raw);
        self
    }

    #[must_use]
    pub fn build(self) -> CallerContext {
        CallerContext {
            caller_id: self.caller_id.unwrap_or_default(),
            roles: self.roles,
        }
    }
}

/// Split a roles attribute value into individual roles.
///
/// Segments are separated by [`ROLE_DELIMITER`], trimmed of surrounding
/// whitespace, and empty segments are dropped. An empty value yields no roles.
#[must_use]
pub fn parse_roles(raw: &str) -> Vec<String> {
    raw.split(ROLE_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
