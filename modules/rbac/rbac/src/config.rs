//! Configuration for the RBAC engine.

use std::collections::BTreeMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

use rbac_security::Selector;
use rbac_security::constants::{DEFAULT_RESOURCE_FIELD, DEFAULT_ROLES_ATTRIBUTE};

use crate::error::ConfigError;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "RBAC_";

/// Settings that `RBAC_*` environment variables may override.
///
/// Environment keys arrive lowercased, so the permission table itself is
/// only read from the file.
pub const ENV_OVERRIDABLE: [&str; 2] = ["roles_attribute", "resource_field"];

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbacConfig {
    /// Identity attribute that carries the caller's roles.
    pub roles_attribute: String,

    /// Selector key that names the resource in raw queries.
    pub resource_field: String,

    /// Role name -> what the role grants.
    pub roles: BTreeMap<String, RoleConfig>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            roles_attribute: DEFAULT_ROLES_ATTRIBUTE.to_owned(),
            resource_field: DEFAULT_RESOURCE_FIELD.to_owned(),
            roles: BTreeMap::new(),
        }
    }
}

impl RbacConfig {
    /// Layered sources: `path` (YAML, optional) then the `RBAC_*`
    /// environment variables named in [`ENV_OVERRIDABLE`], later sources
    /// winning. Other `RBAC_*` variables are ignored.
    #[must_use]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).only(&ENV_OVERRIDABLE))
    }

    /// Load and validate the configuration from [`Self::figment`].
    ///
    /// A missing file is not an error; the defaults apply.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if a source cannot be read, a value has the wrong
    /// shape, or validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// Extract and validate the configuration from `figment`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings the type system cannot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roles_attribute.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "roles_attribute must not be empty".to_owned(),
            ));
        }
        if self.resource_field.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resource_field must not be empty".to_owned(),
            ));
        }
        if let Some(role) = self.roles.keys().find(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "role name '{role}' must not be blank"
            )));
        }
        Ok(())
    }
}

/// What a single role grants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleConfig {
    /// Operation name -> granted.
    pub contracts: BTreeMap<String, bool>,

    /// Resource -> operation kind -> rule.
    pub resources: BTreeMap<String, BTreeMap<String, RuleConfig>>,
}

/// Declarative resource rule.
///
/// String leaves of `selector_append` equal to `${caller_id}` or `${roles}`
/// are replaced per caller (see [`crate::domain::rules`]).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    /// Whether the role grants access.
    pub allow: bool,

    /// Replaces the query's `fields` when present.
    pub field_filter: Option<Vec<String>>,

    /// Conjoined with the query's selector when present.
    pub selector_append: Option<Selector>,
}
