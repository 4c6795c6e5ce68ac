//! Configuration for the static identity plugin.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Caller ID of the default identity.
pub const DEFAULT_CALLER_ID: &str = "anonymous";

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticIdentityPluginConfig {
    /// Authentication mode.
    pub mode: IdentityMode,

    /// Default identity returned in `accept_all` mode.
    pub default_identity: IdentityConfig,

    /// Static token-to-identity mappings for `static_tokens` mode.
    pub tokens: Vec<TokenMapping>,
}

impl Default for StaticIdentityPluginConfig {
    fn default() -> Self {
        Self {
            mode: IdentityMode::AcceptAll,
            default_identity: IdentityConfig::default(),
            tokens: Vec::new(),
        }
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    /// Accept any non-empty token and return the default identity.
    #[default]
    AcceptAll,
    /// Map specific tokens to specific identities.
    StaticTokens,
}

/// A caller as the plugin reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Caller identifier.
    pub caller_id: String,

    /// Identity attributes, e.g. `roles: "admin,user"`.
    pub attributes: BTreeMap<String, String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            caller_id: DEFAULT_CALLER_ID.to_owned(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Maps a static token to a specific identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    /// The token value to match.
    pub token: String,
    /// The identity to return when this token is presented.
    pub identity: IdentityConfig,
}
