//! Service implementation for the static identity plugin.

use std::collections::HashMap;

use rbac_sdk::{IdentityError, IdentityProvider};
use tracing::debug;

use crate::config::{IdentityConfig, IdentityMode, StaticIdentityPluginConfig};

/// Resolves bearer tokens to callers from configuration.
///
/// In `accept_all` mode every non-empty token is the default identity; in
/// `static_tokens` mode only listed tokens resolve.
#[derive(Debug)]
pub struct Service {
    mode: IdentityMode,
    default_identity: IdentityConfig,
    token_map: HashMap<String, IdentityConfig>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticIdentityPluginConfig) -> Self {
        let token_map: HashMap<String, IdentityConfig> = cfg
            .tokens
            .iter()
            .map(|m| (m.token.clone(), m.identity.clone()))
            .collect();

        Self {
            mode: cfg.mode,
            default_identity: cfg.default_identity.clone(),
            token_map,
        }
    }

    /// Authenticate a token and return the identity.
    ///
    /// Returns `None` if the token is not recognized (in `static_tokens` mode)
    /// or empty.
    #[must_use]
    pub fn authenticate(&self, token: &str) -> Option<StaticIdentity> {
        if token.is_empty() {
            return None;
        }

        let identity = match self.mode {
            IdentityMode::AcceptAll => &self.default_identity,
            IdentityMode::StaticTokens => {
                let Some(identity) = self.token_map.get(token) else {
                    debug!("unknown static token");
                    return None;
                };
                identity
            }
        };

        Some(StaticIdentity(identity.clone()))
    }
}

/// Identity resolved from a static token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(IdentityConfig);

impl StaticIdentity {
    #[must_use]
    pub fn new(identity: IdentityConfig) -> Self {
        Self(identity)
    }

    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.0
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller_id(&self) -> Result<String, IdentityError> {
        Ok(self.0.caller_id.clone())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, IdentityError> {
        Ok(self.0.attributes.get(name).cloned())
    }
}
