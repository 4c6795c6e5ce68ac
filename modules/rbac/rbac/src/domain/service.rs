//! Configured RBAC service.

use std::sync::Arc;

use rbac_sdk::{AuthError, AuthService, IdentityProvider, Permissions, RolePermissions};
use tracing::debug;

use crate::config::{RbacConfig, RoleConfig};
use crate::domain::rules;

/// Permission table compiled from [`RbacConfig`], plus the engine settings.
///
/// Build once at startup; call [`Service::authorize`] per request.
#[derive(Clone, Debug)]
pub struct Service {
    permissions: Arc<RolePermissions>,
    roles_attribute: String,
    resource_field: String,
}

impl Service {
    /// Create a service from configuration.
    #[must_use]
    pub fn from_config(cfg: &RbacConfig) -> Self {
        let permissions = permission_table(cfg);

        debug!(
            roles = permissions.len(),
            roles_attribute = cfg.roles_attribute.as_str(),
            "permission table compiled"
        );

        Self {
            permissions: Arc::new(permissions),
            roles_attribute: cfg.roles_attribute.clone(),
            resource_field: cfg.resource_field.clone(),
        }
    }

    /// Resolve the caller from `identity` and return an engine bound to it.
    ///
    /// # Errors
    ///
    /// As for [`AuthService::new`].
    pub fn authorize<I>(&self, identity: &I) -> Result<AuthService, AuthError>
    where
        I: IdentityProvider + ?Sized,
    {
        AuthService::new(identity, Arc::clone(&self.permissions), &self.roles_attribute)
            .map(|auth| auth.with_resource_field(self.resource_field.as_str()))
    }

    #[must_use]
    pub fn permissions(&self) -> &Arc<RolePermissions> {
        &self.permissions
    }

    #[must_use]
    pub fn roles_attribute(&self) -> &str {
        &self.roles_attribute
    }

    #[must_use]
    pub fn resource_field(&self) -> &str {
        &self.resource_field
    }
}

/// Compile every role of `cfg` into a permission table.
#[must_use]
pub fn permission_table(cfg: &RbacConfig) -> RolePermissions {
    cfg.roles
        .iter()
        .map(|(role, role_cfg)| (role.clone(), compile_role(role, role_cfg)))
        .collect()
}

fn compile_role(role: &str, cfg: &RoleConfig) -> Permissions {
    let mut permissions = Permissions::new();
    permissions.contracts = cfg
        .contracts
        .iter()
        .map(|(operation, granted)| (operation.clone(), *granted))
        .collect();

    for (resource, kinds) in &cfg.resources {
        for (kind, rule) in kinds {
            let origin = format!("{role}/{resource}/{kind}");
            permissions = permissions.resource(resource, kind, rules::compile(rule, &origin));
        }
    }
    permissions
}

impl RbacConfig {
    /// Compile the configured roles into a permission table.
    #[must_use]
    pub fn permission_table(&self) -> RolePermissions {
        permission_table(self)
    }

    /// Resolve the caller from `identity` using the configured roles
    /// attribute and resource field.
    ///
    /// Compiles the table on every call; hold a [`Service`] to share one.
    ///
    /// # Errors
    ///
    /// As for [`AuthService::new`].
    pub fn authorize<I>(&self, identity: &I) -> Result<AuthService, AuthError>
    where
        I: IdentityProvider + ?Sized,
    {
        Service::from_config(self).authorize(identity)
    }
}
