//! Policy Enforcement Point (`PEP`) object.
//!
//! [`AuthService`] binds a resolved caller to a shared permission table and
//! answers two questions:
//!
//! - may the caller invoke a named operation ([`AuthService::validate_contract_perms`]);
//! - may the caller read a resource, and under which rewrite of the query
//!   ([`AuthService::validate_resource_perms`]).
//!
//! Roles are tried in the order the identity reported them. The first role
//! that grants wins; later roles are never consulted.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rbac_security::constants::DEFAULT_RESOURCE_FIELD;
use rbac_security::{CallerContext, Query, parse_roles};
use tracing::debug;

use crate::api::IdentityProvider;
use crate::error::AuthError;
use crate::models::RolePermissions;
use crate::pep::compiler::apply_rule;

/// Authorization engine for one caller.
///
/// Immutable once built. The permission table is shared by `Arc`, so any
/// number of engines (one per request) can be created from the same table.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use rbac_sdk::{AuthService, Permissions, RolePermissions, Rule, RuleFn};
/// use rbac_security::{CallerContext, Query, Selector};
///
/// let mut table: RolePermissions = RolePermissions::new();
/// table.insert(
///     "user".to_owned(),
///     Permissions::new().contract("createWallet").resource(
///         "wallet",
///         "query",
///         RuleFn::new(|caller_id, _| {
///             Rule::allow().with_selector_append(Selector::new().with("createdBy", caller_id))
///         }),
///     ),
/// );
///
/// let caller = CallerContext::builder().caller_id("u1").role("user").build();
/// let auth = AuthService::from_context(caller, Arc::new(table));
///
/// auth.validate_contract_perms("createWallet").unwrap();
///
/// let query = Query::new(Selector::new().with("docType", "wallet"));
/// let query = auth.validate_resource_perms("wallet", "query", query).unwrap();
/// assert_eq!(
///     query.selector.to_string(),
///     r#"{"$and":[{"docType":"wallet"},{"createdBy":"u1"}]}"#,
/// );
/// ```
pub struct AuthService<O = String> {
    context: CallerContext,
    permissions: Arc<RolePermissions<O>>,
    resource_field: String,
}

impl<O: Eq + Hash> AuthService<O> {
    /// Resolve the caller from `identity` and bind it to `permissions`.
    ///
    /// Roles are read from the attribute `roles_attribute` and split on
    /// commas (see [`parse_roles`]).
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Authentication`](crate::ErrorKind::Authentication) if the provider fails
    /// - [`ErrorKind::RolesNotFound`](crate::ErrorKind::RolesNotFound) if the attribute is absent
    pub fn new<I>(
        identity: &I,
        permissions: Arc<RolePermissions<O>>,
        roles_attribute: &str,
    ) -> Result<Self, AuthError>
    where
        I: IdentityProvider + ?Sized,
    {
        let caller_id = identity.caller_id().map_err(AuthError::authentication)?;
        let raw_roles = identity
            .attribute(roles_attribute)
            .map_err(AuthError::authentication)?
            .ok_or_else(|| AuthError::roles_not_found(roles_attribute))?;

        let context = CallerContext::builder()
            .caller_id(caller_id)
            .roles(parse_roles(&raw_roles))
            .build();

        debug!(
            caller_id = context.caller_id(),
            roles = context.roles().len(),
            "caller resolved"
        );

        Ok(Self::from_context(context, permissions))
    }

    /// Bind an already-resolved caller to `permissions`.
    #[must_use]
    pub fn from_context(context: CallerContext, permissions: Arc<RolePermissions<O>>) -> Self {
        Self {
            context,
            permissions,
            resource_field: DEFAULT_RESOURCE_FIELD.to_owned(),
        }
    }

    /// Override the selector key that names the resource in raw queries.
    #[must_use]
    pub fn with_resource_field(mut self, field: impl Into<String>) -> Self {
        self.resource_field = field.into();
        self
    }

    #[must_use]
    pub fn caller_id(&self) -> &str {
        self.context.caller_id()
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.context.roles()
    }

    #[must_use]
    pub fn context(&self) -> &CallerContext {
        &self.context
    }

    #[must_use]
    pub fn resource_field(&self) -> &str {
        &self.resource_field
    }

    /// Check that some held role grants `operation`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ContractDenied`](crate::ErrorKind::ContractDenied) if no role does,
    /// including when the operation or the role is unknown to the table.
    pub fn validate_contract_perms<Q>(&self, operation: &Q) -> Result<(), AuthError>
    where
        O: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let granted = self.roles().iter().any(|role| {
            self.permissions
                .get(role)
                .and_then(|perms| perms.contracts.get(operation))
                .copied()
                .unwrap_or(false)
        });

        if granted {
            return Ok(());
        }

        debug!(
            caller_id = self.caller_id(),
            ?operation,
            "operation denied"
        );
        Err(AuthError::contract_denied())
    }

    /// Run `executor` only if the caller may invoke `operation`.
    ///
    /// The executor receives `args` and this engine, so it can perform
    /// resource checks of its own. Its result is returned verbatim.
    ///
    /// # Errors
    ///
    /// The contract denial (converted into `E`) or whatever the executor returns.
    pub fn with_auth<Q, A, E, F>(&self, operation: &Q, args: A, executor: F) -> Result<Vec<u8>, E>
    where
        O: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
        E: From<AuthError>,
        F: FnOnce(A, &Self) -> Result<Vec<u8>, E>,
    {
        self.validate_contract_perms(operation)?;
        executor(args, self)
    }

    /// Authorize `kind` access to `resource` and rewrite `query` accordingly.
    ///
    /// The first held role whose rule allows decides; its rule is applied
    /// with [`apply_rule`].
    ///
    /// # Errors
    ///
    /// [`ErrorKind::ResourceDenied`](crate::ErrorKind::ResourceDenied) if no role's rule allows.
    pub fn validate_resource_perms(
        &self,
        resource: &str,
        kind: &str,
        query: Query,
    ) -> Result<Query, AuthError> {
        for role in self.roles() {
            let Some(rule_fn) = self
                .permissions
                .get(role)
                .and_then(|perms| perms.rule(resource, kind))
            else {
                continue;
            };

            let rule = rule_fn.evaluate(self.caller_id(), self.roles());
            if !rule.allow {
                continue;
            }

            debug!(
                caller_id = self.caller_id(),
                role = role.as_str(),
                resource,
                kind,
                "resource access granted"
            );
            return Ok(apply_rule(query, &rule));
        }

        debug!(
            caller_id = self.caller_id(),
            resource,
            kind,
            "resource access denied"
        );
        Err(AuthError::resource_denied(resource))
    }

    /// Authorize a raw JSON query and return the rewritten query as JSON.
    ///
    /// The resource is the string value of the selector's resource field
    /// (`docType` unless overridden with [`Self::with_resource_field`]).
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::QueryMalformed`](crate::ErrorKind::QueryMalformed) if `raw` does not parse
    /// - [`ErrorKind::QueryMissingResource`](crate::ErrorKind::QueryMissingResource) if the resource field is missing or not a string
    /// - [`ErrorKind::ResourceDenied`](crate::ErrorKind::ResourceDenied) as for [`Self::validate_resource_perms`]
    /// - [`ErrorKind::Internal`](crate::ErrorKind::Internal) if the rewritten query cannot be serialized
    pub fn validate_query_perms(&self, raw: &str, kind: &str) -> Result<String, AuthError> {
        let query = Query::from_json(raw).map_err(AuthError::query_malformed)?;
        let resource = query
            .resource(&self.resource_field)
            .ok_or_else(|| AuthError::query_missing_resource(&self.resource_field))?
            .to_owned();

        let query = self.validate_resource_perms(&resource, kind, query)?;
        query.to_json().map_err(AuthError::internal)
    }
}

impl<O> fmt::Debug for AuthService<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("context", &self.context)
            .field("resource_field", &self.resource_field)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashMap;
    use std::error::Error as _;

    use rbac_security::Selector;
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::{ErrorKind, IdentityError};
    use crate::models::{Permissions, Rule, RuleFn};

    struct MockIdentity {
        caller_id: Result<String, ()>,
        attributes: Result<HashMap<String, String>, ()>,
    }

    impl MockIdentity {
        fn with_roles(caller_id: &str, roles: &str) -> Self {
            Self {
                caller_id: Ok(caller_id.to_owned()),
                attributes: Ok(HashMap::from([("roles".to_owned(), roles.to_owned())])),
            }
        }
    }

    impl IdentityProvider for MockIdentity {
        fn caller_id(&self) -> Result<String, IdentityError> {
            self.caller_id
                .clone()
                .map_err(|()| IdentityError::Unauthorized("no certificate".to_owned()))
        }

        fn attribute(&self, name: &str) -> Result<Option<String>, IdentityError> {
            self.attributes
                .as_ref()
                .map(|attrs| attrs.get(name).cloned())
                .map_err(|()| IdentityError::Unavailable("attribute store".to_owned()))
        }
    }

    fn table() -> Arc<RolePermissions> {
        let mut table: RolePermissions = RolePermissions::new();
        table.insert(
            "admin".to_owned(),
            Permissions::new()
                .contract("createTransfer")
                .resource(
                    "asset",
                    "query",
                    RuleFn::constant(Rule::allow().with_field_filter(["createdBy", "created"])),
                )
                .resource("transfer", "query", RuleFn::constant(Rule::allow())),
        );
        table.insert(
            "user".to_owned(),
            Permissions::new()
                .contract("createWallet")
                .resource(
                    "wallet",
                    "query",
                    RuleFn::new(|caller_id, _| {
                        Rule::allow()
                            .with_selector_append(Selector::new().with("createdBy", caller_id))
                    }),
                )
                .resource("transfer", "query", RuleFn::constant(Rule::deny())),
        );
        Arc::new(table)
    }

    fn service(roles: &str) -> AuthService {
        AuthService::new(&MockIdentity::with_roles("u1", roles), table(), "roles").unwrap()
    }

    #[test]
    fn new_reads_caller_and_roles() {
        let auth = service("user, admin");

        assert_eq!(auth.caller_id(), "u1");
        assert_eq!(auth.roles(), &["user", "admin"]);
        assert_eq!(auth.resource_field(), "docType");
    }

    #[test]
    fn new_fails_when_caller_id_unavailable() {
        let identity = MockIdentity {
            caller_id: Err(()),
            attributes: Ok(HashMap::new()),
        };

        let err = AuthService::new(&identity, table(), "roles").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.status(), 401);
        assert!(err.source().is_some());
    }

    #[test]
    fn new_fails_when_attribute_lookup_fails() {
        let identity = MockIdentity {
            caller_id: Ok("u1".to_owned()),
            attributes: Err(()),
        };

        let err = AuthService::new(&identity, table(), "roles").unwrap_err();

        assert_eq!(err.code(), 4011);
    }

    #[test]
    fn new_fails_when_roles_attribute_missing() {
        let identity = MockIdentity::with_roles("u1", "user");

        let err = AuthService::new(&identity, table(), "groups").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RolesNotFound);
        assert_eq!(err.code(), 4031);
        assert_eq!(err.status(), 403);
        assert!(err.message().contains("`groups`"));
    }

    #[test]
    fn empty_roles_attribute_denies_everything() {
        let auth = service("");

        assert!(auth.roles().is_empty());
        assert!(auth.validate_contract_perms("createWallet").is_err());
    }

    #[test]
    fn contract_granted_by_any_role() {
        assert!(service("admin").validate_contract_perms("createTransfer").is_ok());
        assert!(service("user,admin").validate_contract_perms("createTransfer").is_ok());
    }

    #[test]
    fn contract_denied_without_grant() {
        let err = service("user")
            .validate_contract_perms("createTransfer")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ContractDenied);
        assert_eq!(err.code(), 4032);
    }

    #[test]
    fn contract_denied_for_unknown_operation_and_role() {
        assert!(service("admin").validate_contract_perms("burn").is_err());
        assert!(service("auditor").validate_contract_perms("createTransfer").is_err());
    }

    #[test]
    fn contract_explicitly_false_is_denied() {
        let mut table: RolePermissions = RolePermissions::new();
        let mut perms = Permissions::new();
        perms.contracts.insert("createWallet".to_owned(), false);
        table.insert("user".to_owned(), perms);
        let caller = CallerContext::builder().caller_id("u1").role("user").build();

        let auth = AuthService::from_context(caller, Arc::new(table));

        assert!(auth.validate_contract_perms("createWallet").is_err());
    }

    #[test]
    fn with_auth_runs_executor_when_granted() {
        let auth = service("user");

        let out: Result<Vec<u8>, AuthError> =
            auth.with_auth("createWallet", vec!["w1".to_owned()], |args, auth| {
                Ok(format!("{}:{}", auth.caller_id(), args[0]).into_bytes())
            });

        assert_eq!(out.unwrap(), b"u1:w1");
    }

    #[test]
    fn with_auth_skips_executor_when_denied() {
        let auth = service("user");
        let mut called = false;

        let out: Result<Vec<u8>, AuthError> = auth.with_auth("createTransfer", (), |(), _| {
            called = true;
            Ok(Vec::new())
        });

        assert_eq!(out.unwrap_err().kind(), ErrorKind::ContractDenied);
        assert!(!called);
    }

    #[test]
    fn with_auth_returns_executor_error_verbatim() {
        #[derive(Debug)]
        enum AppError {
            Auth(ErrorKind),
            NotFound,
        }

        impl From<AuthError> for AppError {
            fn from(e: AuthError) -> Self {
                Self::Auth(e.kind())
            }
        }

        let auth = service("user");

        let err = auth
            .with_auth("createWallet", (), |(), _| Err(AppError::NotFound))
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));

        let err = auth
            .with_auth("createTransfer", (), |(), _| Ok::<_, AppError>(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(ErrorKind::ContractDenied)));
    }

    #[test]
    fn executor_can_check_resources() {
        let auth = service("user");

        let out: Result<Vec<u8>, AuthError> = auth.with_auth("createWallet", (), |(), auth| {
            let q = Query::new(Selector::new().with("docType", "wallet"));
            let q = auth.validate_resource_perms("wallet", "query", q)?;
            Ok(q.to_json().unwrap_or_default().into_bytes())
        });

        let body = String::from_utf8(out.unwrap()).unwrap();
        assert!(body.contains("createdBy"));
    }

    #[test]
    fn resource_selector_append() {
        let query = Query::new(Selector::new().with("docType", "wallet")).with_limit(10);

        let out = service("user")
            .validate_resource_perms("wallet", "query", query)
            .unwrap();

        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({
                "selector": {"$and": [{"docType": "wallet"}, {"createdBy": "u1"}]},
                "limit": 10
            })
        );
    }

    #[test]
    fn resource_field_filter() {
        let query = Query::new(Selector::new().with("docType", "asset"));

        let out = service("admin")
            .validate_resource_perms("asset", "query", query)
            .unwrap();

        assert_eq!(out.selector, Selector::new().with("docType", "asset"));
        assert_eq!(
            out.fields,
            Some(vec!["createdBy".to_owned(), "created".to_owned()])
        );
    }

    #[test]
    fn resource_denied_without_rule() {
        let err = service("user")
            .validate_resource_perms("asset", "query", Query::default())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceDenied);
        assert_eq!(err.code(), 4033);
        assert!(err.message().contains("`asset`"));
    }

    #[test]
    fn resource_denied_for_unknown_kind() {
        assert!(
            service("user")
                .validate_resource_perms("wallet", "delete", Query::default())
                .is_err()
        );
    }

    #[test]
    fn denying_role_falls_through_to_next() {
        let out = service("user,admin")
            .validate_resource_perms("transfer", "query", Query::default())
            .unwrap();

        assert_eq!(out, Query::default());
    }

    #[test]
    fn first_allowing_role_decides() {
        let mut table: RolePermissions = RolePermissions::new();
        table.insert(
            "a".to_owned(),
            Permissions::new().resource(
                "doc",
                "query",
                RuleFn::constant(Rule::allow().with_field_filter(["from_a"])),
            ),
        );
        table.insert(
            "b".to_owned(),
            Permissions::new().resource(
                "doc",
                "query",
                RuleFn::constant(Rule::allow().with_field_filter(["from_b"])),
            ),
        );
        let table = Arc::new(table);
        let declared = CallerContext::builder().caller_id("u").role("a").role("b").build();
        let reversed = CallerContext::builder().caller_id("u").role("b").role("a").build();

        let first = AuthService::from_context(declared, Arc::clone(&table))
            .validate_resource_perms("doc", "query", Query::default())
            .unwrap();
        let second = AuthService::from_context(reversed, table)
            .validate_resource_perms("doc", "query", Query::default())
            .unwrap();

        assert_eq!(first.fields, Some(vec!["from_a".to_owned()]));
        assert_eq!(second.fields, Some(vec!["from_b".to_owned()]));
    }

    #[test]
    fn resource_check_is_idempotent() {
        let auth = service("user");
        let query = Query::new(Selector::new().with("docType", "wallet"));

        let first = auth
            .validate_resource_perms("wallet", "query", query.clone())
            .unwrap();
        let second = auth
            .validate_resource_perms("wallet", "query", query)
            .unwrap();

        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn rule_receives_all_held_roles() {
        let mut table: RolePermissions = RolePermissions::new();
        table.insert(
            "user".to_owned(),
            Permissions::new().resource(
                "doc",
                "query",
                RuleFn::new(|_, roles| Rule {
                    allow: roles.iter().any(|r| r == "verified"),
                    ..Rule::default()
                }),
            ),
        );
        let table = Arc::new(table);
        let plain = CallerContext::builder().caller_id("u").role("user").build();
        let verified = CallerContext::builder()
            .caller_id("u")
            .role("user")
            .role("verified")
            .build();

        assert!(
            AuthService::from_context(plain, Arc::clone(&table))
                .validate_resource_perms("doc", "query", Query::default())
                .is_err()
        );
        assert!(
            AuthService::from_context(verified, table)
                .validate_resource_perms("doc", "query", Query::default())
                .is_ok()
        );
    }

    #[test]
    fn raw_query_is_rewritten() {
        let out = service("user")
            .validate_query_perms(r#"{"selector":{"docType":"wallet"},"limit":10}"#, "query")
            .unwrap();

        assert_eq!(
            out,
            r#"{"selector":{"$and":[{"docType":"wallet"},{"createdBy":"u1"}]},"limit":10}"#
        );
    }

    #[test]
    fn raw_query_malformed() {
        let err = service("user")
            .validate_query_perms("{not json", "query")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryMalformed);
        assert_eq!(err.code(), 4001);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn raw_query_without_resource() {
        let err = service("user")
            .validate_query_perms(r#"{"selector":{"createdBy":"u1"}}"#, "query")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryMissingResource);
        assert_eq!(err.code(), 4002);
    }

    #[test]
    fn raw_query_with_non_string_resource() {
        let err = service("user")
            .validate_query_perms(r#"{"selector":{"docType":7}}"#, "query")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryMissingResource);
    }

    #[test]
    fn raw_query_uses_configured_resource_field() {
        let auth = service("user").with_resource_field("type");

        let out = auth
            .validate_query_perms(r#"{"selector":{"type":"wallet"}}"#, "query")
            .unwrap();
        assert!(out.contains("createdBy"));

        let err = auth
            .validate_query_perms(r#"{"selector":{"docType":"wallet"}}"#, "query")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QueryMissingResource);
    }

    #[test]
    fn raw_query_denied() {
        let err = service("admin")
            .validate_query_perms(r#"{"selector":{"docType":"wallet"}}"#, "query")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ResourceDenied);
    }

    #[test]
    #[traced_test]
    fn denials_are_logged() {
        let auth = service("user");

        assert!(auth.validate_contract_perms("createTransfer").is_err());
        assert!(
            auth.validate_resource_perms("asset", "query", Query::default())
                .is_err()
        );

        assert!(logs_contain("operation denied"));
        assert!(logs_contain("resource access denied"));
    }

    #[test]
    fn engine_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthService>();
    }
}
