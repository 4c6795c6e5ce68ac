//! Permission table and rule model.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rbac_security::Selector;

/// Outcome of evaluating a [`RuleFn`] for one caller.
///
/// `field_filter` and `selector_append` only matter when `allow` is `true`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    /// Whether the role grants access at all.
    pub allow: bool,
    /// Replaces the query's `fields` when present.
    pub field_filter: Option<Vec<String>>,
    /// Conjoined with the query's selector when present and non-empty.
    pub selector_append: Option<Selector>,
}

impl Rule {
    /// A rule that grants access without constraints.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allow: true,
            ..Self::default()
        }
    }

    /// A rule that grants nothing.
    #[must_use]
    pub fn deny() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field_filter<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_filter = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_selector_append(mut self, selector: Selector) -> Self {
        self.selector_append = Some(selector);
        self
    }
}

type RuleCallback = dyn Fn(&str, &[String]) -> Rule + Send + Sync;

/// Caller-aware rule: `(caller_id, roles) -> Rule`.
///
/// The wrapped function must be pure; the engine calls it once per role
/// attempt and never caches the result.
#[derive(Clone)]
pub struct RuleFn(Arc<RuleCallback>);

impl RuleFn {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &[String]) -> Rule + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// A rule function that ignores the caller and always yields `rule`.
    #[must_use]
    pub fn constant(rule: Rule) -> Self {
        Self::new(move |_, _| rule.clone())
    }

    #[must_use]
    pub fn evaluate(&self, caller_id: &str, roles: &[String]) -> Rule {
        (self.0)(caller_id, roles)
    }
}

impl fmt::Debug for RuleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RuleFn(..)")
    }
}

/// Operation name -> granted. A missing entry means not granted.
pub type ContractPermissions<O = String> = HashMap<O, bool>;

/// Resource -> operation kind -> rule.
pub type ResourcePermissions = HashMap<String, HashMap<String, RuleFn>>;

/// Everything a single role grants.
#[derive(Clone, Debug)]
pub struct Permissions<O = String> {
    pub contracts: ContractPermissions<O>,
    pub resources: ResourcePermissions,
}

impl<O> Default for Permissions<O> {
    fn default() -> Self {
        Self {
            contracts: HashMap::new(),
            resources: HashMap::new(),
        }
    }
}

impl<O: Eq + Hash> Permissions<O> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant invocation of `operation`.
    #[must_use]
    pub fn contract(mut self, operation: impl Into<O>) -> Self {
        self.contracts.insert(operation.into(), true);
        self
    }

    /// Register `rule` for `kind` access to `resource`, replacing any previous one.
    #[must_use]
    pub fn resource(
        mut self,
        resource: impl Into<String>,
        kind: impl Into<String>,
        rule: RuleFn,
    ) -> Self {
        self.resources
            .entry(resource.into())
            .or_default()
            .insert(kind.into(), rule);
        self
    }

    /// The rule registered for `kind` access to `resource`, if any.
    #[must_use]
    pub fn rule(&self, resource: &str, kind: &str) -> Option<&RuleFn> {
        self.resources.get(resource)?.get(kind)
    }
}

/// Role -> permissions. Built once and shared read-only between engines.
pub type RolePermissions<O = String> = HashMap<String, Permissions<O>>;
