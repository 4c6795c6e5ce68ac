//! Compilation of declarative rules into [`RuleFn`]s.
//!
//! A [`RuleConfig`] is a template. Its `selector_append` may contain string
//! leaves that are exactly one of the placeholders below; they are replaced
//! every time the rule is evaluated:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `${caller_id}` | the caller ID, as a string |
//! | `${roles}` | the caller's roles, as a list of strings |
//!
//! Placeholders embedded in longer strings are left alone.

use rbac_sdk::{Rule, RuleFn};
use rbac_security::{Selector, SelectorValue};
use tracing::warn;

use crate::config::RuleConfig;

pub const CALLER_ID_PLACEHOLDER: &str = "${caller_id}";
pub const ROLES_PLACEHOLDER: &str = "${roles}";

/// Compile `config` into a pure rule function.
///
/// `origin` names the rule in log messages (`role/resource/kind`).
#[must_use]
pub fn compile(config: &RuleConfig, origin: &str) -> RuleFn {
    if !config.allow {
        if config.field_filter.is_some() || config.selector_append.is_some() {
            warn!(
                rule = origin,
                "denying rule carries field_filter or selector_append; ignored"
            );
        }
        return RuleFn::constant(Rule::deny());
    }

    let field_filter = config.field_filter.clone();
    let Some(template) = config.selector_append.clone() else {
        return RuleFn::constant(Rule {
            allow: true,
            field_filter,
            selector_append: None,
        });
    };

    if !has_placeholder(&template) {
        return RuleFn::constant(Rule {
            allow: true,
            field_filter,
            selector_append: Some(template),
        });
    }

    RuleFn::new(move |caller_id, roles| Rule {
        allow: true,
        field_filter: field_filter.clone(),
        selector_append: Some(render(&template, caller_id, roles)),
    })
}

/// Substitute placeholders in `template` for one caller.
#[must_use]
pub fn render(template: &Selector, caller_id: &str, roles: &[String]) -> Selector {
    template
        .entries()
        .map(|(key, value)| (key, render_value(value, caller_id, roles)))
        .collect()
}

fn render_value(value: &SelectorValue, caller_id: &str, roles: &[String]) -> SelectorValue {
    match value {
        SelectorValue::String(s) if s == CALLER_ID_PLACEHOLDER => caller_id.into(),
        SelectorValue::String(s) if s == ROLES_PLACEHOLDER => SelectorValue::List(
            roles.iter().map(|r| SelectorValue::from(r.as_str())).collect(),
        ),
        SelectorValue::List(items) => SelectorValue::List(
            items
                .iter()
                .map(|item| render_value(item, caller_id, roles))
                .collect(),
        ),
        SelectorValue::Selector(nested) => render(nested, caller_id, roles).into(),
        other => other.clone(),
    }
}

fn has_placeholder(selector: &Selector) -> bool {
    selector.entries().any(|(_, value)| value_has_placeholder(value))
}

fn value_has_placeholder(value: &SelectorValue) -> bool {
    match value {
        SelectorValue::String(s) => s == CALLER_ID_PLACEHOLDER || s == ROLES_PLACEHOLDER,
        SelectorValue::List(items) => items.iter().any(value_has_placeholder),
        SelectorValue::Selector(nested) => has_placeholder(nested),
        SelectorValue::Null | SelectorValue::Bool(_) | SelectorValue::Number(_) => false,
    }
}
