//! PEP (Policy Enforcement Point) helpers.
//!
//! - [`AuthService`] - PEP object (resolve caller, check operations, rewrite queries)
//! - [`apply_rule`] - Low-level: fold an allowing rule into a query

pub mod compiler;
pub mod enforcer;

pub use compiler::apply_rule;
pub use enforcer::AuthService;
