//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value has the wrong shape.
    #[error("failed to load RBAC configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    /// The configuration parsed but is not usable.
    #[error("invalid RBAC configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}
