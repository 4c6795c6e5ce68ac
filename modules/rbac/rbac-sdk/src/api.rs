//! Identity provider contract.

use crate::error::IdentityError;

/// Source of the caller's identity.
///
/// Implemented by whatever authenticated the caller (certificate attributes,
/// a token introspection result, a static test fixture). The engine reads it
/// once, at construction.
pub trait IdentityProvider {
    /// Caller identifier.
    ///
    /// # Errors
    ///
    /// Any [`IdentityError`] when the caller cannot be identified.
    fn caller_id(&self) -> Result<String, IdentityError>;

    /// Value of the identity attribute `name`.
    ///
    /// Returns `Ok(None)` when the identity does not carry the attribute.
    ///
    /// # Errors
    ///
    /// Any [`IdentityError`] when the lookup itself fails.
    fn attribute(&self, name: &str) -> Result<Option<String>, IdentityError>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn caller_id(&self) -> Result<String, IdentityError> {
        (**self).caller_id()
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, IdentityError> {
        (**self).attribute(name)
    }
}
