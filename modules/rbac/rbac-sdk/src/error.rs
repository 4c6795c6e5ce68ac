//! Error types for the RBAC engine.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;
use tracing_error::SpanTrace;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors an [`IdentityProvider`](crate::IdentityProvider) may report.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The caller could not be identified.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The identity source is not reachable.
    #[error("identity source unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of an [`AuthError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Identity lookup failed.
    Authentication,
    /// The roles attribute is missing on the identity.
    RolesNotFound,
    /// No held role grants the named operation.
    ContractDenied,
    /// No held role's rule allows the resource and operation kind.
    ResourceDenied,
    /// The caller-supplied query could not be parsed.
    QueryMalformed,
    /// The caller-supplied query does not name a resource.
    QueryMissingResource,
    /// The rewritten query could not be produced.
    Internal,
}

impl ErrorKind {
    /// Stable numeric error code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Authentication => 4011,
            Self::RolesNotFound => 4031,
            Self::ContractDenied => 4032,
            Self::ResourceDenied => 4033,
            Self::QueryMalformed => 4001,
            Self::QueryMissingResource => 4002,
            Self::Internal => 5001,
        }
    }

    /// Suggested HTTP status for transports that surface this error.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::Authentication => 401,
            Self::RolesNotFound | Self::ContractDenied | Self::ResourceDenied => 403,
            Self::QueryMalformed | Self::QueryMissingResource => 400,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authentication => "authentication",
            Self::RolesNotFound => "roles_not_found",
            Self::ContractDenied => "contract_denied",
            Self::ResourceDenied => "resource_denied",
            Self::QueryMalformed => "query_malformed",
            Self::QueryMissingResource => "query_missing_resource",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Authorization failure returned by [`AuthService`](crate::AuthService).
///
/// Carries a stable [`code`](Self::code), a suggested
/// [`status`](Self::status), a human-readable message, the underlying cause
/// (via [`std::error::Error::source`]) and the span trace active when the
/// error was created.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
    span_trace: SpanTrace,
}

impl AuthError {
    fn new(kind: ErrorKind, message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self {
            kind,
            message: message.into(),
            source,
            span_trace: SpanTrace::capture(),
        }
    }

    /// The identity provider failed to report the caller.
    #[must_use]
    pub fn authentication(cause: IdentityError) -> Self {
        Self::new(
            ErrorKind::Authentication,
            "User authentication failed",
            Some(Box::new(cause)),
        )
    }

    /// The identity does not carry `attribute`.
    #[must_use]
    pub fn roles_not_found(attribute: &str) -> Self {
        Self::new(
            ErrorKind::RolesNotFound,
            format!("User roles not found. `{attribute}` does not exist on identity"),
            None,
        )
    }

    #[must_use]
    pub fn contract_denied() -> Self {
        Self::new(
            ErrorKind::ContractDenied,
            "User doesn't have permission to invoke this function",
            None,
        )
    }

    #[must_use]
    pub fn resource_denied(resource: &str) -> Self {
        Self::new(
            ErrorKind::ResourceDenied,
            format!("User doesn't have permission to access resource `{resource}`"),
            None,
        )
    }

    #[must_use]
    pub fn query_malformed(cause: serde_json::Error) -> Self {
        Self::new(
            ErrorKind::QueryMalformed,
            "Query could not be parsed",
            Some(Box::new(cause)),
        )
    }

    /// The query selector has no string value under `field`.
    #[must_use]
    pub fn query_missing_resource(field: &str) -> Self {
        Self::new(
            ErrorKind::QueryMissingResource,
            format!("Query selector does not specify `{field}`"),
            None,
        )
    }

    #[must_use]
    pub fn internal(cause: impl Into<BoxError>) -> Self {
        Self::new(
            ErrorKind::Internal,
            "Query could not be serialized",
            Some(cause.into()),
        )
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Stable numeric error code, see [`ErrorKind::code`].
    #[must_use]
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Suggested HTTP status, see [`ErrorKind::status`].
    #[must_use]
    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Span context captured when the error was created.
    ///
    /// Empty unless the subscriber has a `tracing_error::ErrorLayer`.
    #[must_use]
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}
