//! Well-known names shared by the engine and its configuration layer.

/// Identity attribute that carries the caller's roles.
pub const DEFAULT_ROLES_ATTRIBUTE: &str = "roles";

/// Separator between roles inside the roles attribute value.
pub const ROLE_DELIMITER: char = ',';

/// Selector key that names the queried document type.
pub const DEFAULT_RESOURCE_FIELD: &str = "docType";

/// Logical conjunction combinator.
pub const AND: &str = "$and";

/// Logical disjunction combinator.
pub const OR: &str = "$or";
