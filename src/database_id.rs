//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a department.
pub type DepartmentId = DatabaseId;

/// The ID of a transaction.
pub type TransactionId = DatabaseId;
