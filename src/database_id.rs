//! Defines the integer type used for database row IDs.

/// Alias for the integer type used for mapping to database IDs.
///
/// SQLite assigns these from an `AUTOINCREMENT` column, so valid IDs are
/// positive and never reused for the lifetime of a database file.
pub type DatabaseID = i64;
