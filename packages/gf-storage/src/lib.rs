pub mod db;
pub mod geography;
pub mod models;
pub mod queries;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Postgres SQLSTATE for a unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Whether `err` is a unique-constraint violation, which callers surface as a conflict.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
	err.as_database_error().and_then(|db_err| db_err.code()).is_some_and(|code| code == UNIQUE_VIOLATION)
}
