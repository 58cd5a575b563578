pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("GF_PG_DSN is not a valid Postgres DSN: {0}.")]
	InvalidDsn(String),
	#[error("Test database {name}: {message}.")]
	Admin { name: String, message: String },

	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
