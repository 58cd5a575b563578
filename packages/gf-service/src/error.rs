use gf_domain::{rules::RuleViolation, search_params::ParamError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid {field}: {message}")]
	InvalidField { field: String, message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}

	pub(crate) fn conflict(message: impl Into<String>) -> Self {
		Self::Conflict { message: message.into() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		if gf_storage::is_unique_violation(&err) {
			return Self::Conflict { message: err.to_string() };
		}

		Self::Storage { message: err.to_string() }
	}
}

impl From<gf_storage::Error> for Error {
	fn from(err: gf_storage::Error) -> Self {
		match err {
			gf_storage::Error::Sqlx(inner) => inner.into(),
			gf_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			not_found @ gf_storage::Error::NotFound { .. } =>
				Self::NotFound { message: not_found.to_string() },
		}
	}
}

impl From<gf_providers::Error> for Error {
	fn from(err: gf_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<RuleViolation> for Error {
	fn from(err: RuleViolation) -> Self {
		Self::InvalidField { field: err.field, message: err.message }
	}
}

impl From<ParamError> for Error {
	fn from(err: ParamError) -> Self {
		Self::InvalidField { field: err.param, message: err.message }
	}
}
