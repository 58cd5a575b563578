use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("No {record} with id {id}.")]
	NotFound { record: &'static str, id: String },
}
impl Error {
	pub(crate) fn missing(record: &'static str, id: impl Display) -> Self {
		Self::NotFound { record, id: id.to_string() }
	}
}
