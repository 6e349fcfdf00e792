use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("I/O error at {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Index responded with status {status}: {body}")]
	Status { status: u16, body: String },
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Index failed to read document '{id}': {reason}")]
	Document { id: String, reason: String },
}
impl Error {
	/// True when the failure concerns the payload rather than the transport.
	pub fn is_decode(&self) -> bool {
		matches!(self, Self::SerdeJson(_) | Self::InvalidResponse(_))
	}
}
