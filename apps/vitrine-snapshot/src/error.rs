pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Validation(String),
	#[error("Line {line} is not a valid export record: {source}")]
	Record { line: usize, source: serde_json::Error },
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Storage(#[from] vitrine_storage::Error),
}
