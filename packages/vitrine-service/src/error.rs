pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Missing identity: {message}")]
	AuthContext { message: String },
	#[error("Filter compile error: {message}")]
	FilterCompile { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Backend error during {operation}: {message}")]
	Backend { operation: String, message: String },
	#[error("Decode error: {message}")]
	Decode { message: String },
	#[error("Invalid cursor: {message}")]
	Cursor { message: String },
	#[error("{operation} is not supported by the {backend} backend.")]
	Unsupported { operation: String, backend: String },
	#[error("{operation} was cancelled.")]
	Cancelled { operation: String },
	#[error("{operation} exceeded its deadline.")]
	DeadlineExceeded { operation: String },
}
impl Error {
	/// Wraps a backend failure. Payload problems become [`Error::Decode`], everything else
	/// [`Error::Backend`].
	pub fn backend(operation: impl Into<String>, err: vitrine_storage::Error) -> Self {
		let operation = operation.into();

		if err.is_decode() {
			Self::Decode { message: format!("{operation}: {err}") }
		} else {
			Self::Backend { operation, message: err.to_string() }
		}
	}
}

impl From<vitrine_domain::CursorError> for Error {
	fn from(err: vitrine_domain::CursorError) -> Self {
		Self::Cursor { message: err.to_string() }
	}
}
