//! Opaque pagination tokens.
//!
//! A token is the standard base64 encoding of `{"from":<i64>,"size":<i64>}`. The encoding carries
//! no process state, so tokens stay valid across restarts. `from` may be `-1` for the start cursor
//! of the second page; consumers clamp it before use.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
	#[error("cursor is not valid base64: {0}")]
	Base64(#[from] base64::DecodeError),
	#[error("cursor payload is malformed: {0}")]
	Payload(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
	pub from: i64,
	pub size: i64,
}
impl Cursor {
	pub fn new(from: i64, size: i64) -> Self {
		Self { from, size }
	}

	pub fn encode(&self) -> Result<String, CursorError> {
		let raw = serde_json::to_vec(self)?;

		Ok(STANDARD.encode(raw))
	}

	pub fn decode(token: &str) -> Result<Self, CursorError> {
		let raw = STANDARD.decode(token.trim())?;

		Ok(serde_json::from_slice(&raw)?)
	}
}
