use serde::Serialize;

use crate::{Error, Result};
use vitrine_domain::Cursor;

/// Resolved `from`/`size` of one request. `from >= 0`, `size > 0` and `from + size` fits in
/// an `i64` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
	pub from: i64,
	pub size: i64,
}
impl PageWindow {
	/// A non-empty `cursor` takes precedence over `first`/`size`. Negative offsets and empty
	/// sizes are clamped; a window whose end does not fit in an `i64` is rejected.
	pub fn resolve(
		first: Option<i64>,
		size: Option<i64>,
		cursor: Option<&str>,
		default_size: i64,
	) -> Result<Self> {
		let (mut from, mut size) = (first.unwrap_or(0), size.unwrap_or(default_size));
		let mut from_cursor = false;

		if let Some(token) = cursor.filter(|token| !token.trim().is_empty()) {
			let cursor = Cursor::decode(token)?;

			from = cursor.from;
			size = cursor.size;
			from_cursor = true;
		}
		if from < 0 {
			from = 0;
		}
		if size <= 0 {
			size = default_size;
		}

		let window = Self { from, size };

		match window.end() {
			Ok(_) => Ok(window),
			Err(Error::InvalidRequest { message }) if from_cursor => Err(Error::Cursor { message }),
			Err(err) => Err(err),
		}
	}

	fn end(self) -> Result<i64> {
		self.from.checked_add(self.size).ok_or_else(|| out_of_range(self))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
	pub has_next_page: bool,
	pub has_previous_page: bool,
	pub current_cursor: String,
	pub start_cursor: Option<String>,
	pub end_cursor: Option<String>,
}
impl PageInfo {
	/// The end cursor points at the last item shown, the start cursor one item before the
	/// previous page; both keep the page size.
	pub fn compute(total: i64, window: PageWindow) -> Result<Self> {
		let PageWindow { from, size } = window;
		let end = window.end()?;
		let has_next_page = total > end;
		let has_previous_page = from > 0;
		let end_cursor = if has_next_page {
			let next_from = (end - 1).min(total - 1);

			tracing::debug!(total, from, size, next_from, "Computed end cursor.");

			Some(Cursor::new(next_from, size).encode()?)
		} else {
			None
		};
		let start_cursor = if has_previous_page {
			let previous_from = from
				.checked_sub(size)
				.and_then(|start| start.checked_sub(1))
				.ok_or_else(|| out_of_range(window))?
				.max(-1);

			tracing::debug!(total, from, size, previous_from, "Computed start cursor.");

			Some(Cursor::new(previous_from, size).encode()?)
		} else {
			None
		};

		Ok(Self {
			has_next_page,
			has_previous_page,
			current_cursor: Cursor::new(from, size).encode()?,
			start_cursor,
			end_cursor,
		})
	}
}

fn out_of_range(window: PageWindow) -> Error {
	Error::InvalidRequest {
		message: format!(
			"page window from {} with size {} is out of range.",
			window.from, window.size
		),
	}
}
