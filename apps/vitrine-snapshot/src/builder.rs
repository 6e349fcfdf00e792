//! Converts a JSON-lines export into snapshot entries.

use std::io::BufRead;

use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};
use vitrine_storage::snapshot::SnapshotWriter;

#[derive(Debug, Deserialize)]
struct ExportRecord {
	id: String,
	source: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
	pub written: usize,
	/// Records left alone because the entry already existed.
	pub skipped: usize,
}

/// Writes every record of `input`. Blank lines are ignored; any malformed record aborts the import.
pub fn import(input: impl BufRead, writer: &SnapshotWriter, overwrite: bool) -> Result<ImportReport> {
	let mut report = ImportReport::default();

	for (index, line) in input.lines().enumerate() {
		let line = line?;

		if line.trim().is_empty() {
			continue;
		}

		let number = index + 1;
		let record: ExportRecord = serde_json::from_str(&line)
			.map_err(|source| Error::Record { line: number, source })?;

		if record.id.trim().is_empty() {
			return Err(Error::Validation(format!("Line {number} has an empty id.")));
		}
		if !record.source.is_object() {
			return Err(Error::Validation(format!(
				"Line {number} source for '{}' must be a JSON object.",
				record.id
			)));
		}

		if writer.put(&record.id, &record.source, overwrite)? {
			report.written += 1;
		} else {
			tracing::debug!(id = %record.id, "Kept existing snapshot entry.");

			report.skipped += 1;
		}
	}

	Ok(report)
}
