//! Compiles generic filter terms and sort fields into backend form.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::{Error, Result, predicate::Predicate};
use vitrine_domain::{CombineMode, FilterTerm, SortField};

static NESTED_FIELD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\[([^\[\]]+)\]\.(.*)$").expect("nested field regex"));
static SORT_FIELD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]*$").expect("sort field regex"));

/// Compiles one term. `Ok(None)` means the term has no values and contributes nothing.
pub fn compile(term: &FilterTerm) -> Result<Option<Predicate>> {
	match term {
		FilterTerm::Exists { field } => {
			require_field(field)?;

			Ok(Some(Predicate::Exists { field: field.clone() }))
		},
		FilterTerm::BoolTerm { field, values, mode } => {
			require_field(field)?;

			if values.is_empty() {
				return Ok(None);
			}

			let per_value = match nested_field(field) {
				Some((path, rest)) => values
					.iter()
					.map(|value| Predicate::Nested {
						path: path.to_string(),
						query: Box::new(Predicate::Term {
							field: format!("{path}.{rest}"),
							value: value.clone(),
						}),
					})
					.collect(),
				None => values
					.iter()
					.map(|value| Predicate::Term { field: field.clone(), value: value.clone() })
					.collect(),
			};

			Ok(Some(match mode {
				CombineMode::And => Predicate::all(per_value),
				CombineMode::Or => Predicate::any(per_value),
			}))
		},
	}
}

/// Splits `[path].rest` into `(path, rest)`.
pub fn nested_field(field: &str) -> Option<(&str, &str)> {
	let captures = NESTED_FIELD.captures(field)?;

	Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Sort clauses in backend form. Field names outside `[A-Za-z0-9_.]` are rejected.
pub fn compile_sort(sort: &[SortField]) -> Result<Vec<Value>> {
	sort.iter()
		.map(|entry| {
			if !SORT_FIELD.is_match(&entry.field) {
				return Err(Error::FilterCompile {
					message: format!("invalid sort field '{}'.", entry.field),
				});
			}

			Ok(json!({ entry.field.clone(): { "order": entry.order.as_str() } }))
		})
		.collect()
}

fn require_field(field: &str) -> Result<()> {
	if field.trim().is_empty() {
		return Err(Error::FilterCompile { message: "filter field must be non-empty.".to_string() });
	}

	Ok(())
}
