use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
	And,
	#[default]
	Or,
}

/// A generic filter over one document field.
///
/// `field` may use the nested form `[path].subfield`, which scopes each value test to the nested
/// objects under `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTerm {
	Exists {
		field: String,
	},
	#[serde(rename = "bool")]
	BoolTerm {
		field: String,
		#[serde(default)]
		values: Vec<String>,
		#[serde(default)]
		mode: CombineMode,
	},
}
impl FilterTerm {
	pub fn exists(field: impl Into<String>) -> Self {
		Self::Exists { field: field.into() }
	}

	pub fn all_of<I, S>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::BoolTerm {
			field: field.into(),
			values: values.into_iter().map(Into::into).collect(),
			mode: CombineMode::And,
		}
	}

	pub fn any_of<I, S>(field: impl Into<String>, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::BoolTerm {
			field: field.into(),
			values: values.into_iter().map(Into::into).collect(),
			mode: CombineMode::Or,
		}
	}

	pub fn field(&self) -> &str {
		match self {
			Self::Exists { field } | Self::BoolTerm { field, .. } => field,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
	pub field: String,
	pub name: String,
	#[serde(default = "default_min_doc_count")]
	pub min_doc_count: i64,
	#[serde(default = "default_term_size")]
	pub size: i64,
	#[serde(default)]
	pub include: Vec<String>,
}
impl TermSpec {
	pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
		Self {
			field: field.into(),
			name: name.into(),
			min_doc_count: default_min_doc_count(),
			size: default_term_size(),
			include: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRequest {
	pub term: TermSpec,
	pub filter: FilterTerm,
}
impl FacetRequest {
	pub fn name(&self) -> &str {
		&self.term.name
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}
impl SortOrder {
	/// Unknown spellings sort ascending.
	pub fn parse_lenient(raw: &str) -> Self {
		if raw.trim().eq_ignore_ascii_case("desc") { Self::Desc } else { Self::Asc }
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

impl<'de> Deserialize<'de> for SortOrder {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		Ok(Self::parse_lenient(&raw))
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
	pub field: String,
	#[serde(default)]
	pub order: SortOrder,
}

fn default_min_doc_count() -> i64 {
	1
}

fn default_term_size() -> i64 {
	10
}
