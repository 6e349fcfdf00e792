//! Stored corpus records as the search backend returns them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reference type that points at another document by signature.
pub const SIGNATURE_REFERENCE: &str = "signature";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDocument {
	/// Backend key. Not part of the stored payload.
	#[serde(skip)]
	pub id: String,
	pub signature: String,
	#[serde(rename = "signatureoriginal")]
	pub signature_original: String,
	pub source: String,
	pub title: MultiLangText,
	pub series: String,
	pub place: String,
	pub date: String,
	#[serde(rename = "collectiontitle")]
	pub collection_title: String,
	pub persons: Vec<Person>,
	/// ACL scope name to the groups allowed to see that scope.
	pub acl: BTreeMap<String, Vec<String>>,
	pub catalog: Vec<String>,
	pub category: Vec<String>,
	pub tags: Vec<String>,
	pub media: BTreeMap<String, Vec<Media>>,
	pub poster: Option<Media>,
	pub notes: Vec<Note>,
	pub url: String,
	#[serde(rename = "abstract")]
	pub abstract_text: MultiLangText,
	pub references: Vec<Reference>,
	pub extra: Vec<KeyValue>,
	#[serde(rename = "type")]
	pub entry_type: String,
	pub publisher: String,
	pub rights: String,
	pub license: String,
}
impl SourceDocument {
	pub fn from_slice(id: &str, raw: &[u8]) -> serde_json::Result<Self> {
		let mut doc: Self = serde_json::from_slice(raw)?;

		doc.id = id.to_string();

		Ok(doc)
	}

	pub fn from_value(id: &str, raw: serde_json::Value) -> serde_json::Result<Self> {
		let mut doc: Self = serde_json::from_value(raw)?;

		doc.id = id.to_string();

		Ok(doc)
	}

	/// Signatures of referenced documents, deduplicated, in first-seen order.
	pub fn reference_signatures(&self) -> Vec<String> {
		let mut out: Vec<String> = Vec::with_capacity(self.references.len());

		for reference in &self.references {
			if reference.signature.is_empty() || out.contains(&reference.signature) {
				continue;
			}
			if !reference.ref_type.is_empty() && reference.ref_type != SIGNATURE_REFERENCE {
				continue;
			}

			out.push(reference.signature.clone());
		}

		out
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiLangText(pub Vec<LangString>);
impl MultiLangText {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Native-language values first, then translations, each group in stored order.
	pub fn ordered(&self) -> Vec<LangString> {
		let (native, translated): (Vec<_>, Vec<_>) =
			self.0.iter().cloned().partition(|value| !value.translated);

		native.into_iter().chain(translated).collect()
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LangString {
	pub lang: String,
	pub value: String,
	#[serde(default)]
	pub translated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
	pub name: String,
	#[serde(default)]
	pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
	pub name: String,
	pub mimetype: String,
	#[serde(rename = "type")]
	pub media_type: String,
	pub uri: String,
	pub width: i64,
	pub height: i64,
	pub orientation: i64,
	pub duration: i64,
	pub fulltext: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
	#[serde(default, rename = "type")]
	pub ref_type: String,
	#[serde(default)]
	pub title: String,
	pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
	pub key: String,
	pub value: String,
}
