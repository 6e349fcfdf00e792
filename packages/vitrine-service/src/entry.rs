//! Presentation entries built from stored documents, redacted per caller.

use serde::Serialize;

use vitrine_domain::{KeyValue, LangString, Media, Note, Person, Reference, SourceDocument, Visibility};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AclEntry {
	pub name: String,
	pub groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaList {
	pub name: String,
	pub items: Vec<Media>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseEntry {
	pub id: String,
	pub signature: String,
	pub signature_original: String,
	pub source: String,
	pub title: Vec<LangString>,
	pub series: String,
	pub place: String,
	pub date: String,
	pub collection_title: String,
	pub persons: Vec<Person>,
	pub category: Vec<String>,
	pub tags: Vec<String>,
	pub url: String,
	pub publisher: String,
	pub rights: String,
	pub license: String,
	pub entry_type: String,
	pub references: Vec<Reference>,
	/// Populated only when the caller may see media.
	pub poster: Option<Media>,
	pub acl: Vec<AclEntry>,
}
impl BaseEntry {
	pub fn from_document(doc: &SourceDocument, visibility: &Visibility) -> Self {
		Self {
			id: doc.id.clone(),
			signature: doc.signature.clone(),
			signature_original: doc.signature_original.clone(),
			source: doc.source.clone(),
			title: doc.title.ordered(),
			series: doc.series.clone(),
			place: doc.place.clone(),
			date: doc.date.clone(),
			collection_title: doc.collection_title.clone(),
			persons: doc.persons.clone(),
			category: doc.category.clone(),
			tags: doc.tags.clone(),
			url: doc.url.clone(),
			publisher: doc.publisher.clone(),
			rights: doc.rights.clone(),
			license: doc.license.clone(),
			entry_type: doc.entry_type.clone(),
			references: doc.references.clone(),
			poster: if visibility.media_visible() { doc.poster.clone() } else { None },
			acl: doc
				.acl
				.iter()
				.map(|(name, groups)| AclEntry { name: name.clone(), groups: groups.clone() })
				.collect(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullEntry {
	pub id: String,
	pub base: BaseEntry,
	pub notes: Vec<Note>,
	#[serde(rename = "abstract")]
	pub abstract_text: Vec<LangString>,
	pub extra: Vec<KeyValue>,
	/// Empty unless `content_access || !media_protected`.
	pub media: Vec<MediaList>,
	/// Filled on request by reference expansion.
	pub references_full: Vec<BaseEntry>,
	pub content_access: bool,
	pub media_protected: bool,
}
impl FullEntry {
	pub fn from_document(doc: &SourceDocument, visibility: &Visibility) -> Self {
		let media = if visibility.media_visible() {
			doc.media
				.iter()
				.map(|(name, items)| MediaList { name: name.clone(), items: items.clone() })
				.collect()
		} else {
			Vec::new()
		};

		Self {
			id: doc.id.clone(),
			base: BaseEntry::from_document(doc, visibility),
			notes: doc.notes.clone(),
			abstract_text: doc.abstract_text.ordered(),
			extra: doc.extra.clone(),
			media,
			references_full: Vec::new(),
			content_access: visibility.content(),
			media_protected: visibility.media_protected(),
		}
	}

	pub fn signature(&self) -> &str {
		&self.base.signature
	}

	/// Signatures this entry references, deduplicated, in stored order.
	pub fn reference_signatures(&self) -> Vec<String> {
		let doc =
			SourceDocument { references: self.base.references.clone(), ..SourceDocument::default() };

		doc.reference_signatures()
	}
}

/// Visibility of `doc` for `groups`, or `None` when the caller lacks meta access.
pub fn visible(doc: &SourceDocument, groups: &[String], public_group: &str) -> Option<Visibility> {
	let visibility = Visibility::evaluate(&doc.acl, groups, public_group);

	visibility.meta().then_some(visibility)
}
