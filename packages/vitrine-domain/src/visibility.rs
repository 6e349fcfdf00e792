use std::collections::{BTreeMap, BTreeSet};

/// Scope that gates whether a document is exposed at all.
pub const META_SCOPE: &str = "meta";
/// Scope that gates the media payload of an exposed document.
pub const CONTENT_SCOPE: &str = "content";

/// Lowercased, sorted, deduplicated union of tenant and caller groups.
pub fn effective_groups<I, J, S, T>(tenant_groups: I, caller_groups: J) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	J: IntoIterator<Item = T>,
	S: AsRef<str>,
	T: AsRef<str>,
{
	let mut out: Vec<String> = tenant_groups
		.into_iter()
		.map(|group| normalize(group.as_ref()))
		.chain(caller_groups.into_iter().map(|group| normalize(group.as_ref())))
		.filter(|group| !group.is_empty())
		.collect();

	out.sort();
	out.dedup();

	out
}

/// Group names compare trimmed and Unicode-lowercased everywhere.
fn normalize(group: &str) -> String {
	group.trim().to_lowercase()
}

/// Scopes of one document that a group set may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
	scopes: BTreeSet<String>,
	media_protected: bool,
}
impl Visibility {
	/// `groups` must already be normalized with [`effective_groups`].
	pub fn evaluate(acl: &BTreeMap<String, Vec<String>>, groups: &[String], public_group: &str) -> Self {
		let mut scopes = BTreeSet::new();
		let mut media_protected = true;
		let public_group = normalize(public_group);

		for (scope, allowed) in acl {
			let scope = scope.to_lowercase();
			let allowed: Vec<String> = allowed.iter().map(|group| normalize(group)).collect();

			if scope == CONTENT_SCOPE && allowed.contains(&public_group) {
				media_protected = false;
			}
			if allowed.iter().any(|group| groups.contains(group)) {
				scopes.insert(scope);
			}
		}

		Self { scopes, media_protected }
	}

	pub fn allows(&self, scope: &str) -> bool {
		self.scopes.contains(&scope.to_lowercase())
	}

	pub fn meta(&self) -> bool {
		self.allows(META_SCOPE)
	}

	pub fn content(&self) -> bool {
		self.allows(CONTENT_SCOPE)
	}

	/// False only when the `content` scope lists the public group.
	pub fn media_protected(&self) -> bool {
		self.media_protected
	}

	pub fn media_visible(&self) -> bool {
		self.content() || !self.media_protected
	}
}
