//! Memoized batch document lookup shared by every request.

use std::{collections::HashSet, sync::Arc, time::Duration};

use moka::sync::Cache;

use crate::{BoxFuture, Result, context::RequestContext};
use vitrine_domain::SourceDocument;

/// Backend side of a batch lookup.
pub trait DocumentSource
where
	Self: Send + Sync,
{
	/// Fetches `ids` in one round trip. Ids the backend does not know are absent from the result.
	fn fetch<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<Vec<SourceDocument>>>;
}

/// Bounded id to document cache. Entries are immutable once inserted and leave only by eviction.
#[derive(Clone)]
pub struct EntryCache {
	inner: Cache<String, Arc<SourceDocument>>,
}
impl EntryCache {
	pub fn new(cfg: &vitrine_config::Cache) -> Self {
		let mut builder = Cache::builder().max_capacity(cfg.capacity);

		if let Some(ttl_secs) = cfg.ttl_secs {
			builder = builder.time_to_live(Duration::from_secs(ttl_secs));
		}

		Self { inner: builder.build() }
	}

	pub fn get(&self, id: &str) -> Option<Arc<SourceDocument>> {
		self.inner.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.inner.contains_key(id)
	}

	/// Cached documents followed by freshly fetched ones. Missing ids cost one fetch in total;
	/// ids the backend does not know are skipped and never cached.
	pub async fn load(
		&self,
		ctx: &RequestContext,
		source: &dyn DocumentSource,
		ids: &[String],
	) -> Result<Vec<Arc<SourceDocument>>> {
		let mut seen = HashSet::with_capacity(ids.len());
		let mut found = Vec::with_capacity(ids.len());
		let mut missing = Vec::new();

		for id in ids {
			if !seen.insert(id.as_str()) {
				continue;
			}

			match self.inner.get(id) {
				Some(doc) => found.push(doc),
				None => missing.push(id.clone()),
			}
		}

		tracing::debug!(
			requested = ids.len(),
			hits = found.len(),
			misses = missing.len(),
			"Entry cache lookup."
		);

		if missing.is_empty() {
			return Ok(found);
		}

		let fetched = ctx.guard("batch_get", source.fetch(&missing)).await?;

		for doc in fetched {
			let doc = Arc::new(doc);

			self.inner.insert(doc.id.clone(), doc.clone());
			found.push(doc);
		}

		Ok(found)
	}
}
