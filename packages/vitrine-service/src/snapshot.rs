//! Resolver backed by a local read-only snapshot. Only id lookups are available.

use std::sync::Arc;

use crate::{
	BoxFuture, Error, Resolver, Result,
	cache::{DocumentSource, EntryCache},
	context::RequestContext,
	entry::{BaseEntry, FullEntry},
	search::{SearchRequest, SearchResult, VectorSearchRequest},
};
use vitrine_config::Search;
use vitrine_domain::SourceDocument;
use vitrine_storage::snapshot::{self, SnapshotStore};

const BACKEND: &str = "snapshot";

pub struct SnapshotResolver {
	store: Arc<dyn SnapshotStore>,
	cache: EntryCache,
	search: Search,
}
impl SnapshotResolver {
	pub fn new(store: Arc<dyn SnapshotStore>, cache: EntryCache, search: Search) -> Self {
		Self { store, cache, search }
	}
}
impl DocumentSource for SnapshotResolver {
	fn fetch<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<Vec<SourceDocument>>> {
		let store = self.store.clone();
		let owned = ids.to_vec();

		Box::pin(async move {
			tokio::task::spawn_blocking(move || read_documents(store.as_ref(), &owned))
				.await
				.map_err(|err| Error::Backend {
					operation: format!("batch_get {ids:?}"),
					message: err.to_string(),
				})?
		})
	}
}
impl Resolver for SnapshotResolver {
	fn backend(&self) -> &'static str {
		BACKEND
	}

	fn search<'a>(
		&'a self,
		_: &'a RequestContext,
		_: &'a SearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>> {
		Box::pin(async { Err(unsupported("search")) })
	}

	fn vector_search<'a>(
		&'a self,
		_: &'a RequestContext,
		_: &'a VectorSearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>> {
		Box::pin(async { Err(unsupported("vector_search")) })
	}

	fn batch_get<'a>(
		&'a self,
		ctx: &'a RequestContext,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<FullEntry>>> {
		Box::pin(crate::resolve_entries(ctx, &self.cache, self, &self.search.public_group, ids))
	}

	fn expand_references<'a>(
		&'a self,
		ctx: &'a RequestContext,
		entry: &'a FullEntry,
	) -> BoxFuture<'a, Result<Vec<BaseEntry>>> {
		Box::pin(crate::resolve_references(
			ctx,
			&self.cache,
			self,
			&self.search.public_group,
			entry,
		))
	}
}

fn unsupported(operation: &str) -> Error {
	Error::Unsupported { operation: operation.to_string(), backend: BACKEND.to_string() }
}

fn read_documents(store: &dyn SnapshotStore, ids: &[String]) -> Result<Vec<SourceDocument>> {
	let mut docs = Vec::with_capacity(ids.len());

	for id in ids {
		let compressed =
			store.get(id).map_err(|err| Error::backend(format!("batch_get {id}"), err))?;
		let Some(compressed) = compressed else {
			continue;
		};
		let raw = snapshot::decompress(&compressed).map_err(|err| Error::Decode {
			message: format!("snapshot entry '{id}' is not gzip data: {err}"),
		})?;
		let doc = SourceDocument::from_slice(id, &raw).map_err(|err| Error::Decode {
			message: format!("snapshot entry '{id}' is not a valid document: {err}"),
		})?;

		docs.push(doc);
	}

	Ok(docs)
}
