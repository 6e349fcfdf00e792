//! Resolver backed by the remote search index.

use crate::{
	BoxFuture, Error, Resolver, Result,
	cache::{DocumentSource, EntryCache},
	context::RequestContext,
	entry::{BaseEntry, FullEntry},
	search::{ResultAssembler, SearchPlan, SearchRequest, SearchResult, VectorSearchRequest},
};
use vitrine_config::Search;
use vitrine_domain::SourceDocument;
use vitrine_storage::index::IndexClient;

pub struct LiveResolver {
	index: IndexClient,
	cache: EntryCache,
	search: Search,
}
impl LiveResolver {
	pub fn new(index: IndexClient, cache: EntryCache, search: Search) -> Self {
		Self { index, cache, search }
	}

	async fn run_search(&self, ctx: &RequestContext, request: &SearchRequest) -> Result<SearchResult> {
		let plan = SearchPlan::build(ctx, &self.search, request)?;
		let body = plan.to_body(&self.search.excluded_source_fields);
		let hits = ctx
			.guard("search", async {
				self.index.search(&body).await.map_err(|err| Error::backend("search", err))
			})
			.await?;

		tracing::debug!(
			tenant = %ctx.tenant().name,
			total = hits.total,
			returned = hits.hits.len(),
			from = plan.window.from,
			size = plan.window.size,
			"Search executed."
		);

		ResultAssembler::new(&self.search).assemble(ctx, &plan, hits)
	}
}
impl DocumentSource for LiveResolver {
	fn fetch<'a>(&'a self, ids: &'a [String]) -> BoxFuture<'a, Result<Vec<SourceDocument>>> {
		Box::pin(async move {
			let fetched = self
				.index
				.mget(ids, &self.search.excluded_source_fields)
				.await
				.map_err(|err| Error::backend(format!("batch_get {ids:?}"), err))?;

			fetched
				.into_iter()
				.filter_map(|doc| doc.source.map(|source| (doc.id, source)))
				.map(|(id, source)| {
					SourceDocument::from_value(&id, source).map_err(|err| Error::Decode {
						message: format!("document '{id}' is not valid: {err}"),
					})
				})
				.collect()
		})
	}
}
impl Resolver for LiveResolver {
	fn backend(&self) -> &'static str {
		"live"
	}

	fn search<'a>(
		&'a self,
		ctx: &'a RequestContext,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>> {
		Box::pin(self.run_search(ctx, request))
	}

	fn vector_search<'a>(
		&'a self,
		ctx: &'a RequestContext,
		request: &'a VectorSearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>> {
		Box::pin(async move {
			if request.vector.is_empty() {
				return Err(Error::InvalidRequest {
					message: "vector search requires a non-empty vector.".to_string(),
				});
			}

			self.run_search(ctx, &request.to_search()).await
		})
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
