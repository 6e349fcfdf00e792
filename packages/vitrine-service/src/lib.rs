pub mod access;
pub mod cache;
pub mod context;
pub mod entry;
pub mod facet;
pub mod filter;
pub mod live;
pub mod predicate;
pub mod search;
pub mod snapshot;
pub mod tenants;

mod error;

pub use cache::{DocumentSource, EntryCache};
pub use context::{CancelHandle, CancelSignal, RequestContext};
pub use entry::{BaseEntry, FullEntry};
pub use error::{Error, Result};
pub use live::LiveResolver;
pub use search::{
	SearchRequest, SearchResult, VectorSearchRequest,
	decode::{Facet, FacetValue},
	page::PageInfo,
};
pub use snapshot::SnapshotResolver;
pub use tenants::TenantRegistry;

use std::{future::Future, pin::Pin, sync::Arc};

use vitrine_config::{BackendKind, Config};
use vitrine_storage::{index::IndexClient, snapshot::DirSnapshotStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability interface shared by every backend variant.
pub trait Resolver
where
	Self: Send + Sync,
{
	fn backend(&self) -> &'static str;

	fn search<'a>(
		&'a self,
		ctx: &'a RequestContext,
		request: &'a SearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>>;

	fn vector_search<'a>(
		&'a self,
		ctx: &'a RequestContext,
		request: &'a VectorSearchRequest,
	) -> BoxFuture<'a, Result<SearchResult>>;

	/// Visible entries among `ids`. Unknown and hidden ids are skipped.
	fn batch_get<'a>(
		&'a self,
		ctx: &'a RequestContext,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<FullEntry>>>;

	/// Visible entries referenced by `entry`, never including `entry` itself.
	fn expand_references<'a>(
		&'a self,
		ctx: &'a RequestContext,
		entry: &'a FullEntry,
	) -> BoxFuture<'a, Result<Vec<BaseEntry>>>;
}

pub struct VitrineService {
	pub cfg: Config,
	pub tenants: TenantRegistry,
	pub resolver: Arc<dyn Resolver>,
}
impl VitrineService {
	/// Builds the resolver selected by `backend.kind`.
	pub fn new(cfg: Config) -> Result<Self> {
		let cache = EntryCache::new(&cfg.cache);
		let resolver: Arc<dyn Resolver> = match cfg.backend.kind {
			BackendKind::Live => {
				let live = cfg.backend.live.as_ref().ok_or_else(|| Error::Config {
					message: "backend.live must be set when backend.kind is live.".to_string(),
				})?;
				let index = IndexClient::new(live)
					.map_err(|err| Error::Config { message: err.to_string() })?;

				Arc::new(LiveResolver::new(index, cache, cfg.search.clone()))
			},
			BackendKind::Snapshot => {
				let snapshot = cfg.backend.snapshot.as_ref().ok_or_else(|| Error::Config {
					message: "backend.snapshot must be set when backend.kind is snapshot."
						.to_string(),
				})?;
				let store = DirSnapshotStore::open(&snapshot.path)
					.map_err(|err| Error::Config { message: err.to_string() })?;

				Arc::new(SnapshotResolver::new(Arc::new(store), cache, cfg.search.clone()))
			},
		};

		Self::with_resolver(cfg, resolver)
	}

	pub fn with_resolver(cfg: Config, resolver: Arc<dyn Resolver>) -> Result<Self> {
		let tenants = TenantRegistry::new(&cfg.tenants)?;

		tracing::info!(backend = resolver.backend(), tenants = tenants.len(), "Service ready.");

		Ok(Self { cfg, tenants, resolver })
	}

	/// Request context for a tenant named by the auth collaborator.
	pub fn context(
		&self,
		tenant: Option<&str>,
		caller_groups: Option<Vec<String>>,
		cancel: CancelSignal,
	) -> Result<RequestContext> {
		let name = tenant.map(str::trim).filter(|name| !name.is_empty()).ok_or_else(|| {
			Error::AuthContext { message: "request carries no tenant identity.".to_string() }
		})?;
		let caller_groups = caller_groups.ok_or_else(|| Error::AuthContext {
			message: "request carries no caller groups.".to_string(),
		})?;

		Ok(RequestContext::new(self.tenants.by_name(name)?, caller_groups, cancel))
	}

	/// Request context for a tenant identified by its API key.
	pub fn context_for_api_key(
		&self,
		api_key: Option<&str>,
		caller_groups: Option<Vec<String>>,
		cancel: CancelSignal,
	) -> Result<RequestContext> {
		let api_key = api_key.map(str::trim).filter(|key| !key.is_empty()).ok_or_else(|| {
			Error::AuthContext { message: "request carries no API key.".to_string() }
		})?;
		let tenant = self.tenants.by_api_key(api_key).ok_or_else(|| Error::AuthContext {
			message: "API key does not identify a tenant.".to_string(),
		})?;
		let caller_groups = caller_groups.ok_or_else(|| Error::AuthContext {
			message: "request carries no caller groups.".to_string(),
		})?;

		Ok(RequestContext::new(tenant, caller_groups, cancel))
	}

	pub async fn search(&self, ctx: &RequestContext, request: &SearchRequest) -> Result<SearchResult> {
		self.resolver.search(ctx, request).await
	}

	pub async fn vector_search(
		&self,
		ctx: &RequestContext,
		request: &VectorSearchRequest,
	) -> Result<SearchResult> {
		self.resolver.vector_search(ctx, request).await
	}

	pub async fn batch_get(&self, ctx: &RequestContext, ids: &[String]) -> Result<Vec<FullEntry>> {
		self.resolver.batch_get(ctx, ids).await
	}

	pub async fn expand_references(
		&self,
		ctx: &RequestContext,
		entry: &FullEntry,
	) -> Result<Vec<BaseEntry>> {
		self.resolver.expand_references(ctx, entry).await
	}

	/// Batch lookup that optionally fills `references_full` on every returned entry.
	pub async fn entries(
		&self,
		ctx: &RequestContext,
		ids: &[String],
		expand_references: bool,
	) -> Result<Vec<FullEntry>> {
		let mut entries = self.batch_get(ctx, ids).await?;

		if expand_references {
			for entry in &mut entries {
				entry.references_full = self.expand_references(ctx, entry).await?;
			}
		}

		Ok(entries)
	}
}

pub(crate) async fn resolve_entries(
	ctx: &RequestContext,
	cache: &EntryCache,
	source: &dyn DocumentSource,
	public_group: &str,
	ids: &[String],
) -> Result<Vec<FullEntry>> {
	let docs = cache.load(ctx, source, ids).await?;

	Ok(docs
		.iter()
		.filter_map(|doc| {
			entry::visible(doc, ctx.groups(), public_group)
				.map(|visibility| FullEntry::from_document(doc, &visibility))
		})
		.collect())
}

pub(crate) async fn resolve_references(
	ctx: &RequestContext,
	cache: &EntryCache,
	source: &dyn DocumentSource,
	public_group: &str,
	entry: &FullEntry,
) -> Result<Vec<BaseEntry>> {
	let origin = entry.signature();
	let ids: Vec<String> = entry
		.reference_signatures()
		.into_iter()
		.filter(|signature| signature != origin && signature != &entry.id)
		.collect();

	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let docs = cache.load(ctx, source, &ids).await?;

	Ok(docs
		.iter()
		.filter(|doc| doc.signature != origin)
		.filter_map(|doc| {
			entry::visible(doc, ctx.groups(), public_group)
				.map(|visibility| BaseEntry::from_document(doc, &visibility))
		})
		.collect())
}
