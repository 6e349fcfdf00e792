pub mod decode;
pub mod page;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
	Error, Result,
	access::AccessFilterBuilder,
	context::RequestContext,
	entry::{self, FullEntry},
	facet::{FacetPlan, FacetPlanner},
	filter,
	predicate::{BoolQuery, Predicate},
};
use decode::Facet;
use page::{PageInfo, PageWindow};
use vitrine_config::Search;
use vitrine_domain::{FacetRequest, FilterTerm, SortField, SourceDocument};
use vitrine_storage::index::SearchHits;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub query: String,
	pub filters: Vec<FilterTerm>,
	pub facets: Vec<FacetRequest>,
	/// Similarity query vector, empty when unused.
	pub vector: Vec<f32>,
	pub first: Option<i64>,
	pub size: Option<i64>,
	pub cursor: Option<String>,
	pub sort: Vec<SortField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VectorSearchRequest {
	#[serde(default)]
	pub filters: Vec<FilterTerm>,
	pub vector: Vec<f32>,
	#[serde(default)]
	pub size: Option<i64>,
}
impl VectorSearchRequest {
	/// The equivalent search: no text, no facets, first page.
	pub fn to_search(&self) -> SearchRequest {
		SearchRequest {
			filters: self.filters.clone(),
			vector: self.vector.clone(),
			first: Some(0),
			size: self.size,
			..SearchRequest::default()
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
	pub total_count: u64,
	pub edges: Vec<FullEntry>,
	pub facets: Vec<Facet>,
	pub page_info: PageInfo,
}

/// A request compiled into backend form.
#[derive(Debug, Clone)]
pub struct SearchPlan {
	pub query: Predicate,
	pub facets: FacetPlan,
	pub sort: Vec<Value>,
	pub window: PageWindow,
}
impl SearchPlan {
	pub fn build(ctx: &RequestContext, cfg: &Search, request: &SearchRequest) -> Result<Self> {
		let window = PageWindow::resolve(
			request.first,
			request.size,
			request.cursor.as_deref(),
			cfg.default_page_size,
		)?;
		let facets = FacetPlanner::new(cfg.max_facets).plan(&request.facets)?;
		let access =
			AccessFilterBuilder::new(&cfg.acl_meta_field).build(ctx.tenant(), ctx.caller_groups());
		let mut filter = access.into_predicates();

		filter.extend(facets.pre_filters.iter().cloned());

		for term in &request.filters {
			if let Some(predicate) = filter::compile(term)? {
				filter.push(predicate);
			}
		}

		let mut should = Vec::new();

		if !request.query.trim().is_empty() {
			should.push(Predicate::SimpleQueryString { query: request.query.clone() });
		}
		if !request.vector.is_empty() {
			if request.vector.iter().any(|component| !component.is_finite()) {
				return Err(Error::InvalidRequest {
					message: "vector components must be finite numbers.".to_string(),
				});
			}

			should.push(Predicate::CosineScore {
				field: cfg.embedding_field.clone(),
				vector: request.vector.clone(),
			});
		}

		let minimum_should_match = (!should.is_empty()).then_some(1);
		let main = Predicate::Bool(BoolQuery {
			filter,
			should,
			minimum_should_match,
			..BoolQuery::default()
		});
		let without_poster = Predicate::Bool(BoolQuery {
			must_not: vec![Predicate::Exists { field: cfg.poster_field.clone() }],
			..BoolQuery::default()
		});
		let query = Predicate::Boosting {
			positive: Box::new(main),
			negative: Box::new(without_poster),
			negative_boost: cfg.poster_negative_boost,
		};

		Ok(Self { query, facets, sort: filter::compile_sort(&request.sort)?, window })
	}

	/// Request body for the index `_search` endpoint.
	pub fn to_body(&self, excluded_source_fields: &[String]) -> Value {
		let mut body = Map::new();

		body.insert("query".to_string(), self.query.to_value());
		body.insert("from".to_string(), json!(self.window.from));
		body.insert("size".to_string(), json!(self.window.size));
		body.insert("track_total_hits".to_string(), json!(true));

		if !excluded_source_fields.is_empty() {
			body.insert("_source".to_string(), json!({ "excludes": excluded_source_fields }));
		}
		if let Some(aggs) = self.facets.aggregations_value() {
			body.insert("aggs".to_string(), aggs);
		}
		if let Some(post_filter) = self.facets.post_filter_value() {
			body.insert("post_filter".to_string(), post_filter);
		}
		if !self.sort.is_empty() {
			body.insert("sort".to_string(), Value::Array(self.sort.clone()));
		}

		Value::Object(body)
	}
}

/// Turns raw backend hits into the redacted, paginated result envelope.
pub struct ResultAssembler<'a> {
	cfg: &'a Search,
}
impl<'a> ResultAssembler<'a> {
	pub fn new(cfg: &'a Search) -> Self {
		Self { cfg }
	}

	pub fn assemble(
		&self,
		ctx: &RequestContext,
		plan: &SearchPlan,
		hits: SearchHits,
	) -> Result<SearchResult> {
		let facets = decode::decode_facets(&plan.facets, &hits.aggregations)?;
		let total = i64::try_from(hits.total).map_err(|_| Error::Decode {
			message: format!("total hit count {} is out of range.", hits.total),
		})?;
		let page_info = PageInfo::compute(total, plan.window)?;
		let mut edges = Vec::with_capacity(hits.hits.len());

		for hit in hits.hits {
			let doc = SourceDocument::from_value(&hit.id, hit.source).map_err(|err| Error::Decode {
				message: format!("hit '{}' is not a valid document: {err}", hit.id),
			})?;
			let Some(visibility) = entry::visible(&doc, ctx.groups(), &self.cfg.public_group) else {
				tracing::debug!(id = %doc.id, "Dropped hit without meta access.");

				continue;
			};

			edges.push(FullEntry::from_document(&doc, &visibility));
		}

		Ok(SearchResult { total_count: hits.total, edges, facets, page_info })
	}
}
