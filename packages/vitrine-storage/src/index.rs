use std::time::Duration;

use reqwest::{
	Client, Response,
	header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One search hit. `source` is the stored document with heavyweight fields excluded.
#[derive(Debug, Clone)]
pub struct Hit {
	pub id: String,
	pub source: Value,
	pub sort: Vec<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchHits {
	pub total: u64,
	pub hits: Vec<Hit>,
	/// Raw aggregation results keyed by aggregation name.
	pub aggregations: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
	pub id: String,
	/// `None` when the index has no document under `id`.
	pub source: Option<Value>,
}

/// Client for a remote index speaking the `_search` / `_mget` JSON protocol.
pub struct IndexClient {
	client: Client,
	base_url: String,
	index: String,
}
impl IndexClient {
	pub fn new(cfg: &vitrine_config::LiveBackend) -> Result<Self> {
		let mut headers = HeaderMap::new();

		if let Some(api_key) = cfg.api_key.as_deref() {
			let value = HeaderValue::from_str(&format!("ApiKey {api_key}")).map_err(|_| {
				Error::InvalidArgument("backend.live.api_key is not a valid header value.".to_string())
			})?;

			headers.insert(AUTHORIZATION, value);
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self {
			client,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
		})
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	/// Runs one search request. `body` carries query, aggregations, window, sort and projection.
	pub async fn search(&self, body: &Value) -> Result<SearchHits> {
		let url = format!("{}/{}/_search", self.base_url, self.index);
		let res = self.client.post(url).json(body).send().await?;
		let raw: RawSearchResponse = read_json(res).await?;
		let hits = raw
			.hits
			.hits
			.into_iter()
			.map(|hit| Hit {
				id: hit.id,
				source: hit.source.unwrap_or(Value::Null),
				sort: hit.sort.unwrap_or_default(),
			})
			.collect();

		Ok(SearchHits {
			total: raw.hits.total.value,
			hits,
			aggregations: raw.aggregations.unwrap_or_default(),
		})
	}

	/// Fetches documents by id in one round trip, in request order.
	pub async fn mget(
		&self,
		ids: &[String],
		source_excludes: &[String],
	) -> Result<Vec<FetchedDocument>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let url = format!("{}/{}/_mget", self.base_url, self.index);
		let mut request = self.client.post(url).json(&serde_json::json!({ "ids": ids }));

		if !source_excludes.is_empty() {
			request = request.query(&[("_source_excludes", source_excludes.join(","))]);
		}

		let raw: RawMgetResponse = read_json(request.send().await?).await?;

		if raw.docs.len() != ids.len() {
			return Err(Error::InvalidResponse(format!(
				"multi-get returned {} documents for {} ids",
				raw.docs.len(),
				ids.len()
			)));
		}

		raw.docs
			.into_iter()
			.map(|doc| {
				if let Some(error) = doc.error {
					return Err(Error::Document { id: doc.id, reason: error.to_string() });
				}

				Ok(FetchedDocument { id: doc.id, source: if doc.found { doc.source } else { None } })
			})
			.collect()
	}
}

#[derive(Deserialize)]
struct RawSearchResponse {
	hits: RawHits,
	aggregations: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawHits {
	total: RawTotal,
	#[serde(default)]
	hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawTotal {
	value: u64,
}

#[derive(Deserialize)]
struct RawHit {
	#[serde(rename = "_id")]
	id: String,
	#[serde(rename = "_source")]
	source: Option<Value>,
	sort: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawMgetResponse {
	docs: Vec<RawMgetDoc>,
}

#[derive(Deserialize)]
struct RawMgetDoc {
	#[serde(rename = "_id")]
	id: String,
	#[serde(default)]
	found: bool,
	#[serde(rename = "_source")]
	source: Option<Value>,
	/// Set instead of `found` when the index could not read this document.
	error: Option<Value>,
}

async fn read_json<T>(res: Response) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::Status { status: status.as_u16(), body });
	}

	let bytes = res.bytes().await?;

	Ok(serde_json::from_slice(&bytes)?)
}
