//! In-process stand-in for the remote search index, served over HTTP on a loopback port.

mod error;
mod query;

pub use error::{Error, Result};

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing,
};
use serde_json::{Map, Value, json};
use tokio::{net::TcpListener, sync::oneshot};

const DEFAULT_SIZE: u64 = 10;

pub struct FakeIndex {
	url: String,
	state: Arc<IndexState>,
	shutdown: Option<oneshot::Sender<()>>,
}
impl FakeIndex {
	/// Serves `docs` (id, source) until the returned handle is dropped.
	pub async fn start(docs: Vec<(String, Value)>) -> Result<Self> {
		let state = Arc::new(IndexState { docs, ..IndexState::default() });
		let app = Router::new()
			.route("/{index}/_search", routing::post(search_handler))
			.route("/{index}/_mget", routing::post(mget_handler))
			.with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { url: format!("http://{addr}"), state, shutdown: Some(tx) })
	}

	pub fn url(&self) -> String {
		self.url.clone()
	}

	pub fn search_calls(&self) -> usize {
		self.state.search_calls.load(Ordering::SeqCst)
	}

	pub fn mget_calls(&self) -> usize {
		self.state.mget_calls.load(Ordering::SeqCst)
	}

	/// Number of ids requested across all multi-get calls.
	pub fn mget_ids(&self) -> usize {
		self.state.mget_ids.load(Ordering::SeqCst)
	}

	pub fn last_authorization(&self) -> Option<String> {
		lock(&self.state.last_authorization).clone()
	}

	pub fn last_search_body(&self) -> Option<Value> {
		lock(&self.state.last_search_body).clone()
	}

	/// Every subsequent request answers with `status` until [`FakeIndex::recover`] is called.
	pub fn fail_with(&self, status: u16) {
		*lock(&self.state.failure) = Some(status);
	}

	pub fn recover(&self) {
		*lock(&self.state.failure) = None;
		lock(&self.state.failing_documents).clear();
	}

	/// Multi-get answers with a per-document shard failure for each of `ids`.
	pub fn fail_documents(&self, ids: &[&str]) {
		lock(&self.state.failing_documents).extend(ids.iter().map(|id| id.to_string()));
	}

	/// Replaces computed aggregations with `aggregations` in search responses.
	pub fn override_aggregations(&self, aggregations: Value) {
		*lock(&self.state.aggregation_override) = Some(aggregations);
	}

	/// Holds every response for `delay` before answering.
	pub fn delay_responses(&self, delay: Duration) {
		*lock(&self.state.delay) = delay;
	}
}
impl Drop for FakeIndex {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

#[derive(Default)]
struct IndexState {
	docs: Vec<(String, Value)>,
	search_calls: AtomicUsize,
	mget_calls: AtomicUsize,
	mget_ids: AtomicUsize,
	last_authorization: Mutex<Option<String>>,
	last_search_body: Mutex<Option<Value>>,
	failure: Mutex<Option<u16>>,
	failing_documents: Mutex<HashSet<String>>,
	aggregation_override: Mutex<Option<Value>>,
	delay: Mutex<Duration>,
}
impl IndexState {
	async fn observe(&self, headers: &HeaderMap) -> Option<Response> {
		let authorization =
			headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);

		*lock(&self.last_authorization) = authorization;

		let delay = *lock(&self.delay);

		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}

		let failure = *lock(&self.failure);

		failure.map(|status| {
			let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

			(status, Json(json!({ "error": { "type": "injected_failure" }, "status": status.as_u16() })))
				.into_response()
		})
	}

	fn search(&self, body: &Value) -> query::EvalResult<Value> {
		let query = body.get("query").cloned().unwrap_or_else(|| json!({ "match_all": {} }));
		let mut matched = Vec::new();

		for (id, doc) in &self.docs {
			if let Some(score) = query::score(&query, doc)? {
				matched.push((id, doc, score));
			}
		}

		let aggregations = match body.get("aggs").or_else(|| body.get("aggregations")) {
			Some(aggs) => {
				let aggs = aggs.as_object().ok_or_else(|| "aggregations must be an object".to_string())?;
				let docs: Vec<&Value> = matched.iter().map(|(_, doc, _)| *doc).collect();

				Some(query::aggregate(aggs, &docs)?)
			},
			None => None,
		};

		if let Some(post_filter) = body.get("post_filter") {
			let mut kept = Vec::new();

			for hit in matched {
				if query::matches(post_filter, hit.1)? {
					kept.push(hit);
				}
			}

			matched = kept;
		}

		let sort_fields = sort_fields(body.get("sort"))?;

		if sort_fields.is_empty() {
			matched.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
		} else {
			matched.sort_by(|a, b| {
				sort_fields
					.iter()
					.map(|(field, descending)| {
						let left = query::values_at(a.1, field).into_iter().next();
						let right = query::values_at(b.1, field).into_iter().next();
						let ordering = query::compare_values(left, right);

						if *descending { ordering.reverse() } else { ordering }
					})
					.find(|ordering| ordering.is_ne())
					.unwrap_or(std::cmp::Ordering::Equal)
			});
		}

		let total = matched.len();
		let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
		let size = body.get("size").and_then(Value::as_u64).unwrap_or(DEFAULT_SIZE) as usize;
		let excludes = string_list(body.pointer("/_source/excludes"));
		let hits: Vec<Value> = matched
			.into_iter()
			.skip(from)
			.take(size)
			.map(|(id, doc, score)| {
				let mut hit = json!({
					"_index": "fake",
					"_id": id,
					"_score": score,
					"_source": project(doc, &excludes),
				});

				if !sort_fields.is_empty() {
					hit["sort"] = Value::Array(
						sort_fields
							.iter()
							.map(|(field, _)| {
								query::values_at(doc, field).into_iter().next().cloned().unwrap_or(Value::Null)
							})
							.collect(),
					);
				}

				hit
			})
			.collect();
		let mut response = json!({
			"took": 1,
			"timed_out": false,
			"hits": { "total": { "value": total, "relation": "eq" }, "hits": hits },
		});
		let override_aggregations = lock(&self.aggregation_override).clone();

		if let Some(aggregations) = override_aggregations {
			response["aggregations"] = aggregations;
		} else if let Some(aggregations) = aggregations {
			response["aggregations"] = Value::Object(aggregations);
		}

		Ok(response)
	}

	fn mget(&self, body: &Value, excludes: &[String]) -> query::EvalResult<Value> {
		let ids = body
			.get("ids")
			.and_then(Value::as_array)
			.ok_or_else(|| "multi-get needs an ids array".to_string())?;

		self.mget_ids.fetch_add(ids.len(), Ordering::SeqCst);

		let failing = lock(&self.failing_documents).clone();
		let docs: Vec<Value> = ids
			.iter()
			.map(|id| {
				let id = id.as_str().unwrap_or_default();

				if failing.contains(id) {
					return json!({
						"_index": "fake",
						"_id": id,
						"error": { "type": "shard_failure", "reason": "primary shard is not active" },
					});
				}

				match self.docs.iter().find(|(doc_id, _)| doc_id == id) {
					Some((_, doc)) => json!({
						"_index": "fake",
						"_id": id,
						"_version": 1,
						"found": true,
						"_source": project(doc, excludes),
					}),
					None => json!({ "_index": "fake", "_id": id, "found": false }),
				}
			})
			.collect();

		Ok(json!({ "docs": docs }))
	}
}

async fn search_handler(
	State(state): State<Arc<IndexState>>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Response {
	state.search_calls.fetch_add(1, Ordering::SeqCst);

	*lock(&state.last_search_body) = Some(body.clone());

	if let Some(failure) = state.observe(&headers).await {
		return failure;
	}

	match state.search(&body) {
		Ok(response) => Json(response).into_response(),
		Err(reason) => bad_request(reason),
	}
}

async fn mget_handler(
	State(state): State<Arc<IndexState>>,
	headers: HeaderMap,
	Query(params): Query<HashMap<String, String>>,
	Json(body): Json<Value>,
) -> Response {
	state.mget_calls.fetch_add(1, Ordering::SeqCst);

	if let Some(failure) = state.observe(&headers).await {
		return failure;
	}

	let excludes: Vec<String> = params
		.get("_source_excludes")
		.map(|raw| raw.split(',').filter(|field| !field.is_empty()).map(str::to_string).collect())
		.unwrap_or_default();

	match state.mget(&body, &excludes) {
		Ok(response) => Json(response).into_response(),
		Err(reason) => bad_request(reason),
	}
}

fn bad_request(reason: String) -> Response {
	(
		StatusCode::BAD_REQUEST,
		Json(json!({ "error": { "type": "parsing_exception", "reason": reason }, "status": 400 })),
	)
		.into_response()
}

fn sort_fields(sort: Option<&Value>) -> query::EvalResult<Vec<(String, bool)>> {
	let Some(sort) = sort else {
		return Ok(Vec::new());
	};
	let entries = sort.as_array().ok_or_else(|| "sort must be an array".to_string())?;
	let mut fields = Vec::with_capacity(entries.len());

	for entry in entries {
		match entry {
			Value::String(field) => fields.push((field.clone(), false)),
			Value::Object(map) => {
				for (field, spec) in map {
					let order = spec.get("order").and_then(Value::as_str).or_else(|| spec.as_str());

					fields.push((field.clone(), order == Some("desc")));
				}
			},
			other => return Err(format!("unsupported sort [{other}]")),
		}
	}

	Ok(fields)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
	value
		.and_then(Value::as_array)
		.map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
		.unwrap_or_default()
}

fn project(doc: &Value, excludes: &[String]) -> Value {
	match doc {
		Value::Object(map) => Value::Object(
			map.iter()
				.filter(|(key, _)| !excludes.iter().any(|excluded| excluded == *key))
				.map(|(key, value)| (key.clone(), value.clone()))
				.collect::<Map<String, Value>>(),
		),
		other => other.clone(),
	}
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
