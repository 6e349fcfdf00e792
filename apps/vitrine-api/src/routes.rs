use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use vitrine_service::{
	CancelSignal, Error as ServiceError, FullEntry, RequestContext, SearchRequest, SearchResult,
	VectorSearchRequest,
};

/// Comma-separated caller groups, set by the upstream auth layer.
pub const CALLER_GROUPS_HEADER: &str = "x-caller-groups";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/vector_search", post(vector_search))
		.route("/v1/entries", post(entries))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct EntriesRequest {
	pub ids: Vec<String>,
	#[serde(default)]
	pub expand_references: bool,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
	pub entries: Vec<FullEntry>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResult>, ApiError> {
	let ctx = request_context(&state, &headers)?;
	let response = state.service.search(&ctx, &payload).await?;

	Ok(Json(response))
}

async fn vector_search(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<VectorSearchRequest>,
) -> Result<Json<SearchResult>, ApiError> {
	let ctx = request_context(&state, &headers)?;
	let response = state.service.vector_search(&ctx, &payload).await?;

	Ok(Json(response))
}

async fn entries(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<EntriesRequest>,
) -> Result<Json<EntriesResponse>, ApiError> {
	let ctx = request_context(&state, &headers)?;
	let entries = state.service.entries(&ctx, &payload.ids, payload.expand_references).await?;

	Ok(Json(EntriesResponse { entries }))
}

fn request_context(state: &AppState, headers: &HeaderMap) -> Result<RequestContext, ApiError> {
	let api_key = headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "));
	let caller_groups = headers
		.get(CALLER_GROUPS_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(|value| {
			value
				.split(',')
				.map(str::trim)
				.filter(|group| !group.is_empty())
				.map(str::to_string)
				.collect()
		});
	let cancel = CancelSignal::never().with_timeout(state.request_timeout);

	Ok(state.service.context_for_api_key(api_key, caller_groups, cancel)?)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, code, fields) = match &err {
			ServiceError::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None),
			ServiceError::AuthContext { .. } => (StatusCode::UNAUTHORIZED, "missing_identity", None),
			ServiceError::FilterCompile { .. } => (StatusCode::BAD_REQUEST, "invalid_filter", None),
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request", None),
			ServiceError::Cursor { .. } => {
				(StatusCode::BAD_REQUEST, "invalid_cursor", Some(vec!["cursor".to_string()]))
			},
			ServiceError::Unsupported { .. } => (StatusCode::NOT_IMPLEMENTED, "unsupported", None),
			ServiceError::Backend { .. } => (StatusCode::BAD_GATEWAY, "backend_error", None),
			ServiceError::Decode { .. } => (StatusCode::BAD_GATEWAY, "decode_error", None),
			ServiceError::Cancelled { .. } => (StatusCode::REQUEST_TIMEOUT, "cancelled", None),
			ServiceError::DeadlineExceeded { .. } => {
				(StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded", None)
			},
		};

		if status.is_server_error() {
			tracing::error!(error = %err, error_code = code, "Request failed.");
		} else {
			tracing::warn!(error = %err, error_code = code, "Request rejected.");
		}

		ApiError::new(status, code, err.to_string(), fields)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
