use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub backend: Backend,
	pub cache: Cache,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub tenants: Vec<Tenant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	Live,
	Snapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
	pub kind: BackendKind,
	pub live: Option<LiveBackend>,
	pub snapshot: Option<SnapshotBackend>,
}

/// Remote search index speaking the `_search` / `_mget` JSON protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveBackend {
	pub url: String,
	pub index: String,
	pub api_key: Option<String>,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotBackend {
	pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub capacity: u64,
	/// Optional. Entries older than this are evicted even when the cache has room.
	pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_page_size")]
	pub default_page_size: i64,
	#[serde(default = "default_max_facets")]
	pub max_facets: usize,
	#[serde(default = "default_embedding_field")]
	pub embedding_field: String,
	#[serde(default = "default_excluded_source_fields")]
	pub excluded_source_fields: Vec<String>,
	#[serde(default = "default_poster_field")]
	pub poster_field: String,
	#[serde(default = "default_poster_negative_boost")]
	pub poster_negative_boost: f32,
	#[serde(default = "default_acl_meta_field")]
	pub acl_meta_field: String,
	/// Group that marks a `content` ACL scope as publicly visible.
	#[serde(default = "default_public_group")]
	pub public_group: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
	pub name: String,
	pub api_key: String,
	#[serde(default)]
	pub jwt_secret: String,
	#[serde(default = "default_jwt_max_age_secs")]
	pub jwt_max_age_secs: u64,
	#[serde(default)]
	pub groups: Vec<String>,
	/// Base filter: every group must match, and a group matches when any of its clauses does.
	#[serde(default)]
	pub and: Vec<BaseFilterGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseFilterGroup {
	#[serde(default)]
	pub or: Vec<BaseFilterClause>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseFilterClause {
	pub field: String,
	#[serde(default)]
	pub values: Vec<String>,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			default_page_size: default_page_size(),
			max_facets: default_max_facets(),
			embedding_field: default_embedding_field(),
			excluded_source_fields: default_excluded_source_fields(),
			poster_field: default_poster_field(),
			poster_negative_boost: default_poster_negative_boost(),
			acl_meta_field: default_acl_meta_field(),
			public_group: default_public_group(),
		}
	}
}

fn default_request_timeout_ms() -> u64 {
	30_000
}

fn default_page_size() -> i64 {
	25
}

fn default_max_facets() -> usize {
	16
}

fn default_embedding_field() -> String {
	"content_vector".to_string()
}

fn default_excluded_source_fields() -> Vec<String> {
	vec!["title_vector".to_string(), "content_vector".to_string()]
}

fn default_poster_field() -> String {
	"poster".to_string()
}

fn default_poster_negative_boost() -> f32 {
	0.85
}

fn default_acl_meta_field() -> String {
	"acl.meta.keyword".to_string()
}

fn default_public_group() -> String {
	"global/guest".to_string()
}

fn default_jwt_max_age_secs() -> u64 {
	3_600
}
