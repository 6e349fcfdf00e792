mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Backend, BackendKind, BaseFilterClause, BaseFilterGroup, Cache, Config, LiveBackend, Search,
	Service, SnapshotBackend, Tenant,
};

use std::{collections::HashSet, fs, path::Path};

/// Facet planning is quadratic in the number of active facets.
pub const MAX_FACETS_LIMIT: usize = 20;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "service.request_timeout_ms must be greater than zero.".to_string(),
		});
	}

	match cfg.backend.kind {
		BackendKind::Live => {
			let Some(live) = cfg.backend.live.as_ref() else {
				return Err(Error::Validation {
					message: "backend.live must be set when backend.kind is live.".to_string(),
				});
			};

			if live.url.trim().is_empty() {
				return Err(Error::Validation {
					message: "backend.live.url must be non-empty.".to_string(),
				});
			}
			if live.index.trim().is_empty() {
				return Err(Error::Validation {
					message: "backend.live.index must be non-empty.".to_string(),
				});
			}
			if live.timeout_ms == 0 {
				return Err(Error::Validation {
					message: "backend.live.timeout_ms must be greater than zero.".to_string(),
				});
			}
		},
		BackendKind::Snapshot => {
			let Some(snapshot) = cfg.backend.snapshot.as_ref() else {
				return Err(Error::Validation {
					message: "backend.snapshot must be set when backend.kind is snapshot."
						.to_string(),
				});
			};

			if snapshot.path.trim().is_empty() {
				return Err(Error::Validation {
					message: "backend.snapshot.path must be non-empty.".to_string(),
				});
			}
		},
	}

	if cfg.cache.capacity == 0 {
		return Err(Error::Validation {
			message: "cache.capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.ttl_secs == Some(0) {
		return Err(Error::Validation {
			message: "cache.ttl_secs must be greater than zero when set.".to_string(),
		});
	}
	if cfg.search.default_page_size <= 0 {
		return Err(Error::Validation {
			message: "search.default_page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_facets == 0 || cfg.search.max_facets >= MAX_FACETS_LIMIT {
		return Err(Error::Validation {
			message: format!("search.max_facets must be in the range 1-{}.", MAX_FACETS_LIMIT - 1),
		});
	}

	let boost = cfg.search.poster_negative_boost;

	if !boost.is_finite() || boost <= 0.0 || boost > 1.0 {
		return Err(Error::Validation {
			message: "search.poster_negative_boost must be in the range (0.0, 1.0].".to_string(),
		});
	}

	for (label, value) in [
		("search.embedding_field", &cfg.search.embedding_field),
		("search.poster_field", &cfg.search.poster_field),
		("search.acl_meta_field", &cfg.search.acl_meta_field),
		("search.public_group", &cfg.search.public_group),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	validate_tenants(&cfg.tenants)
}

fn validate_tenants(tenants: &[Tenant]) -> Result<()> {
	if tenants.is_empty() {
		return Err(Error::Validation {
			message: "tenants must contain at least one tenant.".to_string(),
		});
	}

	let mut names = HashSet::with_capacity(tenants.len());
	let mut api_keys = HashSet::with_capacity(tenants.len());

	for tenant in tenants {
		if tenant.name.trim().is_empty() {
			return Err(Error::Validation {
				message: "tenants.name must be non-empty.".to_string(),
			});
		}
		if tenant.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("tenants.{}.api_key must be non-empty.", tenant.name),
			});
		}
		if tenant.api_key.contains('.') {
			return Err(Error::Validation {
				message: format!("tenants.{}.api_key must not contain '.'.", tenant.name),
			});
		}
		if !names.insert(tenant.name.as_str()) {
			return Err(Error::Validation {
				message: format!("tenants.name '{}' is defined more than once.", tenant.name),
			});
		}
		if !api_keys.insert(tenant.api_key.as_str()) {
			return Err(Error::Validation {
				message: format!("tenants.{}.api_key is shared with another tenant.", tenant.name),
			});
		}
		if tenant.jwt_max_age_secs == 0 {
			return Err(Error::Validation {
				message: format!("tenants.{}.jwt_max_age_secs must be greater than zero.", tenant.name),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(live) = cfg.backend.live.as_mut()
		&& live.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false)
	{
		live.api_key = None;
	}

	for tenant in &mut cfg.tenants {
		tenant.name = tenant.name.trim().to_string();
		tenant.groups.retain(|group| !group.trim().is_empty());

		for group in &mut tenant.and {
			group.or.retain(|clause| !clause.field.trim().is_empty());
		}
	}
}
