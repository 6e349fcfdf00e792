use std::{collections::HashMap, sync::Arc};

use crate::{Error, Result};
use vitrine_config::Tenant;

/// Read-only tenant lookup tables, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
	by_name: HashMap<String, Arc<Tenant>>,
	by_api_key: HashMap<String, Arc<Tenant>>,
}
impl TenantRegistry {
	pub fn new(tenants: &[Tenant]) -> Result<Self> {
		let mut registry = Self::default();

		for tenant in tenants {
			let tenant = Arc::new(tenant.clone());

			if registry.by_name.insert(tenant.name.clone(), tenant.clone()).is_some() {
				return Err(Error::Config {
					message: format!("tenant '{}' is defined more than once.", tenant.name),
				});
			}
			if registry.by_api_key.insert(tenant.api_key.clone(), tenant.clone()).is_some() {
				return Err(Error::Config {
					message: format!("tenant '{}' shares its API key with another tenant.", tenant.name),
				});
			}
		}

		Ok(registry)
	}

	pub fn by_name(&self, name: &str) -> Result<Arc<Tenant>> {
		self.by_name
			.get(name)
			.cloned()
			.ok_or_else(|| Error::Config { message: format!("tenant '{name}' not found.") })
	}

	pub fn by_api_key(&self, api_key: &str) -> Option<Arc<Tenant>> {
		self.by_api_key.get(api_key).cloned()
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}
