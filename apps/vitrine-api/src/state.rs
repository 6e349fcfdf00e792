use std::{sync::Arc, time::Duration};

use vitrine_service::VitrineService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<VitrineService>,
	pub request_timeout: Duration,
}
impl AppState {
	pub fn new(config: vitrine_config::Config) -> color_eyre::Result<Self> {
		let request_timeout = Duration::from_millis(config.service.request_timeout_ms);
		let service = VitrineService::new(config)?;

		Ok(Self { service: Arc::new(service), request_timeout })
	}
}
