use std::sync::Arc;

use gf_service::GuideService;
use gf_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<GuideService>,
}
impl AppState {
	pub async fn new(config: gf_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(GuideService::new(config, db)))
	}

	pub fn from_service(service: GuideService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub(crate) fn admin_token(&self) -> Option<&str> {
		self.service.cfg.security.admin_auth_token.as_deref()
	}
}
