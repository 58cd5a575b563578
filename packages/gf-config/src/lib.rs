mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Gallery, Geocoder, Guides, Postgres, Search, Security, Service, Storage};

use std::{fs, path::Path};

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
	for (key, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("geocoder.provider_id", &cfg.geocoder.provider_id),
		("geocoder.api_base", &cfg.geocoder.api_base),
	] {
		ensure(!value.trim().is_empty(), key, "must be non-empty")?;
	}
	for (key, positive) in [
		("storage.postgres.pool_max_conns", cfg.storage.postgres.pool_max_conns > 0),
		("geocoder.timeout_ms", cfg.geocoder.timeout_ms > 0),
		("search.radius", cfg.search.radius > 0),
		("search.association_radius", cfg.search.association_radius > 0),
		("search.result_limit", cfg.search.result_limit > 0),
		("guides.max_experience", cfg.guides.max_experience > 0),
		("gallery.customer_max_photos", cfg.gallery.customer_max_photos > 0),
	] {
		ensure(positive, key, "must be greater than zero")?;
	}

	ensure(
		cfg.geocoder.default_headers.values().all(|value| value.is_string()),
		"geocoder.default_headers",
		"values must be strings",
	)?;
	ensure(cfg.guides.new_guide_days >= 0, "guides.new_guide_days", "must be zero or greater")?;
	ensure(
		cfg.gallery.guide_max_photos >= cfg.gallery.customer_max_photos,
		"gallery.guide_max_photos",
		"must be at least gallery.customer_max_photos",
	)?;

	Ok(())
}

fn ensure(ok: bool, key: &'static str, requirement: &str) -> Result<()> {
	if ok {
		return Ok(());
	}

	Err(Error::Invalid { key, requirement: requirement.to_string() })
}

fn normalize(cfg: &mut Config) {
	if cfg.geocoder.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.geocoder.api_key = None;
	}
	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}
	if cfg.geocoder.api_base.ends_with('/') && cfg.geocoder.path.starts_with('/') {
		cfg.geocoder.api_base = cfg.geocoder.api_base.trim_end_matches('/').to_string();
	}
}
