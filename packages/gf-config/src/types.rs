use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub geocoder: Geocoder,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub guides: Guides,
	#[serde(default)]
	pub gallery: Gallery,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Outbound geocoding API. The request is `GET {api_base}{path}?address=...`.
#[derive(Debug, Deserialize)]
pub struct Geocoder {
	pub provider_id: String,
	pub api_base: String,
	pub path: String,
	/// Optional. Sent as the `key` query parameter when present.
	pub api_key: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Radius used when a request does not carry one.
	pub radius: u32,
	pub use_miles: bool,
	pub result_limit: u32,
	/// Radius used to link a newly cached water body to nearby locations.
	pub association_radius: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { radius: 100, use_miles: true, result_limit: 50, association_radius: 100 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Guides {
	pub max_experience: i32,
	pub new_guide_days: i64,
}
impl Default for Guides {
	fn default() -> Self {
		Self { max_experience: 70, new_guide_days: 90 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gallery {
	pub customer_max_photos: i32,
	pub guide_max_photos: i32,
}
impl Default for Gallery {
	fn default() -> Self {
		Self { customer_max_photos: 10, guide_max_photos: 20 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub admin_auth_token: Option<String>,
}
