use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::{Error, Result};

/// Statuses the geocoder returns for a well-formed request, including "nothing found".
const ACCEPTED_STATUSES: [&str; 2] = ["OK", "ZERO_RESULTS"];

/// Looks up free-text `address` and returns the raw response body.
pub async fn geocode(cfg: &gf_config::Geocoder, address: &str) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = request_url(cfg, address)?;
	let res = client.get(url).headers(crate::request_headers(&cfg.default_headers)?).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	check_status(&json)?;

	tracing::debug!(provider_id = %cfg.provider_id, %address, "Geocoder responded.");

	Ok(json)
}

pub fn request_url(cfg: &gf_config::Geocoder, address: &str) -> Result<Url> {
	let base = format!("{}{}", cfg.api_base, cfg.path);
	let mut params = vec![("address", address), ("sensor", "false")];

	if let Some(key) = cfg.api_key.as_deref() {
		params.push(("key", key));
	}

	Url::parse_with_params(&base, &params).map_err(|err| Error::InvalidConfig {
		message: format!("Geocoder URL {base:?} is invalid: {err}."),
	})
}

fn check_status(json: &Value) -> Result<()> {
	match json.get("status").and_then(Value::as_str) {
		None => Ok(()),
		Some(status) if ACCEPTED_STATUSES.contains(&status) => Ok(()),
		Some(status) => Err(Error::Rejected { status: status.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_results_is_not_an_error() {
		assert!(check_status(&serde_json::json!({ "status": "ZERO_RESULTS", "results": [] })).is_ok());
		assert!(check_status(&serde_json::json!({ "results": [] })).is_ok());
	}

	#[test]
	fn denied_requests_are_errors() {
		let err = check_status(&serde_json::json!({ "status": "REQUEST_DENIED" }))
			.expect_err("Expected status error.");

		assert!(matches!(err, Error::Rejected { ref status } if status == "REQUEST_DENIED"));
	}
}
