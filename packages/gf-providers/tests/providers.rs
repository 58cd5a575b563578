use serde_json::{Map, Value};

fn geocoder_config(api_key: Option<&str>) -> gf_config::Geocoder {
	gf_config::Geocoder {
		provider_id: "google".to_string(),
		api_base: "https://maps.googleapis.com".to_string(),
		path: "/maps/api/geocode/json".to_string(),
		api_key: api_key.map(str::to_string),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

#[test]
fn request_url_encodes_address_and_sensor() {
	let url = gf_providers::geocoder::request_url(&geocoder_config(None), "Venice, LA & US")
		.expect("Failed to build URL.");

	assert_eq!(url.path(), "/maps/api/geocode/json");

	let pairs: Vec<(String, String)> =
		url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

	assert_eq!(
		pairs,
		vec![
			("address".to_string(), "Venice, LA & US".to_string()),
			("sensor".to_string(), "false".to_string()),
		]
	);
}

#[test]
fn api_key_is_sent_when_configured() {
	let url = gf_providers::geocoder::request_url(&geocoder_config(Some("k-123")), "Venice")
		.expect("Failed to build URL.");

	assert!(url.query_pairs().any(|(k, v)| k == "key" && v == "k-123"));
}

#[test]
fn builds_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-client".to_string(), Value::String("guidefinder".to_string()));

	let headers = gf_providers::request_headers(&defaults).expect("Failed to build headers.");

	assert_eq!(headers.get("x-client").expect("Missing header."), "guidefinder");
}

#[test]
fn non_string_header_is_rejected() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), serde_json::json!(3));

	assert!(gf_providers::request_headers(&defaults).is_err());
}
