//! Geocoder payloads in the layout the live API returns.

use serde_json::{Value, json};

/// A named region as `(long_name, short_name)`.
pub type Region<'a> = (&'a str, &'a str);

pub fn ok(results: Vec<Value>) -> Value {
	json!({ "status": "OK", "results": results })
}

pub fn zero_results() -> Value {
	json!({ "status": "ZERO_RESULTS", "results": [] })
}

/// A city result with its state and country components.
pub fn locality(city: &str, state: Region<'_>, country: Region<'_>, lat: f64, lng: f64) -> Value {
	json!({
		"types": ["locality", "political"],
		"address_components": [
			component(city, city, "locality"),
			component(state.0, state.1, "administrative_area_level_1"),
			component(country.0, country.1, "country"),
		],
		"geometry": { "location": { "lat": lat, "lng": lng } }
	})
}

pub fn water_body(name: &str, state: Region<'_>, country: Region<'_>, lat: f64, lng: f64) -> Value {
	json!({
		"types": ["natural_feature", "establishment"],
		"address_components": [
			component(name, name, "natural_feature"),
			component(state.0, state.1, "administrative_area_level_1"),
			component(country.0, country.1, "country"),
		],
		"geometry": { "location": { "lat": lat, "lng": lng } }
	})
}

pub fn venice_la() -> Value {
	ok(vec![locality("Venice", ("Louisiana", "LA"), ("United States", "US"), 29.2769, -89.3545)])
}

fn component(long_name: &str, short_name: &str, kind: &str) -> Value {
	json!({ "long_name": long_name, "short_name": short_name, "types": [kind, "political"] })
}
