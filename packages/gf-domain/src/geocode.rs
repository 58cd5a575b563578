//! Parsing of geocoder responses (Google geocode JSON layout).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{geo::GeoPoint, location_query::PlaceKind};

const LAND_RESULT_TYPES: [&str; 5] =
	["locality", "administrative_area_level_2", "point_of_interest", "street_address", "route"];

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
	#[serde(default)]
	pub results: Vec<Value>,
	#[serde(default)]
	pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
	#[serde(default)]
	pub types: Vec<String>,
	#[serde(default)]
	pub address_components: Vec<AddressComponent>,
	pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
	pub long_name: String,
	pub short_name: String,
	#[serde(default)]
	pub types: Vec<String>,
}
impl AddressComponent {
	fn primary_type(&self) -> Option<&str> {
		self.types.first().map(String::as_str)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
	pub location: LatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatLng {
	pub lat: f64,
	pub lng: f64,
}

/// A region as named by the geocoder: `(long_name, short_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
	pub name: String,
	pub abbr: String,
}

/// One geocoder hit chosen for a land or water lookup, with its raw JSON kept for caching.
#[derive(Debug, Clone)]
pub struct GeocodeMatch {
	pub result: GeocodeResult,
	pub raw: Value,
	pub water: bool,
}
impl GeocodeMatch {
	pub fn point(&self) -> GeoPoint {
		GeoPoint::new(self.result.geometry.location.lat, self.result.geometry.location.lng)
	}

	pub fn kind(&self) -> PlaceKind {
		PlaceKind::from_geocoder_types(&self.result.types, self.water)
	}

	/// Short name of the first address component, used as the country/state key when the
	/// match itself is a country or a state.
	pub fn first_short_name(&self) -> Option<&str> {
		self.result.address_components.first().map(|component| component.short_name.as_str())
	}
}

/// Canonical names pulled out of a geocoder match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPlace {
	pub name: String,
	pub state: Option<Region>,
	pub country: Option<Region>,
	pub point: GeoPoint,
}

pub fn decode_response(raw: Value) -> Result<GeocodeResponse, serde_json::Error> {
	serde_json::from_value(raw)
}

/// First result whose `natural_feature` membership equals `water`. Results that do not fit
/// the expected layout are skipped.
pub fn select_result(response: &GeocodeResponse, water: bool) -> Option<GeocodeMatch> {
	response.results.iter().find_map(|raw| {
		let result: GeocodeResult = serde_json::from_value(raw.clone()).ok()?;
		let is_water = result.types.iter().any(|kind| kind == "natural_feature");

		(is_water == water).then(|| GeocodeMatch { result, raw: raw.clone(), water })
	})
}

/// Extracts the canonical place name and its regions.
///
/// Land matches must be a city-like result (locality, county, point of interest, street
/// address or route) and carry both a name and a country. Water matches only need a name.
pub fn parse_place(found: &GeocodeMatch) -> Option<ParsedPlace> {
	let result = &found.result;

	if !found.water {
		let primary = result.types.first().map(String::as_str)?;

		if !LAND_RESULT_TYPES.contains(&primary) {
			return None;
		}
	}

	let mut name = None;
	let mut state = None;
	let mut country = None;

	for component in &result.address_components {
		let region =
			|| Region { name: component.long_name.clone(), abbr: component.short_name.clone() };

		match component.primary_type() {
			Some("locality" | "administrative_area_level_2") if !found.water =>
				if name.is_none() {
					name = Some(component.long_name.clone());
				},
			Some("natural_feature") if found.water =>
				if name.is_none() {
					name = Some(component.long_name.clone());
				},
			Some("administrative_area_level_1") =>
				if state.is_none() {
					state = Some(region());
				},
			Some("country") =>
				if country.is_none() {
					country = Some(region());
				},
			_ => {},
		}
	}

	let name = name?;

	if !found.water && country.is_none() {
		return None;
	}

	Some(ParsedPlace { name, state, country, point: found.point() })
}
