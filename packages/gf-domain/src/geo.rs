use serde::{Deserialize, Serialize};

const EARTH_RADIUS_MILES: f64 = 3_959.0;
const EARTH_RADIUS_KILOMETERS: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}
impl GeoPoint {
	pub fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}

	/// Rejects points outside the valid coordinate ranges, including the legacy 1000.0 sentinel.
	pub fn checked(lat: f64, lng: f64) -> Option<Self> {
		let valid = lat.is_finite()
			&& lng.is_finite()
			&& (-90.0..=90.0).contains(&lat)
			&& (-180.0..=180.0).contains(&lng);

		valid.then_some(Self { lat, lng })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
	Miles,
	Kilometers,
}
impl DistanceUnit {
	pub fn from_use_miles(use_miles: bool) -> Self {
		if use_miles { Self::Miles } else { Self::Kilometers }
	}

	pub fn earth_radius(self) -> f64 {
		match self {
			Self::Miles => EARTH_RADIUS_MILES,
			Self::Kilometers => EARTH_RADIUS_KILOMETERS,
		}
	}
}

pub fn haversine_distance(a: GeoPoint, b: GeoPoint, unit: DistanceUnit) -> f64 {
	let lat1 = a.lat.to_radians();
	let lat2 = b.lat.to_radians();
	let d_lat = (b.lat - a.lat).to_radians();
	let d_lng = (b.lng - a.lng).to_radians();
	let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
	// Rounding can push `h` a hair above 1.0 for antipodal points.
	let c = 2.0 * h.sqrt().min(1.0).asin();

	unit.earth_radius() * c
}

pub fn within_radius(a: GeoPoint, b: GeoPoint, radius: f64, unit: DistanceUnit) -> bool {
	haversine_distance(a, b, unit) < radius
}

/// SQL expression computing the haversine distance from `($lat, $lng)` to the row's
/// `lat`/`lng` columns. Placeholders are filled positionally by the caller.
pub fn haversine_sql(lat_param: &str, lng_param: &str, unit: DistanceUnit) -> String {
	format!(
		"({radius} * 2 * asin(least(1.0, sqrt(\
power(sin(radians(lat - {lat_param}) / 2), 2) + \
cos(radians({lat_param})) * cos(radians(lat)) * power(sin(radians(lng - {lng_param}) / 2), 2)\
))))",
		radius = unit.earth_radius(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_distance_for_same_point() {
		let p = GeoPoint::new(29.95, -90.07);

		assert!(haversine_distance(p, p, DistanceUnit::Miles).abs() < 1e-9);
	}

	#[test]
	fn new_orleans_to_houston_is_about_318_miles() {
		let new_orleans = GeoPoint::new(29.9511, -90.0715);
		let houston = GeoPoint::new(29.7604, -95.3698);
		let miles = haversine_distance(new_orleans, houston, DistanceUnit::Miles);
		let km = haversine_distance(new_orleans, houston, DistanceUnit::Kilometers);

		assert!((miles - 318.0).abs() < 3.0, "unexpected distance {miles}");
		assert!((km / miles - 6_371.0 / 3_959.0).abs() < 1e-9);
	}

	#[test]
	fn radius_is_strict() {
		let a = GeoPoint::new(0.0, 0.0);
		let b = GeoPoint::new(0.0, 1.0);
		let d = haversine_distance(a, b, DistanceUnit::Kilometers);

		assert!(!within_radius(a, b, d, DistanceUnit::Kilometers));
		assert!(within_radius(a, b, d + 0.001, DistanceUnit::Kilometers));
	}

	#[test]
	fn sentinel_coordinates_are_rejected() {
		assert!(GeoPoint::checked(1_000.0, 1_000.0).is_none());
		assert!(GeoPoint::checked(f64::NAN, 0.0).is_none());
		assert_eq!(GeoPoint::checked(10.0, 20.0), Some(GeoPoint::new(10.0, 20.0)));
	}

	#[test]
	fn sql_uses_unit_radius() {
		let sql = haversine_sql("$1", "$2", DistanceUnit::Miles);

		assert!(sql.starts_with("(3959 * 2 * asin("));
		assert!(sql.contains("radians(lat - $1)"));
		assert!(sql.contains("radians(lng - $2)"));
	}
}
