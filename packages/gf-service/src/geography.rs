use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use gf_domain::{
	geo::{DistanceUnit, GeoPoint},
	geocode::{self, GeocodeMatch, ParsedPlace},
	rules,
};
use gf_storage::{
	geography::{self as store, LOCATION_COLUMNS, NewPlace, WATER_BODY_COLUMNS},
	models::{Country, GeoRelation, Location, State, WaterBody},
};

use crate::{Error, GuideService, Result};

const PLACE_NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRequest {
	pub abbr: String,
	pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateRequest {
	pub country_abbr: String,
	pub name: String,
	#[serde(default)]
	pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationRequest {
	pub city: String,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaterBodyRequest {
	pub name: String,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationRequest {
	pub location_id: Uuid,
	pub water_body_id: Uuid,
	#[serde(default)]
	pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyRequest {
	pub lat: f64,
	pub lng: f64,
	#[serde(default)]
	pub radius: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyResponse {
	pub locations: Vec<Location>,
	pub water_bodies: Vec<WaterBody>,
}

impl GuideService {
	pub async fn create_country(&self, req: CountryRequest) -> Result<Country> {
		if req.abbr.trim().chars().count() != 2 {
			return Err(rules::RuleViolation::new("abbr", "Must be a two-letter code.").into());
		}

		let mut conn = self.db.pool.acquire().await?;

		Ok(store::get_or_create_country(&mut conn, &req.abbr, &req.name).await?)
	}

	pub async fn create_state(&self, req: StateRequest) -> Result<State> {
		let name = rules::required_text("name", &req.name, PLACE_NAME_MAX_CHARS)?;
		let mut conn = self.db.pool.acquire().await?;
		let country = find_country(&mut conn, &req.country_abbr)
			.await?
			.ok_or_else(|| rules::RuleViolation::new("country_abbr", "Unknown country."))?;
		let key = req.key.unwrap_or_default();

		Ok(store::get_or_create_state(&mut conn, &country.abbr, &name, &key).await?)
	}

	/// Geocodes `city, state, country` and caches the canonical place.
	pub async fn create_location(&self, req: LocationRequest) -> Result<Location> {
		let city = rules::required_text("city", &req.city, PLACE_NAME_MAX_CHARS)?;
		let address = join_address(&[Some(city.as_str()), req.state.as_deref(), req.country.as_deref()]);
		let found = self
			.geocode_match(&address, false)
			.await?
			.ok_or_else(|| rules::RuleViolation::new("city", "The geocoder could not find this city."))?;
		let parsed = geocode::parse_place(&found)
			.ok_or_else(|| rules::RuleViolation::new("city", "The geocoder result is not a city."))?;
		let mut tx = self.db.pool.begin().await?;
		let location = self.cache_location(&mut tx, &found, &parsed).await?;

		tx.commit().await?;

		Ok(location)
	}

	/// Geocodes a water body, caches it and links it to the locations around it.
	pub async fn create_water_body(&self, req: WaterBodyRequest) -> Result<WaterBody> {
		let name = rules::required_text("name", &req.name, PLACE_NAME_MAX_CHARS)?;
		let address = join_address(&[Some(name.as_str()), req.state.as_deref(), req.country.as_deref()]);
		let found = self.geocode_match(&address, true).await?.ok_or_else(|| {
			rules::RuleViolation::new("name", "The geocoder could not find this water body.")
		})?;
		let parsed = geocode::parse_place(&found)
			.ok_or_else(|| rules::RuleViolation::new("name", "The geocoder result has no name."))?;
		let mut tx = self.db.pool.begin().await?;
		let water_body = self.cache_water_body(&mut tx, &found, &parsed).await?;

		tx.commit().await?;

		Ok(water_body)
	}

	/// A customer-proposed link between a location and a water body. Stays unverified until an
	/// admin verifies it.
	pub async fn propose_relation(&self, req: RelationRequest) -> Result<GeoRelation> {
		let mut tx = self.db.pool.begin().await?;

		store::get_location(&mut tx, req.location_id).await?;
		store::get_water_body(&mut tx, req.water_body_id).await?;

		let relation =
			store::link_place_pair(&mut tx, req.location_id, req.water_body_id, false, req.customer_id)
				.await?;

		tx.commit().await?;

		Ok(relation)
	}

	pub async fn nearby(&self, req: NearbyRequest) -> Result<NearbyResponse> {
		let origin = GeoPoint::checked(req.lat, req.lng)
			.ok_or_else(|| Error::invalid("lat/lng must be a valid coordinate."))?;
		let radius = req.radius.unwrap_or(f64::from(self.cfg.search.radius));
		let unit = self.distance_unit();
		let mut conn = self.db.pool.acquire().await?;
		let location_ids = store::nearby_location_ids(&mut conn, origin, radius, unit).await?;
		let water_body_ids = store::nearby_water_body_ids(&mut conn, origin, radius, unit).await?;
		let sql = format!(
			"SELECT {LOCATION_COLUMNS} FROM locations WHERE location_id = ANY($1) \
ORDER BY array_position($1, location_id)"
		);
		let locations = sqlx::query_as::<_, Location>(&sql)
			.bind(&location_ids)
			.fetch_all(&mut *conn)
			.await?;
		let sql = format!(
			"SELECT {WATER_BODY_COLUMNS} FROM water_bodies WHERE water_body_id = ANY($1) \
ORDER BY array_position($1, water_body_id)"
		);
		let water_bodies = sqlx::query_as::<_, WaterBody>(&sql)
			.bind(&water_body_ids)
			.fetch_all(&mut *conn)
			.await?;

		Ok(NearbyResponse { locations, water_bodies })
	}

	pub(crate) fn distance_unit(&self) -> DistanceUnit {
		DistanceUnit::from_use_miles(self.cfg.search.use_miles)
	}

	pub(crate) async fn cache_location(
		&self,
		conn: &mut PgConnection,
		found: &GeocodeMatch,
		parsed: &ParsedPlace,
	) -> Result<Location> {
		let country = parsed
			.country
			.as_ref()
			.ok_or_else(|| Error::invalid("A cached location needs a country."))?;
		let country = store::get_or_create_country(conn, &country.abbr, &country.name).await?;
		let state_id = match &parsed.state {
			Some(state) =>
				Some(store::get_or_create_state(conn, &country.abbr, &state.name, &state.abbr).await?.state_id),
			None => None,
		};
		let location = store::insert_location(
			conn,
			&NewPlace {
				name: &parsed.name,
				state_id,
				country_abbr: Some(country.abbr.as_str()),
				point: parsed.point,
				geocode: &found.raw,
				is_verified: false,
			},
		)
		.await?;

		tracing::info!(location_id = %location.location_id, city = %location.city, "Cached geocoded location.");

		Ok(location)
	}

	pub(crate) async fn cache_water_body(
		&self,
		conn: &mut PgConnection,
		found: &GeocodeMatch,
		parsed: &ParsedPlace,
	) -> Result<WaterBody> {
		let (country_abbr, state_id) = match &parsed.country {
			Some(country) => {
				let country = store::get_or_create_country(conn, &country.abbr, &country.name).await?;
				let state_id = match &parsed.state {
					Some(state) => Some(
						store::get_or_create_state(conn, &country.abbr, &state.name, &state.abbr)
							.await?
							.state_id,
					),
					None => None,
				};

				(Some(country.abbr), state_id)
			},
			None => (None, None),
		};
		let water_body = store::insert_water_body(
			conn,
			&NewPlace {
				name: &parsed.name,
				state_id,
				country_abbr: country_abbr.as_deref(),
				point: parsed.point,
				geocode: &found.raw,
				is_verified: false,
			},
		)
		.await?;
		let radius = f64::from(self.cfg.search.association_radius);
		let nearby = store::nearby_location_ids(
			conn,
			GeoPoint::new(water_body.lat, water_body.lng),
			radius,
			self.distance_unit(),
		)
		.await?;

		for location_id in &nearby {
			store::link_place_pair(conn, *location_id, water_body.water_body_id, true, None).await?;
		}

		tracing::info!(
			water_body_id = %water_body.water_body_id,
			name = %water_body.name,
			associated = nearby.len(),
			"Cached geocoded water body."
		);

		Ok(water_body)
	}

	/// The cached location for a city, geocoding and caching it on a miss.
	pub(crate) async fn location_for_city(
		&self,
		city: &str,
		state: Option<&State>,
		country: &Country,
	) -> Result<Location> {
		let sql = format!(
			"SELECT {LOCATION_COLUMNS} FROM locations \
WHERE lower(city) = lower($1) AND country_abbr = $2 AND state_id IS NOT DISTINCT FROM $3 \
ORDER BY is_verified DESC, created_at \
LIMIT 1"
		);
		let cached = sqlx::query_as::<_, Location>(&sql)
			.bind(city.trim())
			.bind(country.abbr.as_str())
			.bind(state.map(|state| state.state_id))
			.fetch_optional(&self.db.pool)
			.await?;

		if let Some(location) = cached {
			return Ok(location);
		}

		let address = join_address(&[
			Some(city),
			state.map(|state| state.name.as_str()),
			Some(country.abbr.as_str()),
		]);
		let found = self
			.geocode_match(&address, false)
			.await?
			.ok_or_else(|| rules::RuleViolation::new("city", "The geocoder could not find this city."))?;
		let parsed = geocode::parse_place(&found)
			.ok_or_else(|| rules::RuleViolation::new("city", "The geocoder result is not a city."))?;
		let mut tx = self.db.pool.begin().await?;
		let location = self.cache_location(&mut tx, &found, &parsed).await?;

		tx.commit().await?;

		Ok(location)
	}
}

/// A country by ISO code or exact (case-insensitive) name.
pub(crate) async fn find_country(conn: &mut PgConnection, abbr_or_name: &str) -> Result<Option<Country>> {
	let row = sqlx::query_as::<_, Country>(
		"\
SELECT abbr, name, is_verified
FROM countries
WHERE upper(abbr) = upper($1) OR lower(name) = lower($1)
ORDER BY (upper(abbr) = upper($1)) DESC
LIMIT 1",
	)
	.bind(abbr_or_name.trim())
	.fetch_optional(&mut *conn)
	.await?;

	Ok(row)
}

/// Joins the non-blank parts of an address with `", "`.
pub(crate) fn join_address(parts: &[Option<&str>]) -> String {
	parts
		.iter()
		.flatten()
		.map(|part| part.trim())
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join(", ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn address_skips_blank_parts() {
		assert_eq!(join_address(&[Some("Venice"), None, Some(" US ")]), "Venice, US");
		assert_eq!(join_address(&[Some(" "), Some("LA")]), "LA");
	}
}
