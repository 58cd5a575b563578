//! Countries, states, cached places and their proximity lookups.

use serde_json::Value;
use sqlx::PgConnection;
use uuid::Uuid;

use gf_domain::geo::{self, DistanceUnit, GeoPoint};

use crate::{
	Error, Result,
	models::{Country, GeoRelation, Location, State, WaterBody},
};

pub const LOCATION_COLUMNS: &str =
	"location_id, city, state_id, country_abbr, lat, lng, geocode, is_verified, created_at";
pub const WATER_BODY_COLUMNS: &str =
	"water_body_id, name, state_id, country_abbr, lat, lng, geocode, is_verified, created_at";

/// A place about to be cached.
#[derive(Debug, Clone)]
pub struct NewPlace<'a> {
	pub name: &'a str,
	pub state_id: Option<Uuid>,
	pub country_abbr: Option<&'a str>,
	pub point: GeoPoint,
	pub geocode: &'a Value,
	pub is_verified: bool,
}

pub async fn get_or_create_country(
	executor: &mut PgConnection,
	abbr: &str,
	name: &str,
) -> Result<Country> {
	let abbr = abbr.trim().to_ascii_uppercase();
	let name = name.trim();

	if abbr.is_empty() || name.is_empty() {
		return Err(Error::InvalidArgument("country abbr and name must be non-empty".to_string()));
	}

	sqlx::query("INSERT INTO countries (abbr, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
		.bind(abbr.as_str())
		.bind(name)
		.execute(&mut *executor)
		.await?;

	let row = sqlx::query_as::<_, Country>(
		"\
SELECT abbr, name, is_verified
FROM countries
WHERE abbr = $1 OR name = $2
ORDER BY (abbr = $1) DESC
LIMIT 1",
	)
	.bind(abbr.as_str())
	.bind(name)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_or_create_state(
	executor: &mut PgConnection,
	country_abbr: &str,
	name: &str,
	key: &str,
) -> Result<State> {
	let name = name.trim();

	if name.is_empty() {
		return Err(Error::InvalidArgument("state name must be non-empty".to_string()));
	}

	let key = if key.trim().is_empty() {
		gf_domain::naming::default_state_key(name)
	} else {
		key.trim().to_string()
	};

	sqlx::query(
		"\
INSERT INTO states (state_id, country_abbr, key, name)
VALUES ($1, $2, $3, $4)
ON CONFLICT (country_abbr, name) DO NOTHING",
	)
	.bind(Uuid::new_v4())
	.bind(country_abbr)
	.bind(key.as_str())
	.bind(name)
	.execute(&mut *executor)
	.await?;

	let row = sqlx::query_as::<_, State>(
		"\
SELECT state_id, country_abbr, key, name, is_verified
FROM states
WHERE country_abbr = $1 AND name = $2",
	)
	.bind(country_abbr)
	.bind(name)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

/// Finds a state of `country_abbr` by exact key or case-insensitive name.
pub async fn find_state(
	executor: &mut PgConnection,
	country_abbr: &str,
	key_or_name: &str,
) -> Result<Option<State>> {
	let row = sqlx::query_as::<_, State>(
		"\
SELECT state_id, country_abbr, key, name, is_verified
FROM states
WHERE country_abbr = $1 AND (key = $2 OR lower(name) = lower($2))
ORDER BY (key = $2) DESC
LIMIT 1",
	)
	.bind(country_abbr)
	.bind(key_or_name.trim())
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_location(executor: &mut PgConnection, location_id: Uuid) -> Result<Location> {
	let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE location_id = $1");

	sqlx::query_as::<_, Location>(&sql)
		.bind(location_id)
		.fetch_optional(&mut *executor)
		.await?
		.ok_or_else(|| Error::missing("location", location_id))
}

pub async fn get_water_body(executor: &mut PgConnection, water_body_id: Uuid) -> Result<WaterBody> {
	let sql = format!("SELECT {WATER_BODY_COLUMNS} FROM water_bodies WHERE water_body_id = $1");

	sqlx::query_as::<_, WaterBody>(&sql)
		.bind(water_body_id)
		.fetch_optional(&mut *executor)
		.await?
		.ok_or_else(|| Error::missing("water body", water_body_id))
}

/// Caches a location. A place whose exact point is already cached is returned unchanged.
pub async fn insert_location(executor: &mut PgConnection, place: &NewPlace<'_>) -> Result<Location> {
	sqlx::query(
		"\
INSERT INTO locations (location_id, city, state_id, country_abbr, lat, lng, geocode, is_verified)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (lat, lng) DO NOTHING",
	)
	.bind(Uuid::new_v4())
	.bind(place.name)
	.bind(place.state_id)
	.bind(place.country_abbr)
	.bind(place.point.lat)
	.bind(place.point.lng)
	.bind(place.geocode)
	.bind(place.is_verified)
	.execute(&mut *executor)
	.await?;

	let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE lat = $1 AND lng = $2");
	let row = sqlx::query_as::<_, Location>(&sql)
		.bind(place.point.lat)
		.bind(place.point.lng)
		.fetch_one(&mut *executor)
		.await?;

	Ok(row)
}

/// Caches a water body. An existing record with the same point or name is returned instead.
pub async fn insert_water_body(
	executor: &mut PgConnection,
	place: &NewPlace<'_>,
) -> Result<WaterBody> {
	sqlx::query(
		"\
INSERT INTO water_bodies (water_body_id, name, state_id, country_abbr, lat, lng, geocode, is_verified)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT DO NOTHING",
	)
	.bind(Uuid::new_v4())
	.bind(place.name)
	.bind(place.state_id)
	.bind(place.country_abbr)
	.bind(place.point.lat)
	.bind(place.point.lng)
	.bind(place.geocode)
	.bind(place.is_verified)
	.execute(&mut *executor)
	.await?;

	let sql = format!(
		"SELECT {WATER_BODY_COLUMNS} FROM water_bodies \
WHERE (lat = $1 AND lng = $2) OR name = $3 \
ORDER BY (lat = $1 AND lng = $2) DESC LIMIT 1"
	);
	let row = sqlx::query_as::<_, WaterBody>(&sql)
		.bind(place.point.lat)
		.bind(place.point.lng)
		.bind(place.name)
		.fetch_one(&mut *executor)
		.await?;

	Ok(row)
}

/// Ids of cached locations strictly within `radius` of `origin`, nearest first.
pub async fn nearby_location_ids(
	executor: &mut PgConnection,
	origin: GeoPoint,
	radius: f64,
	unit: DistanceUnit,
) -> Result<Vec<Uuid>> {
	nearby_ids(executor, "locations", "location_id", origin, radius, unit).await
}

/// Ids of cached water bodies strictly within `radius` of `origin`, nearest first.
pub async fn nearby_water_body_ids(
	executor: &mut PgConnection,
	origin: GeoPoint,
	radius: f64,
	unit: DistanceUnit,
) -> Result<Vec<Uuid>> {
	nearby_ids(executor, "water_bodies", "water_body_id", origin, radius, unit).await
}

async fn nearby_ids(
	executor: &mut PgConnection,
	table: &str,
	id_column: &str,
	origin: GeoPoint,
	radius: f64,
	unit: DistanceUnit,
) -> Result<Vec<Uuid>> {
	if !radius.is_finite() || radius <= 0.0 {
		return Err(Error::InvalidArgument("radius must be a positive number".to_string()));
	}

	let distance = geo::haversine_sql("$1::float8", "$2::float8", unit);
	let sql = format!(
		"SELECT {id_column} FROM {table} WHERE {distance} < $3::float8 ORDER BY {distance}, {id_column}"
	);
	let ids: Vec<Uuid> = sqlx::query_scalar(&sql)
		.bind(origin.lat)
		.bind(origin.lng)
		.bind(radius)
		.fetch_all(&mut *executor)
		.await?;

	Ok(ids)
}

/// Records that a water body is reachable from a location. Re-linking an existing pair only
/// ever upgrades it to verified.
pub async fn link_place_pair(
	executor: &mut PgConnection,
	location_id: Uuid,
	water_body_id: Uuid,
	is_verified: bool,
	added_by: Option<Uuid>,
) -> Result<GeoRelation> {
	let row = sqlx::query_as::<_, GeoRelation>(
		"\
INSERT INTO geo_relations (relation_id, location_id, water_body_id, is_verified, added_by)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (location_id, water_body_id)
DO UPDATE SET is_verified = geo_relations.is_verified OR EXCLUDED.is_verified
RETURNING relation_id, location_id, water_body_id, is_verified, added_by, added_at",
	)
	.bind(Uuid::new_v4())
	.bind(location_id)
	.bind(water_body_id)
	.bind(is_verified)
	.bind(added_by)
	.fetch_one(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn water_body_ids_for_location(
	executor: &mut PgConnection,
	location_id: Uuid,
) -> Result<Vec<Uuid>> {
	let ids = sqlx::query_scalar(
		"SELECT water_body_id FROM geo_relations WHERE location_id = $1 ORDER BY added_at",
	)
	.bind(location_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(ids)
}

pub async fn location_ids_for_water_body(
	executor: &mut PgConnection,
	water_body_id: Uuid,
) -> Result<Vec<Uuid>> {
	let ids = sqlx::query_scalar(
		"SELECT location_id FROM geo_relations WHERE water_body_id = $1 ORDER BY added_at",
	)
	.bind(water_body_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(ids)
}
