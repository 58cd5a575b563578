//! Turns free-text locations into a candidate strategy: cached records first, the geocoder
//! second.

use serde::Serialize;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use gf_domain::{
	geo::GeoPoint,
	geocode,
	location_query::{self, CandidateStrategy, LocationQuery, PlaceKind},
};

use crate::{GuideService, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedFrom {
	Cache,
	Geocoder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
	pub kind: PlaceKind,
	pub source: ResolvedFrom,
	#[serde(flatten)]
	pub strategy: CandidateStrategy,
}

/// One comma-separated term, ready for exact and substring matching.
struct Term {
	exact: String,
	pattern: String,
}
impl Term {
	fn new(raw: &str) -> Self {
		Self { exact: raw.to_string(), pattern: location_query::contains_pattern(raw) }
	}
}

enum Hit {
	Point(GeoPoint),
	Key(String),
}

impl GuideService {
	pub async fn resolve_location(&self, raw: &str, radius: u32) -> Result<Option<ResolvedLocation>> {
		let Some(query) = LocationQuery::parse(raw) else {
			return Ok(None);
		};
		let mut conn = self.db.pool.acquire().await?;

		if let Some((kind, hit)) = lookup_cached(&mut conn, &query).await? {
			drop(conn);

			return Ok(Some(ResolvedLocation {
				kind,
				source: ResolvedFrom::Cache,
				strategy: strategy_for(kind, hit, radius),
			}));
		}

		drop(conn);

		self.resolve_remote(raw.trim(), radius).await
	}

	async fn resolve_remote(&self, raw: &str, radius: u32) -> Result<Option<ResolvedLocation>> {
		for water in [false, true] {
			let found = match self.geocode_match(raw, water).await {
				Ok(Some(found)) => found,
				Ok(None) => continue,
				Err(err) => {
					tracing::warn!(error = %err, location = %raw, water, "Geocoder lookup failed.");

					continue;
				},
			};

			tracing::info!(location = %raw, water, "Location resolved through the geocoder.");

			if let Some(parsed) = geocode::parse_place(&found) {
				let mut tx = self.db.pool.begin().await?;

				if water {
					self.cache_water_body(&mut tx, &found, &parsed).await?;
				} else {
					self.cache_location(&mut tx, &found, &parsed).await?;
				}

				tx.commit().await?;
			}

			let kind = found.kind();
			let hit = match kind {
				PlaceKind::Country | PlaceKind::State =>
					found.first_short_name().map(|name| Hit::Key(name.to_string())),
				PlaceKind::City | PlaceKind::WaterBody => None,
			}
			.unwrap_or(Hit::Point(found.point()));

			return Ok(Some(ResolvedLocation {
				kind,
				source: ResolvedFrom::Geocoder,
				strategy: strategy_for(kind, hit, radius),
			}));
		}

		tracing::warn!(location = %raw, "Geocoder found neither land nor water.");

		Ok(None)
	}
}

fn strategy_for(kind: PlaceKind, hit: Hit, radius: u32) -> CandidateStrategy {
	match (kind, hit) {
		(PlaceKind::Country, Hit::Key(abbr)) => CandidateStrategy::Country { abbr },
		(PlaceKind::State, Hit::Key(key)) => CandidateStrategy::State { key },
		(_, Hit::Point(point)) => CandidateStrategy::Radius { lat: point.lat, lng: point.lng, radius },
		(_, Hit::Key(key)) => CandidateStrategy::State { key },
	}
}

/// Runs the staged lookups for the query's arity. First hit wins.
async fn lookup_cached(
	conn: &mut PgConnection,
	query: &LocationQuery,
) -> Result<Option<(PlaceKind, Hit)>> {
	match query {
		LocationQuery::One(first) => {
			let a = Term::new(first);

			if let Some(point) = fetch_point(conn, city_stage(&a, None, None)).await? {
				return Ok(Some((PlaceKind::City, Hit::Point(point))));
			}
			if let Some(key) = fetch_key(conn, state_stage(&a, None)).await? {
				return Ok(Some((PlaceKind::State, Hit::Key(key))));
			}
			if let Some(abbr) = fetch_key(conn, country_stage(&a)).await? {
				return Ok(Some((PlaceKind::Country, Hit::Key(abbr))));
			}

			Ok(fetch_point(conn, water_stage(&a, Region::Any(None)))
				.await?
				.map(|point| (PlaceKind::WaterBody, Hit::Point(point))))
		},
		LocationQuery::Two(first, second) => {
			let (a, b) = (Term::new(first), Term::new(second));

			if let Some(point) = fetch_point(conn, city_stage(&a, Some(&b), None)).await? {
				return Ok(Some((PlaceKind::City, Hit::Point(point))));
			}
			if let Some(key) = fetch_key(conn, state_stage(&a, Some(&b))).await? {
				return Ok(Some((PlaceKind::State, Hit::Key(key))));
			}

			Ok(fetch_point(conn, water_stage(&a, Region::Any(Some(&b))))
				.await?
				.map(|point| (PlaceKind::WaterBody, Hit::Point(point))))
		},
		LocationQuery::Three(first, second, third) => {
			let (a, b, c) = (Term::new(first), Term::new(second), Term::new(third));

			if let Some(point) = fetch_point(conn, city_stage(&a, Some(&b), Some(&c))).await? {
				return Ok(Some((PlaceKind::City, Hit::Point(point))));
			}

			Ok(fetch_point(conn, water_stage(&a, Region::Both(&b, &c)))
				.await?
				.map(|point| (PlaceKind::WaterBody, Hit::Point(point))))
		},
	}
}

enum Region<'a> {
	/// Matches the state or the country (or nothing when `None`).
	Any(Option<&'a Term>),
	/// Matches the state and the country.
	Both(&'a Term, &'a Term),
}

async fn fetch_point(
	conn: &mut PgConnection,
	mut builder: QueryBuilder<'_, Postgres>,
) -> Result<Option<GeoPoint>> {
	let row: Option<(f64, f64)> = builder.build_query_as().fetch_optional(&mut *conn).await?;

	Ok(row.map(|(lat, lng)| GeoPoint::new(lat, lng)))
}

async fn fetch_key(
	conn: &mut PgConnection,
	mut builder: QueryBuilder<'_, Postgres>,
) -> Result<Option<String>> {
	let key: Option<String> = builder.build_query_scalar().fetch_optional(&mut *conn).await?;

	Ok(key)
}

fn push_state_match(builder: &mut QueryBuilder<'_, Postgres>, term: &Term) {
	builder.push("(lower(s.key) = lower(");
	builder.push_bind(term.exact.clone());
	builder.push(") OR s.name ILIKE ");
	builder.push_bind(term.pattern.clone());
	builder.push(")");
}

fn push_country_match(builder: &mut QueryBuilder<'_, Postgres>, term: &Term) {
	builder.push("(upper(co.abbr) = upper(");
	builder.push_bind(term.exact.clone());
	builder.push(") OR co.name ILIKE ");
	builder.push_bind(term.pattern.clone());
	builder.push(")");
}

fn city_stage<'a>(
	city: &Term,
	state: Option<&Term>,
	country: Option<&Term>,
) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT l.lat, l.lng FROM locations l \
LEFT JOIN states s ON s.state_id = l.state_id \
LEFT JOIN countries co ON co.abbr = l.country_abbr \
WHERE l.city ILIKE ",
	);

	builder.push_bind(city.pattern.clone());

	if let Some(state) = state {
		builder.push(" AND ");
		push_state_match(&mut builder, state);
	}
	if let Some(country) = country {
		builder.push(" AND ");
		push_country_match(&mut builder, country);
	}

	builder.push(" ORDER BY l.is_verified DESC, l.created_at, l.location_id LIMIT 1");

	builder
}

/// A state that has at least one cached location, optionally within a matching country.
fn state_stage<'a>(state: &Term, country: Option<&Term>) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT s.key FROM locations l \
JOIN states s ON s.state_id = l.state_id \
JOIN countries co ON co.abbr = s.country_abbr \
WHERE ",
	);

	push_state_match(&mut builder, state);

	if let Some(country) = country {
		builder.push(" AND ");
		push_country_match(&mut builder, country);
	}

	builder.push(" ORDER BY s.is_verified DESC, s.name LIMIT 1");

	builder
}

/// A country that has at least one cached location.
fn country_stage<'a>(country: &Term) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT co.abbr FROM locations l JOIN countries co ON co.abbr = l.country_abbr WHERE ",
	);

	push_country_match(&mut builder, country);
	builder.push(" ORDER BY co.is_verified DESC, co.name LIMIT 1");

	builder
}

fn water_stage<'a>(name: &Term, region: Region<'_>) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new(
		"SELECT w.lat, w.lng FROM water_bodies w \
LEFT JOIN states s ON s.state_id = w.state_id \
LEFT JOIN countries co ON co.abbr = w.country_abbr \
WHERE w.name ILIKE ",
	);

	builder.push_bind(name.pattern.clone());

	match region {
		Region::Any(None) => {},
		Region::Any(Some(term)) => {
			builder.push(" AND (");
			push_state_match(&mut builder, term);
			builder.push(" OR ");
			push_country_match(&mut builder, term);
			builder.push(")");
		},
		Region::Both(state, country) => {
			builder.push(" AND ");
			push_state_match(&mut builder, state);
			builder.push(" AND ");
			push_country_match(&mut builder, country);
		},
	}

	builder.push(" ORDER BY w.is_verified DESC, w.created_at, w.water_body_id LIMIT 1");

	builder
}
