use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use gf_domain::{
	geo,
	location_query::{self, CandidateStrategy},
	naming,
	search_params::SearchParams,
};

use crate::{GuideService, ResolvedLocation, Result};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SearchItem {
	pub guide_id: Uuid,
	pub customer_id: Uuid,
	#[sqlx(skip)]
	pub full_name: String,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub company: Option<String>,
	pub experience: i32,
	pub blurb: Option<String>,
	pub is_new: bool,
	pub full_day_price_cents: i64,
	pub search_price_cents: i64,
	pub num_recommends: i32,
	pub min_party: Option<i32>,
	pub max_party: Option<i32>,
	pub avg_party: Option<i32>,
	pub max_boat: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub location: String,
	pub date: Option<Date>,
	pub resolved: Option<ResolvedLocation>,
	pub items: Vec<SearchItem>,
}
impl SearchResponse {
	fn empty(location: String, date: Option<Date>, resolved: Option<ResolvedLocation>) -> Self {
		Self { location, date, resolved, items: Vec::new() }
	}
}

impl GuideService {
	/// Guide search over the raw query-string map.
	pub async fn search(&self, query: &HashMap<String, String>) -> Result<SearchResponse> {
		let today = OffsetDateTime::now_utc().date();
		let Some(params) = SearchParams::parse(query, self.cfg.search.radius, today)? else {
			return Ok(SearchResponse::empty(String::new(), None, None));
		};
		let Some(resolved) = self.resolve_location(&params.location, params.radius).await? else {
			return Ok(SearchResponse::empty(params.location, Some(params.date), None));
		};
		let mut builder = build_search_query(
			&params,
			&resolved.strategy,
			self.distance_unit(),
			self.cfg.search.result_limit,
		);
		let mut items: Vec<SearchItem> = builder.build_query_as().fetch_all(&self.db.pool).await?;

		for item in &mut items {
			item.full_name =
				naming::full_name(&item.first_name, item.middle_name.as_deref(), &item.last_name);
		}

		tracing::debug!(
			location = %params.location,
			kind = ?resolved.kind,
			source = ?resolved.source,
			ordering = ?params.ordering,
			results = items.len(),
			"Guide search completed."
		);

		Ok(SearchResponse {
			location: params.location,
			date: Some(params.date),
			resolved: Some(resolved),
			items,
		})
	}
}

/// Composes the whole pipeline as one statement: candidates, then the date, fish/method,
/// capacity, price and amenity filters, then ordering and the cap.
pub fn build_search_query<'a>(
	params: &SearchParams,
	strategy: &CandidateStrategy,
	unit: geo::DistanceUnit,
	limit: u32,
) -> QueryBuilder<'a, Postgres> {
	let mut builder = QueryBuilder::new("WITH ");

	push_candidates(&mut builder, strategy, unit);
	builder.push(
		" \
SELECT
	g.guide_id,
	g.customer_id,
	c.first_name,
	c.middle_name,
	c.last_name,
	g.company,
	g.experience,
	g.blurb,
	g.is_new,
	g.full_day_price_cents,
	g.search_price_cents,
	g.num_recommends,
	p.min_party,
	p.max_party,
	p.avg_party,
	(SELECT max(b.length_ft) FROM guide_boats b WHERE b.guide_id = g.guide_id) AS max_boat
FROM guides g
JOIN customers c ON c.customer_id = g.customer_id
LEFT JOIN guide_party p ON p.guide_id = g.guide_id
LEFT JOIN guide_faq f ON f.guide_id = g.guide_id
WHERE g.guide_id IN (SELECT guide_id FROM candidates)",
	);

	push_date_filter(&mut builder, params.date);
	push_catch_filters(&mut builder, params);
	push_capacity_filters(&mut builder, params);

	if let Some(price) = params.price {
		builder.push(" AND g.search_price_cents >= ");
		builder.push_bind(price.min_cents);
		builder.push(" AND g.search_price_cents <= ");
		builder.push_bind(price.max_cents);
	}
	if let Some(is_new) = params.is_new {
		builder.push(" AND g.is_new = ");
		builder.push_bind(is_new);
	}

	for amenity in &params.amenities {
		builder.push(format!(" AND f.{} = ", amenity.column));
		builder.push_bind(amenity.value);
	}

	builder.push(" ORDER BY ");
	builder.push(params.ordering.order_by_sql());
	builder.push(" LIMIT ");
	builder.push_bind(i64::from(limit));

	builder
}

fn push_candidates(
	builder: &mut QueryBuilder<'_, Postgres>,
	strategy: &CandidateStrategy,
	unit: geo::DistanceUnit,
) {
	match strategy {
		CandidateStrategy::Country { abbr } => {
			builder.push(
				"candidates AS (\
SELECT gl.guide_id FROM guide_locations gl \
JOIN locations l ON l.location_id = gl.location_id \
WHERE upper(l.country_abbr) = upper(",
			);
			builder.push_bind(abbr.clone());
			builder.push("))");
		},
		CandidateStrategy::State { key } => {
			builder.push(
				"candidates AS (\
SELECT gl.guide_id FROM guide_locations gl \
JOIN locations l ON l.location_id = gl.location_id \
JOIN states s ON s.state_id = l.state_id \
WHERE lower(s.key) = lower(",
			);
			builder.push_bind(key.clone());
			builder.push("))");
		},
		CandidateStrategy::Radius { lat, lng, radius } => {
			let distance = geo::haversine_sql("o.olat", "o.olng", unit);

			builder.push("origin AS (SELECT ");
			builder.push_bind(*lat);
			builder.push("::float8 AS olat, ");
			builder.push_bind(*lng);
			builder.push("::float8 AS olng, ");
			builder.push_bind(f64::from(*radius));
			builder.push("::float8 AS max_distance), ");
			builder.push(format!(
				"candidates AS (\
SELECT gl.guide_id FROM guide_locations gl \
JOIN locations l ON l.location_id = gl.location_id \
CROSS JOIN origin o \
WHERE {distance} < o.max_distance \
UNION \
SELECT gw.guide_id FROM guide_water_bodies gw \
JOIN water_bodies w ON w.water_body_id = gw.water_body_id \
CROSS JOIN origin o \
WHERE {distance} < o.max_distance)"
			));
		},
	}
}

/// Guides already booked on any part of the requested day are dropped.
fn push_date_filter(builder: &mut QueryBuilder<'_, Postgres>, date: Date) {
	let day_start = date.with_time(Time::MIDNIGHT).assume_utc();
	let day_end = day_start + time::Duration::DAY;

	builder.push(
		" AND NOT EXISTS (SELECT 1 FROM trips t WHERE t.guide_id = g.guide_id AND t.starts_at < ",
	);
	builder.push_bind(day_end);
	builder.push(" AND t.ends_at >= ");
	builder.push_bind(day_start);
	builder.push(")");
}

fn push_catch_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &SearchParams) {
	if let Some(fish) = &params.fish {
		let pattern = location_query::contains_pattern(fish);

		builder.push(
			" AND EXISTS (SELECT 1 FROM guide_fish gf JOIN fish fi ON fi.fish_id = gf.fish_id \
WHERE gf.guide_id = g.guide_id AND (",
		);

		for (idx, column) in
			["fi.name", "fi.fish_type", "fi.alt_name_1", "fi.alt_name_2", "fi.alt_name_3"]
				.iter()
				.enumerate()
		{
			if idx > 0 {
				builder.push(" OR ");
			}

			builder.push(format!("{column} ILIKE "));
			builder.push_bind(pattern.clone());
		}

		builder.push("))");
	}
	if let Some(water_type) = params.water_type {
		builder.push(
			" AND EXISTS (SELECT 1 FROM guide_fish gf JOIN fish fi ON fi.fish_id = gf.fish_id \
WHERE gf.guide_id = g.guide_id AND fi.water_type = ",
		);
		builder.push_bind(water_type.as_str());
		builder.push(")");
	}
	if let Some(method) = &params.method {
		builder.push(
			" AND EXISTS (SELECT 1 FROM guide_methods gm \
JOIN fishing_types ft ON ft.fishing_type_id = gm.fishing_type_id \
WHERE gm.guide_id = g.guide_id AND ft.method ILIKE ",
		);
		builder.push_bind(location_query::contains_pattern(method));
		builder.push(")");
	}
}

/// Boat size must fall inside the guide's boat-length range; guides without boats pass.
fn push_capacity_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &SearchParams) {
	if let Some(size) = params.boat_size {
		builder.push(
			" AND NOT EXISTS (SELECT 1 FROM guide_boats b WHERE b.guide_id = g.guide_id \
GROUP BY b.guide_id HAVING max(b.length_ft) < ",
		);
		builder.push_bind(size);
		builder.push(" OR min(b.length_ft) > ");
		builder.push_bind(size);
		builder.push(")");
	}
	if let Some(size) = params.party_size {
		builder.push(" AND p.min_party <= ");
		builder.push_bind(size);
		builder.push(" AND p.max_party >= ");
		builder.push_bind(size);
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use time::macros::date;

	use gf_domain::geo::DistanceUnit;

	use super::*;

	fn params(pairs: &[(&str, &str)]) -> SearchParams {
		let query: HashMap<String, String> =
			pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();

		SearchParams::parse(&query, 100, date!(2026 - 10 - 18))
			.expect("Params must parse.")
			.expect("Location must be present.")
	}

	#[test]
	fn minimal_query_filters_by_date_and_caps() {
		let strategy = CandidateStrategy::State { key: "LA".to_string() };
		let builder =
			build_search_query(&params(&[("loc", "Louisiana")]), &strategy, DistanceUnit::Miles, 50);
		let sql = builder.sql();

		assert!(sql.starts_with("WITH candidates AS ("));
		assert!(sql.contains("lower(s.key) = lower($1)"));
		assert!(sql.contains("t.starts_at < $2 AND t.ends_at >= $3"));
		assert!(sql.contains("ORDER BY full_day_price_cents ASC NULLS LAST"));
		assert!(sql.ends_with("LIMIT $4"));
		assert!(!sql.contains("guide_fish"));
	}

	#[test]
	fn radius_candidates_bind_origin_once() {
		let strategy = CandidateStrategy::Radius { lat: 29.2, lng: -89.3, radius: 40 };
		let builder =
			build_search_query(&params(&[("loc", "Venice")]), &strategy, DistanceUnit::Miles, 50);
		let sql = builder.sql();

		assert!(sql.starts_with("WITH origin AS (SELECT $1::float8 AS olat, $2::float8 AS olng, $3::float8"));
		assert!(sql.contains("UNION"));
		assert!(sql.contains("3959"));
	}

	#[test]
	fn filters_follow_the_pipeline_order() {
		let strategy = CandidateStrategy::Country { abbr: "US".to_string() };
		let builder = build_search_query(
			&params(&[
				("loc", "US"),
				("fish", "redfish"),
				("method", "fly"),
				("boatsize", "20"),
				("partysize", "3"),
				("price", "on"),
				("isnew", "True"),
				("child_friendly", "False"),
				("ordering", "boat"),
			]),
			&strategy,
			DistanceUnit::Miles,
			50,
		);
		let sql = builder.sql();
		let fish = sql.find("guide_fish").expect("Missing fish filter.");
		let method = sql.find("guide_methods").expect("Missing method filter.");
		let boat = sql.find("HAVING max(b.length_ft)").expect("Missing boat filter.");
		let party = sql.find("p.min_party <=").expect("Missing party filter.");
		let price = sql.find("g.search_price_cents >=").expect("Missing price filter.");
		let amenity = sql.find("f.child_friendly =").expect("Missing amenity filter.");
		let order = sql.find("ORDER BY max_boat DESC").expect("Missing boat ordering.");

		assert!(fish < method && method < boat && boat < party && party < price);
		assert!(price < amenity && amenity < order);
		assert!(sql.contains("g.is_new ="));
	}
}
