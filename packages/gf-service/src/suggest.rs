use std::collections::HashSet;

use serde::Serialize;

use gf_domain::location_query;

use crate::{GuideService, Result};

const SUGGESTION_LIMIT: i64 = 25;

#[derive(Debug, Clone, Serialize)]
pub struct SuggestResponse {
	pub items: Vec<String>,
}

impl GuideService {
	/// Fish names whose type, name or an alternate name starts with `term`.
	pub async fn suggest_fish(&self, term: &str) -> Result<SuggestResponse> {
		let Some(pattern) = prefix(term) else {
			return Ok(SuggestResponse { items: Vec::new() });
		};
		let names: Vec<String> = sqlx::query_scalar(
			"\
SELECT name
FROM fish
WHERE fish_type ILIKE $1
	OR name ILIKE $1
	OR alt_name_1 ILIKE $1
	OR alt_name_2 ILIKE $1
	OR alt_name_3 ILIKE $1
ORDER BY fish_type, name, alt_name_1
LIMIT $2",
		)
		.bind(pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&self.db.pool)
		.await?;

		Ok(SuggestResponse { items: dedup_in_order(names) })
	}

	/// Cities, then states, then countries, then water bodies.
	pub async fn suggest_locations(&self, term: &str) -> Result<SuggestResponse> {
		let Some(pattern) = prefix(term) else {
			return Ok(SuggestResponse { items: Vec::new() });
		};
		let mut conn = self.db.pool.acquire().await?;
		let cities: Vec<String> = sqlx::query_scalar(
			"\
SELECT concat_ws(', ', l.city, s.key, l.country_abbr)
FROM locations l
LEFT JOIN states s ON s.state_id = l.state_id
WHERE l.city ILIKE $1
ORDER BY l.city, s.key
LIMIT $2",
		)
		.bind(&pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&mut *conn)
		.await?;
		let states: Vec<String> = sqlx::query_scalar(
			"\
SELECT concat_ws(', ', s.name, s.country_abbr)
FROM states s
WHERE (s.key ILIKE $1 OR s.name ILIKE $1)
	AND EXISTS (SELECT 1 FROM locations l WHERE l.state_id = s.state_id)
ORDER BY s.name
LIMIT $2",
		)
		.bind(&pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&mut *conn)
		.await?;
		let countries: Vec<String> = sqlx::query_scalar(
			"\
SELECT c.name
FROM countries c
WHERE (c.name ILIKE $1 OR c.abbr ILIKE $1)
	AND EXISTS (SELECT 1 FROM locations l WHERE l.country_abbr = c.abbr)
ORDER BY c.name
LIMIT $2",
		)
		.bind(&pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&mut *conn)
		.await?;
		let water_bodies: Vec<String> = sqlx::query_scalar(
			"SELECT name FROM water_bodies WHERE name ILIKE $1 ORDER BY name LIMIT $2",
		)
		.bind(&pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&mut *conn)
		.await?;
		let mut items = dedup_in_order(
			cities.into_iter().chain(states).chain(countries).chain(water_bodies),
		);

		items.truncate(SUGGESTION_LIMIT as usize);

		Ok(SuggestResponse { items })
	}

	pub async fn suggest_methods(&self, term: &str) -> Result<SuggestResponse> {
		let Some(pattern) = prefix(term) else {
			return Ok(SuggestResponse { items: Vec::new() });
		};
		let methods: Vec<String> = sqlx::query_scalar(
			"SELECT method FROM fishing_types WHERE method ILIKE $1 ORDER BY method LIMIT $2",
		)
		.bind(pattern)
		.bind(SUGGESTION_LIMIT)
		.fetch_all(&self.db.pool)
		.await?;

		Ok(SuggestResponse { items: methods })
	}
}

fn prefix(term: &str) -> Option<String> {
	let term = term.trim();

	if term.is_empty() {
		return None;
	}

	Some(location_query::prefix_pattern(term))
}

/// Drops repeated suggestions, keeping the first occurrence.
fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
	let mut seen = HashSet::new();

	items.into_iter().filter(|item| seen.insert(item.to_lowercase())).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn duplicates_keep_first_occurrence() {
		let items = dedup_in_order(
			["Venice, LA, US", "Louisiana, US", "venice, la, us", "Lake Pontchartrain"]
				.into_iter()
				.map(String::from),
		);

		assert_eq!(items, vec!["Venice, LA, US", "Louisiana, US", "Lake Pontchartrain"]);
	}

	#[test]
	fn blank_terms_suggest_nothing() {
		assert!(prefix("   ").is_none());
		assert_eq!(prefix(" red").as_deref(), Some("red%"));
	}
}
