//! Free-text location parsing and the search strategy a resolved place implies.

use serde::Serialize;

/// A comma-separated location string, trimmed, with terms beyond the third ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
	/// `place`
	One(String),
	/// `place, region`
	Two(String, String),
	/// `place, state, country`
	Three(String, String, String),
}
impl LocationQuery {
	pub fn parse(raw: &str) -> Option<Self> {
		let terms: Vec<String> = raw.split(',').map(|term| term.trim().to_string()).collect();

		match terms.as_slice() {
			[] => None,
			[one] if one.is_empty() => None,
			[one] => Some(Self::One(one.clone())),
			[first, second] => Some(Self::Two(first.clone(), second.clone())),
			[first, second, third, ..] =>
				Some(Self::Three(first.clone(), second.clone(), third.clone())),
		}
	}

	pub fn first(&self) -> &str {
		match self {
			Self::One(first) | Self::Two(first, _) | Self::Three(first, _, _) => first,
		}
	}
}

/// What kind of record a location string resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
	City,
	State,
	Country,
	WaterBody,
}
impl PlaceKind {
	/// Maps geocoder result types onto a kind. Water results are always water bodies.
	pub fn from_geocoder_types(types: &[String], water: bool) -> Self {
		if water {
			return Self::WaterBody;
		}
		if types.iter().any(|kind| kind == "country") {
			return Self::Country;
		}
		if types.iter().any(|kind| kind == "administrative_area_level_1") {
			return Self::State;
		}

		Self::City
	}
}

/// How the candidate guide set is collected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CandidateStrategy {
	/// Guides operating at any location in the country.
	Country { abbr: String },
	/// Guides operating at any location in the state.
	State { key: String },
	/// Guides linked to locations or water bodies within `radius` of the point.
	Radius { lat: f64, lng: f64, radius: u32 },
}

/// Strip SQL `LIKE` metacharacters so user text only ever matches literally.
pub fn escape_like(term: &str) -> String {
	let mut out = String::with_capacity(term.len());

	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

pub fn contains_pattern(term: &str) -> String {
	format!("%{}%", escape_like(term))
}

pub fn prefix_pattern(term: &str) -> String {
	format!("{}%", escape_like(term))
}
