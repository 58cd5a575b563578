//! Parsing of the guide-search query string.

use std::{collections::HashMap, fmt};

use regex::Regex;
use serde::Serialize;
use time::{Date, macros::format_description};

use crate::{
	catalog::{WaterType, faq_column},
	ordering::SortOrder,
	pricing::parse_cents,
};

/// Upper bound applied when `maxprice` is omitted (99999999.99).
pub const DEFAULT_MAX_PRICE_CENTS: i64 = 9_999_999_999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamError {
	pub param: String,
	pub message: String,
}
impl ParamError {
	fn new(param: &str, message: impl Into<String>) -> Self {
		Self { param: param.to_string(), message: message.into() }
	}
}

impl fmt::Display for ParamError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.param, self.message)
	}
}

impl std::error::Error for ParamError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceRange {
	pub min_cents: i64,
	pub max_cents: i64,
}

/// A required boolean column value on the guide or its FAQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmenityFilter {
	pub column: &'static str,
	pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
	pub location: String,
	pub date: Date,
	pub radius: u32,
	pub fish: Option<String>,
	pub water_type: Option<WaterType>,
	pub method: Option<String>,
	pub boat_size: Option<i32>,
	pub party_size: Option<i32>,
	pub price: Option<PriceRange>,
	pub is_new: Option<bool>,
	pub amenities: Vec<AmenityFilter>,
	pub ordering: SortOrder,
}
impl SearchParams {
	/// Parses the raw query map. `Ok(None)` means the location is blank and the search yields
	/// nothing.
	pub fn parse(
		query: &HashMap<String, String>,
		default_radius: u32,
		today: Date,
	) -> Result<Option<Self>, ParamError> {
		let Some(location) = location(query.get("loc").map(String::as_str)) else {
			return Ok(None);
		};
		let date = match non_empty(query, "date") {
			Some(raw) => parse_date(raw)?.unwrap_or(tomorrow(today)),
			None => tomorrow(today),
		};
		let radius = match non_empty(query, "radius") {
			Some(raw) => positive_int("radius", raw)?.unwrap_or(default_radius as i32) as u32,
			None => default_radius,
		};
		let water_type = non_empty(query, "watertype")
			.map(|raw| {
				WaterType::parse(raw).ok_or_else(|| ParamError::new("watertype", "Expected FW or SW."))
			})
			.transpose()?;
		let boat_size = non_empty(query, "boatsize")
			.map(|raw| positive_int("boatsize", raw))
			.transpose()?
			.flatten();
		let party_size = non_empty(query, "partysize")
			.map(|raw| positive_int("partysize", raw))
			.transpose()?
			.flatten();
		let price = match non_empty(query, "price") {
			Some(_) => Some(PriceRange {
				min_cents: money(query, "minprice")?.unwrap_or(0),
				max_cents: money(query, "maxprice")?.unwrap_or(DEFAULT_MAX_PRICE_CENTS),
			}),
			None => None,
		};
		let ordering = match query.get("ordering") {
			Some(raw) => SortOrder::parse(raw)
				.ok_or_else(|| ParamError::new("ordering", format!("Unknown ordering {raw:?}.")))?,
			None => SortOrder::default(),
		};
		let mut amenities = Vec::new();
		let mut keys: Vec<&String> = query.keys().collect();

		keys.sort();

		for key in keys {
			if let (Some(column), Some(raw)) = (faq_column(key), non_empty(query, key)) {
				amenities.push(AmenityFilter { column, value: flag(raw) });
			}
		}

		Ok(Some(Self {
			location,
			date,
			radius,
			fish: non_empty(query, "fish").map(str::to_string),
			water_type,
			method: non_empty(query, "method").map(str::to_string),
			boat_size,
			party_size,
			price,
			is_new: non_empty(query, "isnew").map(flag),
			amenities,
			ordering,
		}))
	}
}

/// A location that begins with a space is the form's placeholder and counts as blank.
fn location(raw: Option<&str>) -> Option<String> {
	let raw = raw?;

	if raw.starts_with(' ') || raw.trim().is_empty() {
		return None;
	}

	Some(raw.trim().to_string())
}

fn non_empty<'a>(query: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
	query.get(key).map(|value| value.trim()).filter(|value| !value.is_empty())
}

/// `False` is the only false spelling; every other value turns a flag on.
fn flag(raw: &str) -> bool {
	raw != "False"
}

/// `0` disables the filter. Negative and non-numeric input is rejected.
fn positive_int(param: &str, raw: &str) -> Result<Option<i32>, ParamError> {
	let value: i32 =
		raw.parse().map_err(|_| ParamError::new(param, format!("Expected an integer, got {raw:?}.")))?;

	if value < 0 {
		return Err(ParamError::new(param, "Must not be negative."));
	}

	Ok((value > 0).then_some(value))
}

fn money(query: &HashMap<String, String>, param: &str) -> Result<Option<i64>, ParamError> {
	non_empty(query, param)
		.map(|raw| {
			parse_cents(raw)
				.ok_or_else(|| ParamError::new(param, format!("Expected a price, got {raw:?}.")))
		})
		.transpose()
}

/// Dates are `MM/DD/YYYY`. Text that is not made of digits and slashes is ignored.
fn parse_date(raw: &str) -> Result<Option<Date>, ParamError> {
	let shape = Regex::new(r"^[\d/]+$").map_err(|err| ParamError::new("date", err.to_string()))?;

	if !shape.is_match(raw) {
		return Ok(None);
	}

	let format = format_description!("[month padding:none]/[day padding:none]/[year]");

	Date::parse(raw, format)
		.map(Some)
		.map_err(|_| ParamError::new("date", format!("Expected MM/DD/YYYY, got {raw:?}.")))
}

fn tomorrow(today: Date) -> Date {
	today.next_day().unwrap_or(today)
}

#[cfg(test)]
mod tests {
	use time::macros::date;

	use super::*;

	const TODAY: Date = date!(2026 - 10 - 18);

	fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	fn parse(pairs: &[(&str, &str)]) -> Result<Option<SearchParams>, ParamError> {
		SearchParams::parse(&query(pairs), 100, TODAY)
	}

	#[test]
	fn blank_and_placeholder_locations_yield_nothing() {
		assert_eq!(parse(&[]), Ok(None));
		assert_eq!(parse(&[("loc", "   ")]), Ok(None));
		assert_eq!(parse(&[("loc", " City, State")]), Ok(None));
	}

	#[test]
	fn defaults_apply() {
		let params = parse(&[("loc", "Venice, LA")]).unwrap().unwrap();

		assert_eq!(params.date, date!(2026 - 10 - 19));
		assert_eq!(params.radius, 100);
		assert_eq!(params.ordering, SortOrder::Price);
		assert!(params.price.is_none());
		assert!(params.amenities.is_empty());
	}

	#[test]
	fn non_numeric_dates_are_ignored() {
		let params = parse(&[("loc", "Venice"), ("date", "mm/dd/yyyy")]).unwrap().unwrap();

		assert_eq!(params.date, date!(2026 - 10 - 19));

		let params = parse(&[("loc", "Venice"), ("date", "6/7/2027")]).unwrap().unwrap();

		assert_eq!(params.date, date!(2027 - 06 - 07));
		assert!(parse(&[("loc", "Venice"), ("date", "13/45/2027")]).is_err());
	}

	#[test]
	fn price_bounds_only_with_price_flag() {
		let params = parse(&[("loc", "Venice"), ("minprice", "10")]).unwrap().unwrap();

		assert!(params.price.is_none());

		let params =
			parse(&[("loc", "Venice"), ("price", "on"), ("minprice", "10.5")]).unwrap().unwrap();

		assert_eq!(
			params.price,
			Some(PriceRange { min_cents: 1_050, max_cents: DEFAULT_MAX_PRICE_CENTS })
		);
	}

	#[test]
	fn flags_and_capacity() {
		let params = parse(&[
			("loc", "Venice"),
			("isnew", "False"),
			("CG_certified", "on"),
			("child_friendly", "False"),
			("boatsize", "0"),
			("partysize", "4"),
		])
		.unwrap()
		.unwrap();

		assert_eq!(params.is_new, Some(false));
		assert_eq!(
			params.amenities,
			vec![
				AmenityFilter { column: "cg_certified", value: true },
				AmenityFilter { column: "child_friendly", value: false },
			]
		);
		assert_eq!(params.boat_size, None);
		assert_eq!(params.party_size, Some(4));
	}

	#[test]
	fn bad_numbers_are_rejected() {
		assert_eq!(parse(&[("loc", "Venice"), ("boatsize", "big")]).unwrap_err().param, "boatsize");
		assert_eq!(parse(&[("loc", "Venice"), ("radius", "-5")]).unwrap_err().param, "radius");
		assert_eq!(
			parse(&[("loc", "Venice"), ("price", "1"), ("maxprice", "lots")]).unwrap_err().param,
			"maxprice"
		);
		assert_eq!(parse(&[("loc", "Venice"), ("ordering", "random")]).unwrap_err().param, "ordering");
	}
}
