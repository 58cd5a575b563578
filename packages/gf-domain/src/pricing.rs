use serde::Serialize;

/// Guide prices derived from its payment windows, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
	pub full_day_cents: i64,
	pub search_cents: i64,
}
impl PriceSummary {
	/// Full-day price is the sum of the window amounts. The search price is the average
	/// times the count halved, which is half the sum, rounded half up to the cent.
	pub fn from_amounts(amounts: &[i64]) -> Self {
		let sum: i64 = amounts.iter().sum();

		Self { full_day_cents: sum, search_cents: (sum + 1).div_euclid(2) }
	}
}

/// Parses a decimal money amount (`"125"`, `"125.5"`, `"125.50"`) into cents.
pub fn parse_cents(raw: &str) -> Option<i64> {
	let raw = raw.trim();
	let (whole, frac) = match raw.split_once('.') {
		Some((whole, frac)) => (whole, frac),
		None => (raw, ""),
	};

	if whole.is_empty() && frac.is_empty() {
		return None;
	}
	if !whole.chars().all(|ch| ch.is_ascii_digit()) || !frac.chars().all(|ch| ch.is_ascii_digit())
	{
		return None;
	}
	if frac.len() > 2 {
		return None;
	}

	let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
	let frac: i64 = match frac.len() {
		0 => 0,
		1 => frac.parse::<i64>().ok()? * 10,
		_ => frac.parse().ok()?,
	};

	whole.checked_mul(100)?.checked_add(frac)
}

pub fn format_cents(cents: i64) -> String {
	let sign = if cents < 0 { "-" } else { "" };
	let abs = cents.unsigned_abs();

	format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_windows_price_at_zero() {
		assert_eq!(PriceSummary::from_amounts(&[]), PriceSummary::default());
	}

	#[test]
	fn search_price_is_half_the_sum() {
		let summary = PriceSummary::from_amounts(&[30_000, 45_001]);

		assert_eq!(summary.full_day_cents, 75_001);
		assert_eq!(summary.search_cents, 37_501);
	}

	#[test]
	fn parses_decimal_amounts() {
		assert_eq!(parse_cents("125"), Some(12_500));
		assert_eq!(parse_cents("125.5"), Some(12_550));
		assert_eq!(parse_cents("99999999.99"), Some(9_999_999_999));
		assert_eq!(parse_cents(".75"), Some(75));
		assert_eq!(parse_cents("1.234"), None);
		assert_eq!(parse_cents("-3"), None);
		assert_eq!(parse_cents("abc"), None);
		assert_eq!(format_cents(12_550), "125.50");
	}
}
