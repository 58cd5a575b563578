//! Field-level validation shared by every write path.

use std::fmt;

use regex::Regex;
use time::{OffsetDateTime, Time};

pub const BLURB_MAX_CHARS: usize = 300;
pub const FAQ_EXPLANATION_MAX_CHARS: usize = 1_000;
pub const EXTRA_DETAILS_MAX_CHARS: usize = 700;
pub const REVIEW_COMMENT_MAX_CHARS: usize = 3_000;
pub const PHOTO_TITLE_MAX_CHARS: usize = 30;
pub const PHOTO_SUMMARY_MAX_CHARS: usize = 700;
pub const GALLERY_DESCRIPTION_MAX_CHARS: usize = 500;
pub const CONTACT_NAME_MAX_CHARS: usize = 100;
pub const CONTACT_MESSAGE_MIN_CHARS: usize = 10;
pub const PERSON_NAME_MAX_CHARS: usize = 30;

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 13;

/// A rejected field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
	pub field: String,
	pub message: String,
}
impl RuleViolation {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self { field: field.into(), message: message.into() }
	}
}

impl fmt::Display for RuleViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.field, self.message)
	}
}

impl std::error::Error for RuleViolation {}

pub type RuleResult<T = ()> = Result<T, RuleViolation>;

/// Normalizes a phone number to its digits. Common separators are dropped; anything else is
/// rejected, as is a digit count outside 7..=13.
pub fn phone_digits(field: &str, raw: &str) -> RuleResult<String> {
	let mut digits = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'0'..='9' => digits.push(ch),
			' ' | '-' | '(' | ')' | '.' | '+' => {},
			_ => return Err(RuleViolation::new(field, "Phone numbers may only contain digits.")),
		}
	}

	if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
		return Err(RuleViolation::new(
			field,
			format!("Phone numbers must have {PHONE_MIN_DIGITS} to {PHONE_MAX_DIGITS} digits."),
		));
	}

	Ok(digits)
}

pub fn required_text(field: &str, value: &str, max_chars: usize) -> RuleResult<String> {
	let trimmed = value.trim();

	if trimmed.is_empty() {
		return Err(RuleViolation::new(field, "Must be non-empty."));
	}

	max_text(field, trimmed, max_chars)?;

	Ok(trimmed.to_string())
}

pub fn max_text(field: &str, value: &str, max_chars: usize) -> RuleResult {
	if value.chars().count() > max_chars {
		return Err(RuleViolation::new(field, format!("Must be at most {max_chars} characters.")));
	}

	Ok(())
}

/// A loose `local@domain.tld` shape check.
pub fn email(field: &str, raw: &str) -> RuleResult<String> {
	let trimmed = raw.trim();
	let shape = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
		.map_err(|err| RuleViolation::new(field, err.to_string()))?;

	if !shape.is_match(trimmed) {
		return Err(RuleViolation::new(field, "Enter a valid e-mail address."));
	}

	Ok(trimmed.to_ascii_lowercase())
}

pub fn party(min: i32, max: i32, preferred: i32) -> RuleResult {
	if min < 1 {
		return Err(RuleViolation::new("min_party", "Must be at least 1."));
	}
	if max < min {
		return Err(RuleViolation::new("max_party", "Must be at least min_party."));
	}
	if preferred < min || preferred > max {
		return Err(RuleViolation::new("avg_party", "Must lie between min_party and max_party."));
	}

	Ok(())
}

pub fn experience(years: i32, max_experience: i32) -> RuleResult {
	if !(0..=max_experience).contains(&years) {
		return Err(RuleViolation::new(
			"experience",
			format!("Must be between 0 and {max_experience} years."),
		));
	}

	Ok(())
}

/// A priced time-of-day window of a guide's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentWindow {
	pub start: Time,
	pub end: Time,
	pub amount_cents: i64,
}
impl PaymentWindow {
	pub fn validate(&self) -> RuleResult {
		if self.end <= self.start {
			return Err(RuleViolation::new("end_time", "Must be after start_time."));
		}
		if self.amount_cents < 0 {
			return Err(RuleViolation::new("amount", "Must be zero or greater."));
		}

		Ok(())
	}

	/// Two windows are compatible only when one ends at or before the other starts.
	pub fn overlaps(&self, other: &PaymentWindow) -> bool {
		!(other.end <= self.start || other.start >= self.end)
	}
}

pub fn trip(start: OffsetDateTime, end: OffsetDateTime, num_people: i32) -> RuleResult {
	if end < start {
		return Err(RuleViolation::new("end", "Start date cannot be after the end date."));
	}
	if num_people < 1 {
		return Err(RuleViolation::new("num_people", "At least one guest is required."));
	}

	Ok(())
}

pub fn contact_message(name: &str, email_raw: &str, message: &str) -> RuleResult<(String, String)> {
	let name = required_text("name", name, CONTACT_NAME_MAX_CHARS)?;
	let email = email("email", email_raw)?;

	if message.trim().chars().count() < CONTACT_MESSAGE_MIN_CHARS {
		return Err(RuleViolation::new(
			"message",
			format!("Must be at least {CONTACT_MESSAGE_MIN_CHARS} characters."),
		));
	}

	Ok((name, email))
}

#[cfg(test)]
mod tests {
	use time::macros::{datetime, time};

	use super::*;

	#[test]
	fn phone_digit_bounds() {
		assert_eq!(phone_digits("main_phone", "(504) 555-0199").as_deref(), Ok("5045550199"));
		assert!(phone_digits("main_phone", "555019").is_err());
		assert!(phone_digits("main_phone", "12345678901234").is_err());
		assert!(phone_digits("main_phone", "555-01x9").is_err());
	}

	#[test]
	fn party_preferred_must_lie_within_bounds() {
		assert!(party(1, 10, 4).is_ok());
		assert_eq!(party(5, 4, 4).unwrap_err().field, "max_party");
		assert_eq!(party(1, 4, 6).unwrap_err().field, "avg_party");
	}

	#[test]
	fn payment_windows_may_touch_but_not_overlap() {
		let morning = PaymentWindow { start: time!(9:00), end: time!(12:00), amount_cents: 100 };
		let afternoon = PaymentWindow { start: time!(12:00), end: time!(17:00), amount_cents: 100 };
		let lunch = PaymentWindow { start: time!(11:00), end: time!(13:00), amount_cents: 100 };

		assert!(!morning.overlaps(&afternoon));
		assert!(!afternoon.overlaps(&morning));
		assert!(lunch.overlaps(&morning));
		assert!(lunch.overlaps(&afternoon));
	}

	#[test]
	fn payment_window_must_move_forward() {
		let backwards = PaymentWindow { start: time!(12:00), end: time!(9:00), amount_cents: 0 };
		let negative = PaymentWindow { start: time!(9:00), end: time!(12:00), amount_cents: -1 };

		assert_eq!(backwards.validate().unwrap_err().field, "end_time");
		assert_eq!(negative.validate().unwrap_err().field, "amount");
	}

	#[test]
	fn trip_rules() {
		let start = datetime!(2026-06-01 6:00 UTC);

		assert!(trip(start, start, 1).is_ok());
		assert!(trip(start, datetime!(2026-05-31 6:00 UTC), 2).is_err());
		assert!(trip(start, start, 0).is_err());
	}

	#[test]
	fn contact_message_rules() {
		assert!(contact_message("Ann", "ann@example.com", "Need a guide in June").is_ok());
		assert_eq!(contact_message("", "ann@example.com", "long enough!").unwrap_err().field, "name");
		assert_eq!(contact_message("Ann", "not-an-email", "long enough!").unwrap_err().field, "email");
		assert_eq!(contact_message("Ann", "a@b.co", "short").unwrap_err().field, "message");
	}
}
