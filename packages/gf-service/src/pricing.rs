use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use time::{Time, macros::format_description};
use uuid::Uuid;

use gf_domain::{
	pricing::{self, PriceSummary},
	rules::{self, PaymentWindow},
};
use gf_storage::{models::Payment, queries};

use crate::{Error, GuideService, Result};

const DEFAULT_START: Time = time::macros::time!(9:00);
const DEFAULT_END: Time = time::macros::time!(17:00);

/// A priced window of the guide's day. Times are `HH:MM`; the amount is a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
	#[serde(default)]
	pub start_time: Option<String>,
	#[serde(default)]
	pub end_time: Option<String>,
	pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceView {
	pub guide_id: Uuid,
	pub full_day_price_cents: i64,
	pub search_price_cents: i64,
	pub full_day_price: String,
	pub search_price: String,
	pub payments: Vec<Payment>,
}

impl GuideService {
	/// Adds a payment window. Windows of one guide may touch but never overlap.
	pub async fn add_payment(&self, guide_id: Uuid, req: PaymentRequest) -> Result<PriceView> {
		let window = parse_window(&req)?;
		let mut tx = self.db.pool.begin().await?;

		lock_guide(&mut tx, guide_id).await?;

		let existing = list_payments(&mut tx, guide_id).await?;

		if let Some(clash) = existing.iter().find(|payment| window.overlaps(&as_window(payment))) {
			return Err(Error::conflict(format!(
				"An amount is already defined for {} to {}.",
				clash.start_time, clash.end_time
			)));
		}

		sqlx::query(
			"\
INSERT INTO guide_payments (payment_id, guide_id, start_time, end_time, amount_cents)
VALUES ($1, $2, $3, $4, $5)",
		)
		.bind(Uuid::new_v4())
		.bind(guide_id)
		.bind(window.start)
		.bind(window.end)
		.bind(window.amount_cents)
		.execute(&mut *tx)
		.await?;

		let view = recompute_prices(&mut tx, guide_id).await?;

		tx.commit().await?;

		Ok(view)
	}

	pub async fn remove_payment(&self, guide_id: Uuid, payment_id: Uuid) -> Result<PriceView> {
		let mut tx = self.db.pool.begin().await?;

		lock_guide(&mut tx, guide_id).await?;

		let removed = sqlx::query("DELETE FROM guide_payments WHERE payment_id = $1 AND guide_id = $2")
			.bind(payment_id)
			.bind(guide_id)
			.execute(&mut *tx)
			.await?;

		if removed.rows_affected() == 0 {
			return Err(Error::not_found(format!("payment {payment_id} of guide {guide_id}")));
		}

		let view = recompute_prices(&mut tx, guide_id).await?;

		tx.commit().await?;

		Ok(view)
	}

	pub async fn prices(&self, guide_id: Uuid) -> Result<PriceView> {
		let mut conn = self.db.pool.acquire().await?;
		let guide = queries::get_guide(&mut conn, guide_id).await?;
		let payments = list_payments(&mut conn, guide_id).await?;

		Ok(price_view(guide_id, guide.full_day_price_cents, guide.search_price_cents, payments))
	}
}

pub(crate) async fn list_payments(conn: &mut PgConnection, guide_id: Uuid) -> Result<Vec<Payment>> {
	let rows = sqlx::query_as::<_, Payment>(
		"\
SELECT payment_id, guide_id, start_time, end_time, amount_cents
FROM guide_payments
WHERE guide_id = $1
ORDER BY start_time, end_time",
	)
	.bind(guide_id)
	.fetch_all(&mut *conn)
	.await?;

	Ok(rows)
}

async fn lock_guide(conn: &mut PgConnection, guide_id: Uuid) -> Result<()> {
	let locked: Option<Uuid> =
		sqlx::query_scalar("SELECT guide_id FROM guides WHERE guide_id = $1 FOR UPDATE")
			.bind(guide_id)
			.fetch_optional(&mut *conn)
			.await?;

	locked.map(|_| ()).ok_or_else(|| Error::not_found(format!("guide {guide_id}")))
}

/// Derives both prices from the windows and stores them on the guide.
async fn recompute_prices(conn: &mut PgConnection, guide_id: Uuid) -> Result<PriceView> {
	let payments = list_payments(conn, guide_id).await?;
	let amounts: Vec<i64> = payments.iter().map(|payment| payment.amount_cents).collect();
	let summary = PriceSummary::from_amounts(&amounts);

	sqlx::query(
		"UPDATE guides SET full_day_price_cents = $2, search_price_cents = $3 WHERE guide_id = $1",
	)
	.bind(guide_id)
	.bind(summary.full_day_cents)
	.bind(summary.search_cents)
	.execute(&mut *conn)
	.await?;

	tracing::debug!(
		guide_id = %guide_id,
		windows = payments.len(),
		full_day_cents = summary.full_day_cents,
		"Recomputed guide prices."
	);

	Ok(price_view(guide_id, summary.full_day_cents, summary.search_cents, payments))
}

fn price_view(guide_id: Uuid, full_day: i64, search: i64, payments: Vec<Payment>) -> PriceView {
	PriceView {
		guide_id,
		full_day_price_cents: full_day,
		search_price_cents: search,
		full_day_price: pricing::format_cents(full_day),
		search_price: pricing::format_cents(search),
		payments,
	}
}

fn as_window(payment: &Payment) -> PaymentWindow {
	PaymentWindow {
		start: payment.start_time,
		end: payment.end_time,
		amount_cents: payment.amount_cents,
	}
}

fn parse_window(req: &PaymentRequest) -> Result<PaymentWindow> {
	let start = parse_time("start_time", req.start_time.as_deref())?.unwrap_or(DEFAULT_START);
	let end = parse_time("end_time", req.end_time.as_deref())?.unwrap_or(DEFAULT_END);
	let amount_cents = pricing::parse_cents(&req.amount)
		.ok_or_else(|| rules::RuleViolation::new("amount", "Enter an amount such as 150.00."))?;
	let window = PaymentWindow { start, end, amount_cents };

	window.validate()?;

	Ok(window)
}

fn parse_time(field: &str, raw: Option<&str>) -> Result<Option<Time>> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return Ok(None);
	};
	let time = Time::parse(raw, format_description!("[hour]:[minute]"))
		.map_err(|_| rules::RuleViolation::new(field, "Expected a time of day as HH:MM."))?;

	Ok(Some(time))
}

#[cfg(test)]
mod tests {
	use time::macros::time;

	use super::*;

	fn request(start: Option<&str>, end: Option<&str>, amount: &str) -> PaymentRequest {
		PaymentRequest {
			start_time: start.map(str::to_string),
			end_time: end.map(str::to_string),
			amount: amount.to_string(),
		}
	}

	#[test]
	fn missing_times_default_to_the_working_day() {
		let window = parse_window(&request(None, None, "250")).expect("Window must parse.");

		assert_eq!(window.start, time!(9:00));
		assert_eq!(window.end, time!(17:00));
		assert_eq!(window.amount_cents, 25_000);
	}

	#[test]
	fn backwards_window_is_rejected() {
		let err = parse_window(&request(Some("13:00"), Some("08:30"), "100"))
			.expect_err("Expected window error.");

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "end_time"));
	}

	#[test]
	fn malformed_inputs_name_their_field() {
		let err = parse_window(&request(Some("noon"), None, "100")).expect_err("Expected time error.");

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "start_time"));

		let err = parse_window(&request(None, None, "-5")).expect_err("Expected amount error.");

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "amount"));
	}
}
