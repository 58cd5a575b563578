use serde::Deserialize;
use sqlx::PgConnection;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use gf_domain::{pricing, rules};
use gf_storage::{
	geography as store,
	models::Trip,
	queries::{self, TRIP_COLUMNS},
};

use crate::{Error, GuideService, Result};

const REFERENCE_HEX_CHARS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct TripRequest {
	pub customer_id: Uuid,
	pub guide_id: Uuid,
	pub location_id: Uuid,
	#[serde(with = "time::serde::rfc3339")]
	pub starts_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub ends_at: OffsetDateTime,
	pub num_people: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripPriceRequest {
	pub amount: String,
}

impl GuideService {
	/// Books a trip and refreshes the customer's trip count and last trip (the one that ends
	/// latest).
	pub async fn book_trip(&self, req: TripRequest) -> Result<Trip> {
		rules::trip(req.starts_at, req.ends_at, req.num_people)?;

		let mut tx = self.db.pool.begin().await?;

		queries::get_customer(&mut tx, req.customer_id).await?;
		queries::get_guide(&mut tx, req.guide_id).await?;
		store::get_location(&mut tx, req.location_id).await?;

		let reference = trip_reference(&req);
		let sql = format!(
			"\
INSERT INTO trips (trip_id, customer_id, guide_id, location_id, starts_at, ends_at, num_people, reference)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
RETURNING {TRIP_COLUMNS}"
		);
		let trip = sqlx::query_as::<_, Trip>(&sql)
			.bind(Uuid::new_v4())
			.bind(req.customer_id)
			.bind(req.guide_id)
			.bind(req.location_id)
			.bind(req.starts_at)
			.bind(req.ends_at)
			.bind(req.num_people)
			.bind(reference.as_str())
			.fetch_one(&mut *tx)
			.await
			.map_err(|err| {
				if gf_storage::is_unique_violation(&err) {
					Error::conflict("This trip is already booked.")
				} else {
					err.into()
				}
			})?;

		refresh_trip_profile(&mut tx, req.customer_id).await?;
		tx.commit().await?;

		tracing::info!(
			trip_id = %trip.trip_id,
			guide_id = %trip.guide_id,
			reference = %trip.reference,
			"Booked trip."
		);

		Ok(trip)
	}

	pub async fn trip(&self, trip_id: Uuid) -> Result<Trip> {
		let mut conn = self.db.pool.acquire().await?;

		Ok(queries::get_trip(&mut conn, trip_id).await?)
	}

	pub async fn trip_by_reference(&self, reference: &str) -> Result<Trip> {
		let sql = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE reference = $1");

		sqlx::query_as::<_, Trip>(&sql)
			.bind(reference.trim())
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("trip {reference}")))
	}

	pub async fn set_trip_price(&self, trip_id: Uuid, req: TripPriceRequest) -> Result<Trip> {
		let price_cents = pricing::parse_cents(&req.amount)
			.ok_or_else(|| rules::RuleViolation::new("amount", "Enter an amount such as 150.00."))?;
		let sql =
			format!("UPDATE trips SET price_cents = $2 WHERE trip_id = $1 RETURNING {TRIP_COLUMNS}");

		sqlx::query_as::<_, Trip>(&sql)
			.bind(trip_id)
			.bind(price_cents)
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("trip {trip_id}")))
	}

	pub async fn confirm_payment(&self, trip_id: Uuid) -> Result<Trip> {
		let sql = format!("UPDATE trips SET is_paid = true WHERE trip_id = $1 RETURNING {TRIP_COLUMNS}");

		sqlx::query_as::<_, Trip>(&sql)
			.bind(trip_id)
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("trip {trip_id}")))
	}
}

async fn refresh_trip_profile(conn: &mut PgConnection, customer_id: Uuid) -> Result<()> {
	sqlx::query(
		"\
UPDATE customer_profiles p
SET num_trips = (SELECT count(*) FROM trips t WHERE t.customer_id = p.customer_id),
	last_trip_id = (
		SELECT t.trip_id
		FROM trips t
		WHERE t.customer_id = p.customer_id
		ORDER BY t.ends_at DESC, t.created_at DESC
		LIMIT 1
	)
WHERE p.customer_id = $1",
	)
	.bind(customer_id)
	.execute(&mut *conn)
	.await?;

	Ok(())
}

/// Booking reference derived from who, when and where. The same booking always yields the
/// same reference.
pub fn trip_reference(req: &TripRequest) -> String {
	let mut hasher = blake3::Hasher::new();

	for part in [req.customer_id.to_string(), req.guide_id.to_string(), req.location_id.to_string()] {
		hasher.update(part.as_bytes());
		hasher.update(b"|");
	}
	for instant in [req.starts_at, req.ends_at] {
		let formatted = instant.format(&Rfc3339).unwrap_or_else(|_| instant.unix_timestamp().to_string());

		hasher.update(formatted.as_bytes());
		hasher.update(b"|");
	}

	let mut hex = hasher.finalize().to_hex().to_string();

	hex.truncate(REFERENCE_HEX_CHARS);

	hex
}
