use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Customer, Gallery, Guide, Party, Trip},
};

pub const GUIDE_COLUMNS: &str = "\
guide_id, customer_id, company, experience, blurb, profile, is_new, full_day_price_cents, \
search_price_cents, num_recommends, num_referrals, home_location_id, created_at";
pub const TRIP_COLUMNS: &str = "\
trip_id, customer_id, guide_id, location_id, starts_at, ends_at, num_people, price_cents, \
is_paid, is_reviewed, reference, created_at";

pub async fn get_customer(executor: &mut PgConnection, customer_id: Uuid) -> Result<Customer> {
	sqlx::query_as::<_, Customer>(
		"\
SELECT customer_id, first_name, middle_name, last_name, email, is_guide, created_at
FROM customers
WHERE customer_id = $1",
	)
	.bind(customer_id)
	.fetch_optional(&mut *executor)
	.await?
	.ok_or_else(|| Error::missing("customer", customer_id))
}

pub async fn get_guide(executor: &mut PgConnection, guide_id: Uuid) -> Result<Guide> {
	let sql = format!("SELECT {GUIDE_COLUMNS} FROM guides WHERE guide_id = $1");

	sqlx::query_as::<_, Guide>(&sql)
		.bind(guide_id)
		.fetch_optional(&mut *executor)
		.await?
		.ok_or_else(|| Error::missing("guide", guide_id))
}

pub async fn find_guide_by_customer(
	executor: &mut PgConnection,
	customer_id: Uuid,
) -> Result<Option<Guide>> {
	let sql = format!("SELECT {GUIDE_COLUMNS} FROM guides WHERE customer_id = $1");
	let row = sqlx::query_as::<_, Guide>(&sql)
		.bind(customer_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn get_party(executor: &mut PgConnection, guide_id: Uuid) -> Result<Party> {
	sqlx::query_as::<_, Party>(
		"SELECT guide_id, min_party, max_party, avg_party FROM guide_party WHERE guide_id = $1",
	)
	.bind(guide_id)
	.fetch_optional(&mut *executor)
	.await?
	.ok_or_else(|| Error::missing("party model of guide", guide_id))
}

pub async fn get_gallery(executor: &mut PgConnection, gallery_id: Uuid) -> Result<Gallery> {
	sqlx::query_as::<_, Gallery>(
		"\
SELECT gallery_id, customer_id, description, created_on, num_photos, max_photos, cover_photo_id
FROM galleries
WHERE gallery_id = $1",
	)
	.bind(gallery_id)
	.fetch_optional(&mut *executor)
	.await?
	.ok_or_else(|| Error::missing("gallery", gallery_id))
}

pub async fn list_galleries(executor: &mut PgConnection, customer_id: Uuid) -> Result<Vec<Gallery>> {
	let rows = sqlx::query_as::<_, Gallery>(
		"\
SELECT gallery_id, customer_id, description, created_on, num_photos, max_photos, cover_photo_id
FROM galleries
WHERE customer_id = $1
ORDER BY created_on, gallery_id",
	)
	.bind(customer_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn get_trip(executor: &mut PgConnection, trip_id: Uuid) -> Result<Trip> {
	let sql = format!("SELECT {TRIP_COLUMNS} FROM trips WHERE trip_id = $1");

	sqlx::query_as::<_, Trip>(&sql)
		.bind(trip_id)
		.fetch_optional(&mut *executor)
		.await?
		.ok_or_else(|| Error::missing("trip", trip_id))
}
