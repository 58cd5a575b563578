use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gf_domain::{geo::GeoPoint, naming, rules};
use gf_storage::{
	geography as store,
	models::{Contact, Customer, CustomerProfile, Gallery, Trip},
	queries,
};

use crate::{
	Error, GuideService, Result,
	geography::{find_country, join_address},
	trimmed,
};

const CONTACT_COLUMNS: &str = "\
customer_id, address_line_1, address_line_2, city, state_id, country_abbr, postal_code, website, \
main_phone, alternate_phone, location_id, lat, lng, updated_at";
const ADDRESS_LINE_MAX_CHARS: usize = 150;
const CITY_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
	pub first_name: String,
	#[serde(default)]
	pub middle_name: Option<String>,
	pub last_name: String,
	pub email: String,
	#[serde(default)]
	pub allow_text: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
	pub customer: Customer,
	pub full_name: String,
	pub gallery: Gallery,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
	#[serde(default)]
	pub address_line_1: Option<String>,
	#[serde(default)]
	pub address_line_2: Option<String>,
	#[serde(default)]
	pub city: Option<String>,
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub country: Option<String>,
	#[serde(default)]
	pub postal_code: Option<String>,
	#[serde(default)]
	pub website: Option<String>,
	#[serde(default)]
	pub main_phone: Option<String>,
	#[serde(default)]
	pub alternate_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRequest {
	pub customer_id: Uuid,
	pub guide_id: Uuid,
}

/// Everything the customer profile page shows.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
	pub customer: Customer,
	pub full_name: String,
	pub slug: String,
	pub contact: Contact,
	pub profile: CustomerProfile,
	pub last_trip: Option<Trip>,
	pub favorites: Vec<Uuid>,
	pub galleries: Vec<Gallery>,
	pub guide_id: Option<Uuid>,
}

/// Contact fields after validation, before the address is placed on the map.
#[derive(Debug)]
struct CheckedContact {
	city: String,
	main_phone: Option<String>,
	alternate_phone: Option<String>,
}

impl GuideService {
	/// Creates the customer with contact info, profile and an empty gallery in one transaction.
	pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse> {
		let first_name =
			rules::required_text("first_name", &req.first_name, rules::PERSON_NAME_MAX_CHARS)?;
		let last_name =
			rules::required_text("last_name", &req.last_name, rules::PERSON_NAME_MAX_CHARS)?;
		let middle_name = trimmed(req.middle_name.as_deref());

		if let Some(middle) = middle_name.as_deref() {
			rules::max_text("middle_name", middle, rules::PERSON_NAME_MAX_CHARS)?;
		}

		let email = rules::email("email", &req.email)?;
		let customer_id = Uuid::new_v4();
		let mut tx = self.db.pool.begin().await?;
		let customer = sqlx::query_as::<_, Customer>(
			"\
INSERT INTO customers (customer_id, first_name, middle_name, last_name, email)
VALUES ($1, $2, $3, $4, $5)
RETURNING customer_id, first_name, middle_name, last_name, email, is_guide, created_at",
		)
		.bind(customer_id)
		.bind(first_name.as_str())
		.bind(middle_name.as_deref())
		.bind(last_name.as_str())
		.bind(email.as_str())
		.fetch_one(&mut *tx)
		.await
		.map_err(|err| {
			if gf_storage::is_unique_violation(&err) {
				Error::conflict(format!("E-mail {email} is already registered."))
			} else {
				err.into()
			}
		})?;

		sqlx::query("INSERT INTO contacts (customer_id) VALUES ($1)")
			.bind(customer_id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("INSERT INTO customer_profiles (customer_id, allow_text) VALUES ($1, $2)")
			.bind(customer_id)
			.bind(req.allow_text)
			.execute(&mut *tx)
			.await?;

		let gallery = sqlx::query_as::<_, Gallery>(
			"\
INSERT INTO galleries (gallery_id, customer_id, max_photos)
VALUES ($1, $2, $3)
RETURNING gallery_id, customer_id, description, created_on, num_photos, max_photos, cover_photo_id",
		)
		.bind(Uuid::new_v4())
		.bind(customer_id)
		.bind(self.cfg.gallery.customer_max_photos)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		tracing::info!(customer_id = %customer_id, "Registered customer.");

		let full_name =
			naming::full_name(&customer.first_name, customer.middle_name.as_deref(), &customer.last_name);

		Ok(RegisterResponse { customer, full_name, gallery })
	}

	pub async fn customer_view(&self, customer_id: Uuid) -> Result<CustomerView> {
		let mut conn = self.db.pool.acquire().await?;
		let customer = queries::get_customer(&mut conn, customer_id).await?;
		let contact = load_contact(&mut conn, customer_id).await?;
		let profile = sqlx::query_as::<_, CustomerProfile>(
			"\
SELECT customer_id, allow_text, num_trips, last_trip_id, joined_on
FROM customer_profiles
WHERE customer_id = $1",
		)
		.bind(customer_id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| Error::not_found(format!("profile of customer {customer_id}")))?;
		let last_trip = match profile.last_trip_id {
			Some(trip_id) => Some(queries::get_trip(&mut conn, trip_id).await?),
			None => None,
		};
		let favorites: Vec<Uuid> = sqlx::query_scalar(
			"SELECT guide_id FROM favorite_guides WHERE customer_id = $1 ORDER BY guide_id",
		)
		.bind(customer_id)
		.fetch_all(&mut *conn)
		.await?;
		let galleries = queries::list_galleries(&mut conn, customer_id).await?;
		let guide_id =
			queries::find_guide_by_customer(&mut conn, customer_id).await?.map(|guide| guide.guide_id);
		let full_name =
			naming::full_name(&customer.first_name, customer.middle_name.as_deref(), &customer.last_name);
		let slug = naming::slugify(&full_name);

		Ok(CustomerView {
			customer,
			full_name,
			slug,
			contact,
			profile,
			last_trip,
			favorites,
			galleries,
			guide_id,
		})
	}

	/// Validates and stores contact details. The city is resolved to a cached location, and the
	/// contact point is the most precise of: the full address, the address without line 1, the
	/// city.
	pub async fn update_contact(&self, customer_id: Uuid, req: ContactUpdate) -> Result<Contact> {
		let checked = check_contact(&req)?;
		let mut conn = self.db.pool.acquire().await?;

		queries::get_customer(&mut conn, customer_id).await?;

		let country_raw = trimmed(req.country.as_deref())
			.ok_or_else(|| rules::RuleViolation::new("country", "Please enter a location."))?;
		let country = find_country(&mut conn, &country_raw)
			.await?
			.ok_or_else(|| rules::RuleViolation::new("country", "Unknown country."))?;
		let state = match trimmed(req.state.as_deref()) {
			Some(raw) => Some(store::find_state(&mut conn, &country.abbr, &raw).await?.ok_or_else(
				|| rules::RuleViolation::new("state", "The entered state is not in the country indicated."),
			)?),
			None => None,
		};

		drop(conn);

		let location = self.location_for_city(&checked.city, state.as_ref(), &country).await?;
		let line_1 = trimmed(req.address_line_1.as_deref());
		let line_2 = trimmed(req.address_line_2.as_deref());
		let state_name = state.as_ref().map(|state| state.name.as_str());
		let mut point = None;

		for address in [
			join_address(&[
				line_1.as_deref(),
				line_2.as_deref(),
				Some(checked.city.as_str()),
				state_name,
				Some(country.abbr.as_str()),
			]),
			join_address(&[
				line_2.as_deref(),
				Some(checked.city.as_str()),
				state_name,
				Some(country.abbr.as_str()),
			]),
		] {
			match self.geocode_match(&address, false).await {
				Ok(Some(found)) => {
					point = Some(found.point());

					break;
				},
				Ok(None) => {},
				Err(err) => {
					tracing::warn!(error = %err, customer_id = %customer_id, "Address geocoding failed.");
				},
			}
		}

		let point = point.unwrap_or(GeoPoint::new(location.lat, location.lng));
		let sql = format!(
			"\
UPDATE contacts
SET address_line_1 = $2,
	address_line_2 = $3,
	city = $4,
	state_id = $5,
	country_abbr = $6,
	postal_code = $7,
	website = $8,
	main_phone = $9,
	alternate_phone = $10,
	location_id = $11,
	lat = $12,
	lng = $13,
	updated_at = now()
WHERE customer_id = $1
RETURNING {CONTACT_COLUMNS}"
		);
		let contact = sqlx::query_as::<_, Contact>(&sql)
			.bind(customer_id)
			.bind(line_1.as_deref())
			.bind(line_2.as_deref())
			.bind(checked.city.as_str())
			.bind(state.as_ref().map(|state| state.state_id))
			.bind(country.abbr.as_str())
			.bind(trimmed(req.postal_code.as_deref()))
			.bind(trimmed(req.website.as_deref()))
			.bind(checked.main_phone.as_deref())
			.bind(checked.alternate_phone.as_deref())
			.bind(location.location_id)
			.bind(point.lat)
			.bind(point.lng)
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("contact of customer {customer_id}")))?;

		Ok(contact)
	}

	pub async fn add_favorite(&self, req: FavoriteRequest) -> Result<()> {
		let mut conn = self.db.pool.acquire().await?;

		queries::get_customer(&mut conn, req.customer_id).await?;
		queries::get_guide(&mut conn, req.guide_id).await?;
		sqlx::query(
			"INSERT INTO favorite_guides (customer_id, guide_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
		)
		.bind(req.customer_id)
		.bind(req.guide_id)
		.execute(&mut *conn)
		.await?;

		Ok(())
	}

	pub async fn remove_favorite(&self, req: FavoriteRequest) -> Result<()> {
		sqlx::query("DELETE FROM favorite_guides WHERE customer_id = $1 AND guide_id = $2")
			.bind(req.customer_id)
			.bind(req.guide_id)
			.execute(&self.db.pool)
			.await?;

		Ok(())
	}
}

pub(crate) async fn load_contact(
	conn: &mut sqlx::PgConnection,
	customer_id: Uuid,
) -> Result<Contact> {
	let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE customer_id = $1");

	sqlx::query_as::<_, Contact>(&sql)
		.bind(customer_id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| Error::not_found(format!("contact of customer {customer_id}")))
}

fn check_contact(req: &ContactUpdate) -> Result<CheckedContact> {
	let main_phone = trimmed(req.main_phone.as_deref())
		.map(|raw| rules::phone_digits("main_phone", &raw))
		.transpose()?;
	let alternate_phone = trimmed(req.alternate_phone.as_deref())
		.map(|raw| rules::phone_digits("alternate_phone", &raw))
		.transpose()?;

	for (field, value) in
		[("address_line_1", &req.address_line_1), ("address_line_2", &req.address_line_2)]
	{
		if let Some(value) = value {
			rules::max_text(field, value.trim(), ADDRESS_LINE_MAX_CHARS)?;
		}
	}

	let city = trimmed(req.city.as_deref())
		.ok_or_else(|| rules::RuleViolation::new("city", "Please enter a location."))?;

	rules::max_text("city", &city, CITY_MAX_CHARS)?;

	Ok(CheckedContact { city, main_phone, alternate_phone })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn update(city: Option<&str>, main_phone: Option<&str>) -> ContactUpdate {
		ContactUpdate {
			city: city.map(str::to_string),
			main_phone: main_phone.map(str::to_string),
			..Default::default()
		}
	}

	#[test]
	fn phones_are_normalized_to_digits() {
		let checked = check_contact(&update(Some("Venice"), Some("(504) 555-0199")))
			.expect("Contact must be valid.");

		assert_eq!(checked.main_phone.as_deref(), Some("5045550199"));
		assert_eq!(checked.alternate_phone, None);
	}

	#[test]
	fn short_phone_is_rejected() {
		let err = check_contact(&update(Some("Venice"), Some("555-01")))
			.expect_err("Expected phone error.");

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "main_phone"));
	}

	#[test]
	fn city_is_required() {
		let err = check_contact(&update(Some("  "), None)).expect_err("Expected city error.");

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "city"));
	}
}
