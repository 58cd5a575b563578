use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use gf_domain::{
	catalog::{self, BrandKind},
	naming, rules,
};
use gf_storage::{
	geography::{self as store, LOCATION_COLUMNS, WATER_BODY_COLUMNS},
	models::{
		Boat, Brand, Customer, Engine, ExtraDetails, Faq, Fish, FishingType, Guide, Location,
		Party, Payment, WaterBody,
	},
	queries::{self, GUIDE_COLUMNS},
};

use crate::{Error, GuideService, Result, customers, trimmed};

const FAQ_COLUMNS: &str = "\
guide_id, child_friendly, alcohol_allowed, food_provided, capture_release, state_certified, \
cg_certified, handicap_friendly, personal_equipment, lost_tackle, fillet_services, \
taxidermy_services, allow_international, explanation";
const COMPANY_MAX_CHARS: usize = 200;

/// A record a guide can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LinkTarget {
	Location(Uuid),
	WaterBody(Uuid),
	Fish(Uuid),
	Method(Uuid),
	Brand(Uuid),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailsRequest {
	#[serde(default)]
	pub company: Option<String>,
	#[serde(default)]
	pub experience: i32,
	#[serde(default)]
	pub blurb: Option<String>,
	#[serde(default)]
	pub profile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartyRequest {
	pub min_party: i32,
	pub max_party: i32,
	pub avg_party: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaqRequest {
	#[serde(default)]
	pub answers: BTreeMap<String, bool>,
	#[serde(default)]
	pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtrasRequest {
	#[serde(default)]
	pub good_attitude: Option<bool>,
	#[serde(default)]
	pub life_jacket: Option<bool>,
	#[serde(default)]
	pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuideView {
	pub guide: Guide,
	pub person: Customer,
	pub full_name: String,
	pub slug: String,
	pub party: Party,
	pub faq: Faq,
	pub extras: ExtraDetails,
	pub payments: Vec<Payment>,
	pub boats: Vec<Boat>,
	pub engines: Vec<Engine>,
	pub brands: Vec<Brand>,
	pub locations: Vec<Location>,
	pub water_bodies: Vec<WaterBody>,
	pub fish: Vec<Fish>,
	pub methods: Vec<FishingType>,
}

impl GuideService {
	/// Turns a customer into a guide with default party, FAQ and extras, a larger gallery and
	/// the contact city as the first fishing location.
	pub async fn become_guide(&self, customer_id: Uuid) -> Result<Guide> {
		let mut tx = self.db.pool.begin().await?;

		queries::get_customer(&mut tx, customer_id).await?;

		if queries::find_guide_by_customer(&mut tx, customer_id).await?.is_some() {
			return Err(Error::conflict(format!("Customer {customer_id} is already a guide.")));
		}

		let contact = customers::load_contact(&mut tx, customer_id).await?;
		let sql = format!(
			"\
INSERT INTO guides (guide_id, customer_id, home_location_id)
VALUES ($1, $2, $3)
RETURNING {GUIDE_COLUMNS}"
		);
		let guide = sqlx::query_as::<_, Guide>(&sql)
			.bind(Uuid::new_v4())
			.bind(customer_id)
			.bind(contact.location_id)
			.fetch_one(&mut *tx)
			.await?;
		let guide_id = guide.guide_id;

		sqlx::query("UPDATE customers SET is_guide = true WHERE customer_id = $1")
			.bind(customer_id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("INSERT INTO guide_party (guide_id) VALUES ($1)")
			.bind(guide_id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("INSERT INTO guide_faq (guide_id) VALUES ($1)")
			.bind(guide_id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("INSERT INTO guide_extra_details (guide_id) VALUES ($1)")
			.bind(guide_id)
			.execute(&mut *tx)
			.await?;
		sqlx::query("UPDATE galleries SET max_photos = greatest(max_photos, $2) WHERE customer_id = $1")
			.bind(customer_id)
			.bind(self.cfg.gallery.guide_max_photos)
			.execute(&mut *tx)
			.await?;

		if let Some(location_id) = contact.location_id {
			link_location(&mut tx, guide_id, location_id).await?;
		}

		tx.commit().await?;

		tracing::info!(guide_id = %guide_id, customer_id = %customer_id, "Customer became a guide.");

		Ok(guide)
	}

	pub async fn update_details(&self, guide_id: Uuid, req: DetailsRequest) -> Result<Guide> {
		rules::experience(req.experience, self.cfg.guides.max_experience)?;

		let company = trimmed(req.company.as_deref());
		let blurb = trimmed(req.blurb.as_deref());

		if let Some(company) = company.as_deref() {
			rules::max_text("company", company, COMPANY_MAX_CHARS)?;
		}
		if let Some(blurb) = blurb.as_deref() {
			rules::max_text("blurb", blurb, rules::BLURB_MAX_CHARS)?;
		}

		let sql = format!(
			"\
UPDATE guides
SET company = $2, experience = $3, blurb = $4, profile = $5
WHERE guide_id = $1
RETURNING {GUIDE_COLUMNS}"
		);

		sqlx::query_as::<_, Guide>(&sql)
			.bind(guide_id)
			.bind(company)
			.bind(req.experience)
			.bind(blurb)
			.bind(trimmed(req.profile.as_deref()))
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("guide {guide_id}")))
	}

	/// Links a record to the guide. Locations pull in their water bodies and water bodies pull
	/// in their locations.
	pub async fn link(&self, guide_id: Uuid, target: LinkTarget) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		queries::get_guide(&mut tx, guide_id).await?;

		match target {
			LinkTarget::Location(location_id) => {
				store::get_location(&mut tx, location_id).await?;
				link_location(&mut tx, guide_id, location_id).await?;
			},
			LinkTarget::WaterBody(water_body_id) => {
				store::get_water_body(&mut tx, water_body_id).await?;
				link_water_body(&mut tx, guide_id, water_body_id).await?;
			},
			LinkTarget::Fish(fish_id) => {
				ensure_exists(&mut tx, "fish", "fish_id", fish_id).await?;
				sqlx::query(
					"INSERT INTO guide_fish (guide_id, fish_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
				)
				.bind(guide_id)
				.bind(fish_id)
				.execute(&mut *tx)
				.await?;
			},
			LinkTarget::Method(fishing_type_id) => {
				ensure_exists(&mut tx, "fishing_types", "fishing_type_id", fishing_type_id).await?;
				sqlx::query(
					"INSERT INTO guide_methods (guide_id, fishing_type_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
				)
				.bind(guide_id)
				.bind(fishing_type_id)
				.execute(&mut *tx)
				.await?;
			},
			LinkTarget::Brand(brand_id) => {
				let kind: Option<String> =
					sqlx::query_scalar("SELECT kind FROM brands WHERE brand_id = $1")
						.bind(brand_id)
						.fetch_optional(&mut *tx)
						.await?;
				let kind = kind.ok_or_else(|| Error::not_found(format!("brand {brand_id}")))?;

				if !BrandKind::parse(&kind).is_some_and(BrandKind::is_tackle) {
					return Err(rules::RuleViolation::new(
						"brand",
						"Only tackle brands are linked directly; add a boat or engine instead.",
					)
					.into());
				}

				sqlx::query(
					"INSERT INTO guide_brands (guide_id, brand_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
				)
				.bind(guide_id)
				.bind(brand_id)
				.execute(&mut *tx)
				.await?;
			},
		}

		tx.commit().await?;

		tracing::debug!(guide_id = %guide_id, target = ?target, "Linked guide record.");

		Ok(())
	}

	/// Removes a single link. Records pulled in by propagation stay linked.
	pub async fn unlink(&self, guide_id: Uuid, target: LinkTarget) -> Result<()> {
		let (sql, id) = match target {
			LinkTarget::Location(id) =>
				("DELETE FROM guide_locations WHERE guide_id = $1 AND location_id = $2", id),
			LinkTarget::WaterBody(id) =>
				("DELETE FROM guide_water_bodies WHERE guide_id = $1 AND water_body_id = $2", id),
			LinkTarget::Fish(id) => ("DELETE FROM guide_fish WHERE guide_id = $1 AND fish_id = $2", id),
			LinkTarget::Method(id) =>
				("DELETE FROM guide_methods WHERE guide_id = $1 AND fishing_type_id = $2", id),
			LinkTarget::Brand(id) =>
				("DELETE FROM guide_brands WHERE guide_id = $1 AND brand_id = $2", id),
		};

		sqlx::query(sql).bind(guide_id).bind(id).execute(&self.db.pool).await?;

		Ok(())
	}

	/// Clears `is_new` on guides whose customer joined more than `guides.new_guide_days` ago.
	pub async fn refresh_new_flags(&self) -> Result<u64> {
		let result = sqlx::query(
			"\
UPDATE guides g
SET is_new = false
FROM customer_profiles p
WHERE p.customer_id = g.customer_id
	AND g.is_new
	AND p.joined_on < current_date - $1::int",
		)
		.bind(self.cfg.guides.new_guide_days)
		.execute(&self.db.pool)
		.await?;

		tracing::info!(cleared = result.rows_affected(), "Refreshed new-guide flags.");

		Ok(result.rows_affected())
	}

	pub async fn update_party(&self, guide_id: Uuid, req: PartyRequest) -> Result<Party> {
		rules::party(req.min_party, req.max_party, req.avg_party)?;

		sqlx::query_as::<_, Party>(
			"\
UPDATE guide_party
SET min_party = $2, max_party = $3, avg_party = $4
WHERE guide_id = $1
RETURNING guide_id, min_party, max_party, avg_party",
		)
		.bind(guide_id)
		.bind(req.min_party)
		.bind(req.max_party)
		.bind(req.avg_party)
		.fetch_optional(&self.db.pool)
		.await?
		.ok_or_else(|| Error::not_found(format!("party model of guide {guide_id}")))
	}

	/// Sets the given FAQ answers; flags that are not mentioned keep their value.
	pub async fn update_faq(&self, guide_id: Uuid, req: FaqRequest) -> Result<Faq> {
		if let Some(explanation) = req.explanation.as_deref() {
			rules::max_text("explanation", explanation, rules::FAQ_EXPLANATION_MAX_CHARS)?;
		}

		let mut builder = faq_update(guide_id, &req)?;
		let faq = builder
			.build_query_as::<Faq>()
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("FAQ of guide {guide_id}")))?;

		Ok(faq)
	}

	pub async fn update_extras(&self, guide_id: Uuid, req: ExtrasRequest) -> Result<ExtraDetails> {
		rules::max_text("details", &req.details, rules::EXTRA_DETAILS_MAX_CHARS)?;

		sqlx::query_as::<_, ExtraDetails>(
			"\
UPDATE guide_extra_details
SET good_attitude = $2, life_jacket = $3, details = $4
WHERE guide_id = $1
RETURNING guide_id, good_attitude, life_jacket, details",
		)
		.bind(guide_id)
		.bind(req.good_attitude)
		.bind(req.life_jacket)
		.bind(req.details.trim())
		.fetch_optional(&self.db.pool)
		.await?
		.ok_or_else(|| Error::not_found(format!("extra details of guide {guide_id}")))
	}

	pub async fn guide_view(&self, guide_id: Uuid) -> Result<GuideView> {
		let mut conn = self.db.pool.acquire().await?;
		let guide = queries::get_guide(&mut conn, guide_id).await?;
		let person = queries::get_customer(&mut conn, guide.customer_id).await?;
		let party = queries::get_party(&mut conn, guide_id).await?;
		let faq = sqlx::query_as::<_, Faq>(&format!(
			"SELECT {FAQ_COLUMNS} FROM guide_faq WHERE guide_id = $1"
		))
		.bind(guide_id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| Error::not_found(format!("FAQ of guide {guide_id}")))?;
		let extras = sqlx::query_as::<_, ExtraDetails>(
			"SELECT guide_id, good_attitude, life_jacket, details FROM guide_extra_details WHERE guide_id = $1",
		)
		.bind(guide_id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| Error::not_found(format!("extra details of guide {guide_id}")))?;
		let payments = crate::pricing::list_payments(&mut conn, guide_id).await?;
		let boats = sqlx::query_as::<_, Boat>(
			"\
SELECT boat_id, guide_id, brand_id, length_ft, model
FROM guide_boats
WHERE guide_id = $1
ORDER BY length_ft DESC, boat_id",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let engines = sqlx::query_as::<_, Engine>(
			"\
SELECT engine_id, guide_id, brand_id, horsepower, model
FROM guide_engines
WHERE guide_id = $1
ORDER BY horsepower DESC, engine_id",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let brands = sqlx::query_as::<_, Brand>(
			"\
SELECT b.brand_id, b.kind, b.name, b.image_path, b.is_verified
FROM brands b
JOIN guide_brands gb ON gb.brand_id = b.brand_id
WHERE gb.guide_id = $1
ORDER BY b.kind, b.name",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let locations = sqlx::query_as::<_, Location>(&format!(
			"\
SELECT {LOCATION_COLUMNS}
FROM locations
WHERE location_id IN (SELECT location_id FROM guide_locations WHERE guide_id = $1)
ORDER BY city"
		))
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let water_bodies = sqlx::query_as::<_, WaterBody>(&format!(
			"\
SELECT {WATER_BODY_COLUMNS}
FROM water_bodies
WHERE water_body_id IN (SELECT water_body_id FROM guide_water_bodies WHERE guide_id = $1)
ORDER BY name"
		))
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let fish = sqlx::query_as::<_, Fish>(
			"\
SELECT f.fish_id, f.name, f.fish_type, f.water_type, f.alt_name_1, f.alt_name_2, f.alt_name_3,
	f.image_path, f.is_verified
FROM fish f
JOIN guide_fish gf ON gf.fish_id = f.fish_id
WHERE gf.guide_id = $1
ORDER BY f.fish_type, f.name",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let methods = sqlx::query_as::<_, FishingType>(
			"\
SELECT ft.fishing_type_id, ft.method, ft.image_path, ft.is_verified
FROM fishing_types ft
JOIN guide_methods gm ON gm.fishing_type_id = ft.fishing_type_id
WHERE gm.guide_id = $1
ORDER BY ft.method",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let full_name =
			naming::full_name(&person.first_name, person.middle_name.as_deref(), &person.last_name);
		let slug = naming::slugify(&full_name);

		Ok(GuideView {
			guide,
			person,
			full_name,
			slug,
			party,
			faq,
			extras,
			payments,
			boats,
			engines,
			brands,
			locations,
			water_bodies,
			fish,
			methods,
		})
	}
}

/// Links a location and every water body related to it.
async fn link_location(conn: &mut PgConnection, guide_id: Uuid, location_id: Uuid) -> Result<()> {
	sqlx::query(
		"INSERT INTO guide_locations (guide_id, location_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
	)
	.bind(guide_id)
	.bind(location_id)
	.execute(&mut *conn)
	.await?;

	let water_body_ids = store::water_body_ids_for_location(conn, location_id).await?;

	sqlx::query(
		"\
INSERT INTO guide_water_bodies (guide_id, water_body_id)
SELECT $1, unnest($2::uuid[])
ON CONFLICT DO NOTHING",
	)
	.bind(guide_id)
	.bind(&water_body_ids)
	.execute(&mut *conn)
	.await?;

	Ok(())
}

/// Links a water body and every location related to it.
async fn link_water_body(conn: &mut PgConnection, guide_id: Uuid, water_body_id: Uuid) -> Result<()> {
	sqlx::query(
		"INSERT INTO guide_water_bodies (guide_id, water_body_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
	)
	.bind(guide_id)
	.bind(water_body_id)
	.execute(&mut *conn)
	.await?;

	let location_ids = store::location_ids_for_water_body(conn, water_body_id).await?;

	sqlx::query(
		"\
INSERT INTO guide_locations (guide_id, location_id)
SELECT $1, unnest($2::uuid[])
ON CONFLICT DO NOTHING",
	)
	.bind(guide_id)
	.bind(&location_ids)
	.execute(&mut *conn)
	.await?;

	Ok(())
}

async fn ensure_exists(
	conn: &mut PgConnection,
	table: &'static str,
	column: &'static str,
	id: Uuid,
) -> Result<()> {
	let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE {column} = $1)");
	let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;

	if !exists {
		return Err(Error::not_found(format!("{table} record {id}")));
	}

	Ok(())
}

fn faq_update(guide_id: Uuid, req: &FaqRequest) -> Result<QueryBuilder<'static, Postgres>> {
	let mut builder = QueryBuilder::new("UPDATE guide_faq SET ");
	let mut assignments = builder.separated(", ");

	for (param, value) in &req.answers {
		let column = catalog::faq_column(param)
			.ok_or_else(|| rules::RuleViolation::new(param.as_str(), "Unknown FAQ question."))?;

		assignments.push(format!("{column} = "));
		assignments.push_bind_unseparated(*value);
	}

	assignments.push("explanation = coalesce(");
	assignments.push_bind_unseparated(req.explanation.as_deref().map(|text| text.trim().to_string()));
	assignments.push_unseparated(", explanation)");
	builder.push(" WHERE guide_id = ");
	builder.push_bind(guide_id);
	builder.push(format!(" RETURNING {FAQ_COLUMNS}"));

	Ok(builder)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn faq_update_sets_only_named_flags() {
		let req = FaqRequest {
			answers: BTreeMap::from([
				("CG_certified".to_string(), true),
				("child_friendly".to_string(), false),
			]),
			explanation: None,
		};
		let builder = faq_update(Uuid::nil(), &req).expect("Known flags must build.");

		assert_eq!(
			builder.sql(),
			format!(
				"UPDATE guide_faq SET cg_certified = $1, child_friendly = $2, \
explanation = coalesce($3, explanation) WHERE guide_id = $4 RETURNING {FAQ_COLUMNS}"
			)
		);
	}

	#[test]
	fn unknown_faq_flag_is_a_field_error() {
		let req = FaqRequest {
			answers: BTreeMap::from([("serves_lunch".to_string(), true)]),
			explanation: None,
		};
		let Err(err) = faq_update(Uuid::nil(), &req) else {
			panic!("Unknown flag must fail.");
		};

		assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "serves_lunch"));
	}

	#[test]
	fn link_targets_are_tagged() {
		let target: LinkTarget = serde_json::from_value(serde_json::json!({
			"kind": "water_body",
			"id": "00000000-0000-0000-0000-000000000000",
		}))
		.expect("Link target must parse.");

		assert_eq!(target, LinkTarget::WaterBody(Uuid::nil()));
	}
}
