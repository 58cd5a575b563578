use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gf_domain::rules;
use gf_storage::{geography as store, models::ShadowGuide};

use crate::{GuideService, Result, trimmed};

const SHADOW_COLUMNS: &str =
	"shadow_guide_id, first_name, last_name, company, phone, email, source_url, created_at";

/// A prospective guide entered by an admin before they sign up.
#[derive(Debug, Clone, Deserialize)]
pub struct ShadowGuideRequest {
	pub first_name: String,
	pub last_name: String,
	#[serde(default)]
	pub company: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub source_url: Option<String>,
	#[serde(default)]
	pub location_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShadowGuideView {
	pub shadow_guide: ShadowGuide,
	pub location_ids: Vec<Uuid>,
}

impl GuideService {
	pub async fn create_shadow_guide(&self, req: ShadowGuideRequest) -> Result<ShadowGuideView> {
		let first_name =
			rules::required_text("first_name", &req.first_name, rules::PERSON_NAME_MAX_CHARS)?;
		let last_name =
			rules::required_text("last_name", &req.last_name, rules::PERSON_NAME_MAX_CHARS)?;
		let phone = trimmed(req.phone.as_deref())
			.map(|raw| rules::phone_digits("phone", &raw))
			.transpose()?
			.unwrap_or_default();
		let email = trimmed(req.email.as_deref())
			.map(|raw| rules::email("email", &raw))
			.transpose()?
			.unwrap_or_default();
		let mut tx = self.db.pool.begin().await?;

		for location_id in &req.location_ids {
			store::get_location(&mut tx, *location_id).await?;
		}

		let sql = format!(
			"\
INSERT INTO shadow_guides (shadow_guide_id, first_name, last_name, company, phone, email, source_url)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING {SHADOW_COLUMNS}"
		);
		let shadow_guide = sqlx::query_as::<_, ShadowGuide>(&sql)
			.bind(Uuid::new_v4())
			.bind(first_name.as_str())
			.bind(last_name.as_str())
			.bind(trimmed(req.company.as_deref()))
			.bind(phone.as_str())
			.bind(email.as_str())
			.bind(trimmed(req.source_url.as_deref()))
			.fetch_one(&mut *tx)
			.await?;

		sqlx::query(
			"\
INSERT INTO shadow_guide_locations (shadow_guide_id, location_id)
SELECT $1, unnest($2::uuid[])
ON CONFLICT DO NOTHING",
		)
		.bind(shadow_guide.shadow_guide_id)
		.bind(&req.location_ids)
		.execute(&mut *tx)
		.await?;
		tx.commit().await?;

		let mut location_ids = req.location_ids;

		location_ids.sort();
		location_ids.dedup();

		Ok(ShadowGuideView { shadow_guide, location_ids })
	}

	pub async fn list_shadow_guides(&self) -> Result<Vec<ShadowGuideView>> {
		let mut conn = self.db.pool.acquire().await?;
		let sql = format!("SELECT {SHADOW_COLUMNS} FROM shadow_guides ORDER BY last_name, first_name");
		let rows = sqlx::query_as::<_, ShadowGuide>(&sql).fetch_all(&mut *conn).await?;
		let mut out = Vec::with_capacity(rows.len());

		for shadow_guide in rows {
			let location_ids: Vec<Uuid> = sqlx::query_scalar(
				"\
SELECT location_id
FROM shadow_guide_locations
WHERE shadow_guide_id = $1
ORDER BY location_id",
			)
			.bind(shadow_guide.shadow_guide_id)
			.fetch_all(&mut *conn)
			.await?;

			out.push(ShadowGuideView { shadow_guide, location_ids });
		}

		Ok(out)
	}
}
