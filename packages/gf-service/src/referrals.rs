use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use gf_domain::rules;
use gf_storage::{models::Referral, queries};

use crate::{Error, GuideService, Result};

const REFERRAL_COLUMNS: &str = "\
referral_id, guide_id, reference, first_name, last_name, email, created_on, is_accepted, accepted_on";
const REFERENCE_HEX_CHARS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralRequest {
	pub guide_id: Uuid,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptRequest {
	pub reference: String,
}

impl GuideService {
	/// Records a prospect referred by a guide and counts it toward the guide's referrals.
	pub async fn refer(&self, req: ReferralRequest) -> Result<Referral> {
		let first_name =
			rules::required_text("first_name", &req.first_name, rules::PERSON_NAME_MAX_CHARS)?;
		let last_name =
			rules::required_text("last_name", &req.last_name, rules::PERSON_NAME_MAX_CHARS)?;
		let email = rules::email("email", &req.email)?;
		let mut tx = self.db.pool.begin().await?;

		queries::get_guide(&mut tx, req.guide_id).await?;

		let referral_id = Uuid::new_v4();
		let reference = referral_reference(req.guide_id, referral_id, OffsetDateTime::now_utc());
		let sql = format!(
			"\
INSERT INTO referrals (referral_id, guide_id, reference, first_name, last_name, email)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING {REFERRAL_COLUMNS}"
		);
		let referral = sqlx::query_as::<_, Referral>(&sql)
			.bind(referral_id)
			.bind(req.guide_id)
			.bind(reference.as_str())
			.bind(first_name.as_str())
			.bind(last_name.as_str())
			.bind(email.as_str())
			.fetch_one(&mut *tx)
			.await?;

		sqlx::query("UPDATE guides SET num_referrals = num_referrals + 1 WHERE guide_id = $1")
			.bind(req.guide_id)
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		tracing::info!(guide_id = %req.guide_id, reference = %referral.reference, "Recorded referral.");

		Ok(referral)
	}

	/// Marks a referral accepted today. Accepting twice keeps the first acceptance date.
	pub async fn accept_referral(&self, req: AcceptRequest) -> Result<Referral> {
		let sql = format!(
			"\
UPDATE referrals
SET is_accepted = true, accepted_on = coalesce(accepted_on, current_date)
WHERE reference = $1
RETURNING {REFERRAL_COLUMNS}"
		);

		sqlx::query_as::<_, Referral>(&sql)
			.bind(req.reference.trim())
			.fetch_optional(&self.db.pool)
			.await?
			.ok_or_else(|| Error::not_found(format!("referral {}", req.reference.trim())))
	}

	pub async fn list_referrals(&self, guide_id: Uuid) -> Result<Vec<Referral>> {
		let sql = format!(
			"\
SELECT {REFERRAL_COLUMNS}
FROM referrals
WHERE guide_id = $1
ORDER BY first_name, last_name, created_on"
		);
		let rows = sqlx::query_as::<_, Referral>(&sql).bind(guide_id).fetch_all(&self.db.pool).await?;

		Ok(rows)
	}
}

fn referral_reference(guide_id: Uuid, referral_id: Uuid, now: OffsetDateTime) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(guide_id.as_bytes());
	hasher.update(referral_id.as_bytes());
	hasher.update(&now.unix_timestamp_nanos().to_le_bytes());

	let mut hex = hasher.finalize().to_hex().to_string();

	hex.truncate(REFERENCE_HEX_CHARS);

	hex
}
