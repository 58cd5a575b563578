use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, GuideService, Result};

/// Records an admin can mark as verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
	Country,
	State,
	Location,
	WaterBody,
	GeoRelation,
	Fish,
	FishingType,
	Brand,
}
impl RecordKind {
	fn table(self) -> (&'static str, &'static str) {
		match self {
			Self::Country => ("countries", "abbr"),
			Self::State => ("states", "state_id"),
			Self::Location => ("locations", "location_id"),
			Self::WaterBody => ("water_bodies", "water_body_id"),
			Self::GeoRelation => ("geo_relations", "relation_id"),
			Self::Fish => ("fish", "fish_id"),
			Self::FishingType => ("fishing_types", "fishing_type_id"),
			Self::Brand => ("brands", "brand_id"),
		}
	}
}

/// Countries are keyed by their two-letter code; every other kind by UUID.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
	pub kind: RecordKind,
	pub id: String,
	#[serde(default = "default_verified")]
	pub verified: bool,
}

fn default_verified() -> bool {
	true
}

impl GuideService {
	pub async fn verify(&self, req: VerifyRequest) -> Result<()> {
		let (table, column) = req.kind.table();
		let sql = format!("UPDATE {table} SET is_verified = $2 WHERE {column} = $1");
		let updated = match req.kind {
			RecordKind::Country =>
				sqlx::query(&sql)
					.bind(req.id.trim().to_ascii_uppercase())
					.bind(req.verified)
					.execute(&self.db.pool)
					.await?,
			_ => {
				let id = Uuid::parse_str(req.id.trim()).map_err(|_| Error::InvalidField {
					field: "id".to_string(),
					message: "Expected a UUID.".to_string(),
				})?;

				sqlx::query(&sql).bind(id).bind(req.verified).execute(&self.db.pool).await?
			},
		};

		if updated.rows_affected() == 0 {
			return Err(Error::not_found(format!("{table} record {}", req.id)));
		}

		tracing::info!(kind = ?req.kind, id = %req.id, verified = req.verified, "Updated verification.");

		Ok(())
	}
}
