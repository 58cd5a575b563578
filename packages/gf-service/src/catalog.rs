//! Fish, fishing methods, equipment brands and the boats and engines guides own.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use gf_domain::{
	catalog::{BrandKind, WaterType},
	media::{self, ThumbnailSpec},
	rules,
};
use gf_storage::{
	models::{Boat, Brand, Engine, Fish, FishingType},
	queries,
};

use crate::{Error, GuideService, Result, trimmed};

const FISH_COLUMNS: &str = "\
fish_id, name, fish_type, water_type, alt_name_1, alt_name_2, alt_name_3, image_path, is_verified";
const CATALOG_NAME_MAX_CHARS: usize = 100;
const MAX_ALT_NAMES: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct FishRequest {
	pub name: String,
	pub fish_type: String,
	pub water_type: String,
	#[serde(default)]
	pub alt_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FishingTypeRequest {
	pub method: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandRequest {
	pub kind: String,
	pub name: String,
}

/// Catalog records that carry an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOwner {
	Fish,
	FishingType,
	Brand,
}
impl ImageOwner {
	fn table(self) -> (&'static str, &'static str) {
		match self {
			Self::Fish => ("fish", "fish_id"),
			Self::FishingType => ("fishing_types", "fishing_type_id"),
			Self::Brand => ("brands", "brand_id"),
		}
	}

	pub fn thumbnail_spec(self) -> ThumbnailSpec {
		match self {
			Self::Fish => media::FISH_IMAGE,
			Self::FishingType => media::FISHING_TYPE_IMAGE,
			Self::Brand => media::BRAND_LOGO,
		}
	}
}

/// An uploaded image already written to media storage, with its pixel size.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRequest {
	pub owner: ImageOwner,
	pub id: Uuid,
	pub image_path: String,
	pub width: u32,
	pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
	pub image_path: String,
	/// The replaced image, which the caller may now delete from media storage.
	pub released: Option<String>,
	pub stored_width: u32,
	pub stored_height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoatRequest {
	#[serde(default)]
	pub brand_id: Option<Uuid>,
	pub length_ft: i32,
	#[serde(default)]
	pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineRequest {
	#[serde(default)]
	pub brand_id: Option<Uuid>,
	pub horsepower: i32,
	#[serde(default)]
	pub model: Option<String>,
}

impl GuideService {
	pub async fn create_fish(&self, req: FishRequest) -> Result<Fish> {
		let name = rules::required_text("name", &req.name, CATALOG_NAME_MAX_CHARS)?;
		let fish_type = rules::required_text("fish_type", &req.fish_type, CATALOG_NAME_MAX_CHARS)?;
		let water_type = WaterType::parse(&req.water_type)
			.ok_or_else(|| rules::RuleViolation::new("water_type", "Expected FW or SW."))?;
		let alt_names = alt_names(&req.alt_names)?;
		let sql = format!(
			"\
INSERT INTO fish (fish_id, name, fish_type, water_type, alt_name_1, alt_name_2, alt_name_3)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING {FISH_COLUMNS}"
		);
		let fish = sqlx::query_as::<_, Fish>(&sql)
			.bind(Uuid::new_v4())
			.bind(name.as_str())
			.bind(fish_type.as_str())
			.bind(water_type.as_str())
			.bind(alt_names[0].as_deref())
			.bind(alt_names[1].as_deref())
			.bind(alt_names[2].as_deref())
			.fetch_one(&self.db.pool)
			.await?;

		Ok(fish)
	}

	pub async fn create_fishing_type(&self, req: FishingTypeRequest) -> Result<FishingType> {
		let method = rules::required_text("method", &req.method, CATALOG_NAME_MAX_CHARS)?;
		let row = sqlx::query_as::<_, FishingType>(
			"\
INSERT INTO fishing_types (fishing_type_id, method)
VALUES ($1, $2)
RETURNING fishing_type_id, method, image_path, is_verified",
		)
		.bind(Uuid::new_v4())
		.bind(method.as_str())
		.fetch_one(&self.db.pool)
		.await?;

		Ok(row)
	}

	pub async fn create_brand(&self, req: BrandRequest) -> Result<Brand> {
		let kind = BrandKind::parse(&req.kind)
			.ok_or_else(|| rules::RuleViolation::new("kind", "Unknown brand kind."))?;
		let name = rules::required_text("name", &req.name, CATALOG_NAME_MAX_CHARS)?;
		let row = sqlx::query_as::<_, Brand>(
			"\
INSERT INTO brands (brand_id, kind, name)
VALUES ($1, $2, $3)
RETURNING brand_id, kind, name, image_path, is_verified",
		)
		.bind(Uuid::new_v4())
		.bind(kind.as_str())
		.bind(name.as_str())
		.fetch_one(&self.db.pool)
		.await?;

		Ok(row)
	}

	pub async fn list_fish(&self) -> Result<Vec<Fish>> {
		let sql = format!("SELECT {FISH_COLUMNS} FROM fish ORDER BY fish_type, name");

		Ok(sqlx::query_as::<_, Fish>(&sql).fetch_all(&self.db.pool).await?)
	}

	pub async fn list_fishing_types(&self) -> Result<Vec<FishingType>> {
		let rows = sqlx::query_as::<_, FishingType>(
			"SELECT fishing_type_id, method, image_path, is_verified FROM fishing_types ORDER BY method",
		)
		.fetch_all(&self.db.pool)
		.await?;

		Ok(rows)
	}

	pub async fn list_brands(&self, kind: Option<&str>) -> Result<Vec<Brand>> {
		let kind = kind
			.map(|raw| {
				BrandKind::parse(raw).ok_or_else(|| rules::RuleViolation::new("kind", "Unknown brand kind."))
			})
			.transpose()?;
		let rows = sqlx::query_as::<_, Brand>(
			"\
SELECT brand_id, kind, name, image_path, is_verified
FROM brands
WHERE $1::text IS NULL OR kind = $1
ORDER BY kind, name",
		)
		.bind(kind.map(BrandKind::as_str))
		.fetch_all(&self.db.pool)
		.await?;

		Ok(rows)
	}

	/// Points a catalog record at a new image and reports the image it replaced.
	pub async fn set_image(&self, req: ImageRequest) -> Result<ImageResponse> {
		let image_path = rules::required_text("image_path", &req.image_path, 255)?;
		let (table, column) = req.owner.table();
		let mut tx = self.db.pool.begin().await?;
		let sql = format!("SELECT image_path FROM {table} WHERE {column} = $1 FOR UPDATE");
		let previous: Option<Option<String>> =
			sqlx::query_scalar(&sql).bind(req.id).fetch_optional(&mut *tx).await?;
		let previous = previous.ok_or_else(|| Error::not_found(format!("{table} record {}", req.id)))?;
		let sql = format!("UPDATE {table} SET image_path = $2 WHERE {column} = $1");

		sqlx::query(&sql).bind(req.id).bind(image_path.as_str()).execute(&mut *tx).await?;
		tx.commit().await?;

		let (stored_width, stored_height) =
			media::fit_within(req.width, req.height, req.owner.thumbnail_spec());
		let released = previous.filter(|old| old != &image_path);

		if let Some(old) = released.as_deref() {
			tracing::info!(table, id = %req.id, released = %old, "Replaced catalog image.");
		}

		Ok(ImageResponse { image_path, released, stored_width, stored_height })
	}

	pub async fn add_boat(&self, guide_id: Uuid, req: BoatRequest) -> Result<Boat> {
		if req.length_ft <= 0 {
			return Err(rules::RuleViolation::new("length_ft", "Must be greater than zero.").into());
		}

		let mut conn = self.db.pool.acquire().await?;

		queries::get_guide(&mut conn, guide_id).await?;

		if let Some(brand_id) = req.brand_id {
			require_brand_kind(&mut conn, brand_id, BrandKind::Boat).await?;
		}

		let row = sqlx::query_as::<_, Boat>(
			"\
INSERT INTO guide_boats (boat_id, guide_id, brand_id, length_ft, model)
VALUES ($1, $2, $3, $4, $5)
RETURNING boat_id, guide_id, brand_id, length_ft, model",
		)
		.bind(Uuid::new_v4())
		.bind(guide_id)
		.bind(req.brand_id)
		.bind(req.length_ft)
		.bind(trimmed(req.model.as_deref()))
		.fetch_one(&mut *conn)
		.await?;

		Ok(row)
	}

	pub async fn remove_boat(&self, guide_id: Uuid, boat_id: Uuid) -> Result<()> {
		let removed = sqlx::query("DELETE FROM guide_boats WHERE boat_id = $1 AND guide_id = $2")
			.bind(boat_id)
			.bind(guide_id)
			.execute(&self.db.pool)
			.await?;

		if removed.rows_affected() == 0 {
			return Err(Error::not_found(format!("boat {boat_id} of guide {guide_id}")));
		}

		Ok(())
	}

	pub async fn add_engine(&self, guide_id: Uuid, req: EngineRequest) -> Result<Engine> {
		if req.horsepower <= 0 {
			return Err(rules::RuleViolation::new("horsepower", "Must be greater than zero.").into());
		}

		let mut conn = self.db.pool.acquire().await?;

		queries::get_guide(&mut conn, guide_id).await?;

		if let Some(brand_id) = req.brand_id {
			require_brand_kind(&mut conn, brand_id, BrandKind::Engine).await?;
		}

		let row = sqlx::query_as::<_, Engine>(
			"\
INSERT INTO guide_engines (engine_id, guide_id, brand_id, horsepower, model)
VALUES ($1, $2, $3, $4, $5)
RETURNING engine_id, guide_id, brand_id, horsepower, model",
		)
		.bind(Uuid::new_v4())
		.bind(guide_id)
		.bind(req.brand_id)
		.bind(req.horsepower)
		.bind(trimmed(req.model.as_deref()))
		.fetch_one(&mut *conn)
		.await?;

		Ok(row)
	}

	pub async fn remove_engine(&self, guide_id: Uuid, engine_id: Uuid) -> Result<()> {
		let removed =
			sqlx::query("DELETE FROM guide_engines WHERE engine_id = $1 AND guide_id = $2")
				.bind(engine_id)
				.bind(guide_id)
				.execute(&self.db.pool)
				.await?;

		if removed.rows_affected() == 0 {
			return Err(Error::not_found(format!("engine {engine_id} of guide {guide_id}")));
		}

		Ok(())
	}
}

async fn require_brand_kind(conn: &mut PgConnection, brand_id: Uuid, expected: BrandKind) -> Result<()> {
	let kind: Option<String> = sqlx::query_scalar("SELECT kind FROM brands WHERE brand_id = $1")
		.bind(brand_id)
		.fetch_optional(&mut *conn)
		.await?;
	let kind = kind.ok_or_else(|| Error::not_found(format!("brand {brand_id}")))?;

	if BrandKind::parse(&kind) != Some(expected) {
		return Err(rules::RuleViolation::new(
			"brand_id",
			format!("Expected a {} brand.", expected.as_str()),
		)
		.into());
	}

	Ok(())
}

/// Up to three trimmed alternate names, blank entries dropped.
fn alt_names(raw: &[String]) -> Result<[Option<String>; MAX_ALT_NAMES]> {
	let names: Vec<String> = raw.iter().filter_map(|name| trimmed(Some(name))).collect();

	if names.len() > MAX_ALT_NAMES {
		return Err(rules::RuleViolation::new(
			"alt_names",
			format!("At most {MAX_ALT_NAMES} alternate names are allowed."),
		)
		.into());
	}

	let mut out: [Option<String>; MAX_ALT_NAMES] = Default::default();

	for (slot, name) in out.iter_mut().zip(names) {
		rules::max_text("alt_names", &name, CATALOG_NAME_MAX_CHARS)?;

		*slot = Some(name);
	}

	Ok(out)
}
