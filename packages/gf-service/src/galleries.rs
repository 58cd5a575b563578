//! Picture galleries. Image bytes live in media storage; this module owns names, paths,
//! capacity and the bookkeeping rows.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use gf_domain::{media, rules};
use gf_storage::{
	models::{Gallery, Photo},
	queries,
};

use crate::{Error, GuideService, Result, trimmed};

const PHOTO_COLUMNS: &str = "\
photo_id, gallery_id, title, summary, image_path, thumb_path, width, height, thumb_width, \
thumb_height, created_at";
const GALLERY_COLUMNS: &str =
	"gallery_id, customer_id, description, created_on, num_photos, max_photos, cover_photo_id";

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryRequest {
	pub customer_id: Uuid,
	#[serde(default)]
	pub description: Option<String>,
}

/// An uploaded photo: its original file name and pixel size.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRequest {
	pub title: String,
	#[serde(default)]
	pub summary: String,
	pub upload_name: String,
	pub width: u32,
	pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoResponse {
	pub photo: Photo,
	pub gallery: Gallery,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverRequest {
	#[serde(default)]
	pub photo_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedPhoto {
	pub gallery: Gallery,
	/// Media paths the caller may now delete.
	pub released: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryView {
	pub gallery: Gallery,
	pub root: String,
	pub photos: Vec<Photo>,
}

impl GuideService {
	/// Extra galleries get the same capacity as the owner's first one.
	pub async fn create_gallery(&self, req: GalleryRequest) -> Result<Gallery> {
		let description = trimmed(req.description.as_deref());

		if let Some(description) = description.as_deref() {
			rules::max_text("description", description, rules::GALLERY_DESCRIPTION_MAX_CHARS)?;
		}

		let mut conn = self.db.pool.acquire().await?;
		let customer = queries::get_customer(&mut conn, req.customer_id).await?;
		let max_photos = if customer.is_guide {
			self.cfg.gallery.guide_max_photos
		} else {
			self.cfg.gallery.customer_max_photos
		};
		let sql = format!(
			"\
INSERT INTO galleries (gallery_id, customer_id, description, max_photos)
VALUES ($1, $2, $3, $4)
RETURNING {GALLERY_COLUMNS}"
		);
		let gallery = sqlx::query_as::<_, Gallery>(&sql)
			.bind(Uuid::new_v4())
			.bind(req.customer_id)
			.bind(description)
			.bind(max_photos)
			.fetch_one(&mut *conn)
			.await?;

		Ok(gallery)
	}

	pub async fn add_photo(&self, gallery_id: Uuid, req: PhotoRequest) -> Result<PhotoResponse> {
		let title = rules::required_text("title", &req.title, rules::PHOTO_TITLE_MAX_CHARS)?;
		let summary = req.summary.trim().to_string();

		rules::max_text("summary", &summary, rules::PHOTO_SUMMARY_MAX_CHARS)?;

		if req.width == 0 || req.height == 0 {
			return Err(rules::RuleViolation::new("width", "Image dimensions must be non-zero.").into());
		}

		let mut tx = self.db.pool.begin().await?;
		let gallery = lock_gallery(&mut tx, gallery_id).await?;

		if gallery.num_photos >= gallery.max_photos {
			return Err(Error::conflict(format!(
				"Photo capacity of {} reached for gallery {gallery_id}.",
				gallery.max_photos
			)));
		}

		let existing = list_photos(&mut tx, gallery_id).await?;
		let root = media::gallery_root(gallery.customer_id, gallery_id);
		let (image_path, thumb_path) = allocate_paths(&root, &req.upload_name, &existing);
		let (width, height) = media::fit_within(req.width, req.height, media::PHOTO);
		let (thumb_width, thumb_height) = media::fit_within(width, height, media::PHOTO_STRIP);
		let sql = format!(
			"\
INSERT INTO photos (
	photo_id, gallery_id, title, summary, image_path, thumb_path, width, height, thumb_width,
	thumb_height
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
RETURNING {PHOTO_COLUMNS}"
		);
		let photo = sqlx::query_as::<_, Photo>(&sql)
			.bind(Uuid::new_v4())
			.bind(gallery_id)
			.bind(title.as_str())
			.bind(summary.as_str())
			.bind(image_path.as_str())
			.bind(thumb_path.as_str())
			.bind(width as i32)
			.bind(height as i32)
			.bind(thumb_width as i32)
			.bind(thumb_height as i32)
			.fetch_one(&mut *tx)
			.await?;
		let gallery = recount(&mut tx, gallery_id).await?;

		tx.commit().await?;

		tracing::debug!(
			gallery_id = %gallery_id,
			photo_id = %photo.photo_id,
			path = %photo.image_path,
			"Stored photo."
		);

		Ok(PhotoResponse { photo, gallery })
	}

	pub async fn set_cover(&self, gallery_id: Uuid, req: CoverRequest) -> Result<Gallery> {
		let mut tx = self.db.pool.begin().await?;

		lock_gallery(&mut tx, gallery_id).await?;

		if let Some(photo_id) = req.photo_id {
			let belongs: bool = sqlx::query_scalar(
				"SELECT EXISTS (SELECT 1 FROM photos WHERE photo_id = $1 AND gallery_id = $2)",
			)
			.bind(photo_id)
			.bind(gallery_id)
			.fetch_one(&mut *tx)
			.await?;

			if !belongs {
				return Err(Error::not_found(format!("photo {photo_id} in gallery {gallery_id}")));
			}
		}

		let sql = format!(
			"UPDATE galleries SET cover_photo_id = $2 WHERE gallery_id = $1 RETURNING {GALLERY_COLUMNS}"
		);
		let gallery = sqlx::query_as::<_, Gallery>(&sql)
			.bind(gallery_id)
			.bind(req.photo_id)
			.fetch_one(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(gallery)
	}

	/// Deletes a photo, clearing the cover if it was the cover, and releases both media paths.
	pub async fn delete_photo(&self, gallery_id: Uuid, photo_id: Uuid) -> Result<DeletedPhoto> {
		let mut tx = self.db.pool.begin().await?;

		lock_gallery(&mut tx, gallery_id).await?;

		let paths: Option<(String, String)> = sqlx::query_as(
			"DELETE FROM photos WHERE photo_id = $1 AND gallery_id = $2 RETURNING image_path, thumb_path",
		)
		.bind(photo_id)
		.bind(gallery_id)
		.fetch_optional(&mut *tx)
		.await?;
		let (image_path, thumb_path) =
			paths.ok_or_else(|| Error::not_found(format!("photo {photo_id} in gallery {gallery_id}")))?;

		sqlx::query("UPDATE galleries SET cover_photo_id = NULL WHERE gallery_id = $1 AND cover_photo_id = $2")
			.bind(gallery_id)
			.bind(photo_id)
			.execute(&mut *tx)
			.await?;

		let gallery = recount(&mut tx, gallery_id).await?;

		tx.commit().await?;

		Ok(DeletedPhoto { gallery, released: vec![image_path, thumb_path] })
	}

	pub async fn gallery_view(&self, gallery_id: Uuid) -> Result<GalleryView> {
		let mut conn = self.db.pool.acquire().await?;
		let gallery = queries::get_gallery(&mut conn, gallery_id).await?;
		let photos = list_photos(&mut conn, gallery_id).await?;
		let root = media::gallery_root(gallery.customer_id, gallery_id);

		Ok(GalleryView { gallery, root, photos })
	}
}

async fn lock_gallery(conn: &mut PgConnection, gallery_id: Uuid) -> Result<Gallery> {
	let sql = format!("SELECT {GALLERY_COLUMNS} FROM galleries WHERE gallery_id = $1 FOR UPDATE");

	sqlx::query_as::<_, Gallery>(&sql)
		.bind(gallery_id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| Error::not_found(format!("gallery {gallery_id}")))
}

async fn list_photos(conn: &mut PgConnection, gallery_id: Uuid) -> Result<Vec<Photo>> {
	let sql = format!(
		"SELECT {PHOTO_COLUMNS} FROM photos WHERE gallery_id = $1 ORDER BY created_at DESC, photo_id"
	);
	let rows = sqlx::query_as::<_, Photo>(&sql).bind(gallery_id).fetch_all(&mut *conn).await?;

	Ok(rows)
}

async fn recount(conn: &mut PgConnection, gallery_id: Uuid) -> Result<Gallery> {
	let sql = format!(
		"\
UPDATE galleries
SET num_photos = (SELECT count(*) FROM photos WHERE gallery_id = $1)
WHERE gallery_id = $1
RETURNING {GALLERY_COLUMNS}"
	);
	let gallery = sqlx::query_as::<_, Gallery>(&sql).bind(gallery_id).fetch_one(&mut *conn).await?;

	Ok(gallery)
}

/// Image and thumbnail paths for an upload that collide with no existing photo of the
/// gallery.
fn allocate_paths(root: &str, upload_name: &str, existing: &[Photo]) -> (String, String) {
	let mut taken: Vec<String> = existing
		.iter()
		.filter_map(|photo| photo.image_path.strip_prefix(root).map(str::to_string))
		.collect();
	let thumbs: Vec<&str> =
		existing.iter().filter_map(|photo| photo.thumb_path.strip_prefix(root)).collect();

	loop {
		let name = media::allocate_photo_name(upload_name, &taken);
		let thumb = media::thumbnail_name(&name);

		if !thumbs.contains(&thumb.as_str()) {
			return (format!("{root}{name}"), format!("{root}{thumb}"));
		}

		taken.push(name);
	}
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;

	fn photo(root: &str, name: &str) -> Photo {
		Photo {
			photo_id: Uuid::new_v4(),
			gallery_id: Uuid::nil(),
			title: "Bull red".to_string(),
			summary: String::new(),
			image_path: format!("{root}{name}"),
			thumb_path: format!("{root}{}", media::thumbnail_name(name)),
			width: 500,
			height: 400,
			thumb_width: 75,
			thumb_height: 60,
			created_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	#[test]
	fn fresh_upload_keeps_its_name() {
		let root = media::gallery_root(1, 2);
		let (image, thumb) = allocate_paths(&root, "C:\\photos\\redfish.jpg", &[]);

		assert_eq!(image, "users/1/gallery/2/redfish.jpg");
		assert_eq!(thumb, "users/1/gallery/2/redfish.thumbnail");
	}

	#[test]
	fn thumbnail_collisions_also_force_a_suffix() {
		let root = media::gallery_root(1, 2);
		let existing = [photo(&root, "redfish.png")];
		let (image, thumb) = allocate_paths(&root, "redfish.jpg", &existing);

		assert_eq!(image, "users/1/gallery/2/redfish_1.jpg");
		assert_eq!(thumb, "users/1/gallery/2/redfish_1.thumbnail");
	}
}
