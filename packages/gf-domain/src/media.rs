//! Image bookkeeping: where uploads live and how large their thumbnails may be.

use serde::Serialize;

/// Bounding box an image is shrunk into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailSpec {
	pub max_width: u32,
	pub max_height: u32,
}

pub const PHOTO: ThumbnailSpec = ThumbnailSpec { max_width: 500, max_height: 400 };
pub const PHOTO_STRIP: ThumbnailSpec = ThumbnailSpec { max_width: 500, max_height: 60 };
pub const BRAND_LOGO: ThumbnailSpec = ThumbnailSpec { max_width: 100, max_height: 100 };
pub const FISH_IMAGE: ThumbnailSpec = ThumbnailSpec { max_width: 200, max_height: 150 };
pub const FISHING_TYPE_IMAGE: ThumbnailSpec = ThumbnailSpec { max_width: 200, max_height: 200 };

/// Scales `(width, height)` down to fit `spec`, preserving aspect ratio. Never upscales and
/// never returns a zero dimension.
pub fn fit_within(width: u32, height: u32, spec: ThumbnailSpec) -> (u32, u32) {
	if width == 0 || height == 0 {
		return (width, height);
	}
	if width <= spec.max_width && height <= spec.max_height {
		return (width, height);
	}

	let scale = f64::min(
		f64::from(spec.max_width) / f64::from(width),
		f64::from(spec.max_height) / f64::from(height),
	);
	let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);

	(scaled(width).min(spec.max_width), scaled(height).min(spec.max_height))
}

pub fn gallery_root(customer_id: impl std::fmt::Display, gallery_id: impl std::fmt::Display) -> String {
	format!("users/{customer_id}/gallery/{gallery_id}/")
}

/// Storage name for an upload: the base file name (any directories stripped), suffixed with
/// `_1`, `_2`, ... until it no longer collides with `taken`.
pub fn allocate_photo_name(upload_name: &str, taken: &[String]) -> String {
	let base = upload_name.rsplit(['/', '\\']).next().unwrap_or(upload_name);
	let base = if base.is_empty() { "photo.jpg" } else { base };
	let (stem, ext) = split_extension(base);
	let mut candidate = base.to_string();
	let mut suffix = 0_u32;

	while taken.iter().any(|name| name == &candidate) {
		suffix += 1;
		candidate = match ext {
			Some(ext) => format!("{stem}_{suffix}.{ext}"),
			None => format!("{stem}_{suffix}"),
		};
	}

	candidate
}

/// The thumbnail of `name` shares its stem with a `.thumbnail` extension.
pub fn thumbnail_name(name: &str) -> String {
	format!("{}.thumbnail", split_extension(name).0)
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
	match name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
		_ => (name, None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_images_are_not_upscaled() {
		assert_eq!(fit_within(320, 240, PHOTO), (320, 240));
	}

	#[test]
	fn large_images_keep_aspect() {
		assert_eq!(fit_within(1000, 800, PHOTO), (500, 400));
		assert_eq!(fit_within(1600, 600, PHOTO), (500, 188));
		assert_eq!(fit_within(1000, 800, PHOTO_STRIP), (75, 60));
		assert_eq!(fit_within(5000, 10, BRAND_LOGO), (100, 1));
	}

	#[test]
	fn colliding_names_get_a_suffix() {
		let taken = vec!["bass.jpg".to_string(), "bass_1.jpg".to_string()];

		assert_eq!(allocate_photo_name("C:\\pics\\bass.jpg", &taken), "bass_2.jpg");
		assert_eq!(allocate_photo_name("trout.png", &taken), "trout.png");
	}

	#[test]
	fn thumbnail_uses_stem() {
		assert_eq!(thumbnail_name("bass_2.jpg"), "bass_2.thumbnail");
		assert_eq!(thumbnail_name("noext"), "noext.thumbnail");
		assert_eq!(gallery_root(7, 3), "users/7/gallery/3/");
	}
}
