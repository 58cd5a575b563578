use serde::{Deserialize, Serialize};

/// Fresh or salt water species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterType {
	#[serde(rename = "FW")]
	Fresh,
	#[serde(rename = "SW")]
	Salt,
}
impl WaterType {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_uppercase().as_str() {
			"FW" => Some(Self::Fresh),
			"SW" => Some(Self::Salt),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fresh => "FW",
			Self::Salt => "SW",
		}
	}
}

/// Equipment brand categories. Brand names are unique within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandKind {
	Lure,
	Rod,
	Reel,
	Line,
	Bait,
	Engine,
	Boat,
}
impl BrandKind {
	pub const ALL: [Self; 7] =
		[Self::Lure, Self::Rod, Self::Reel, Self::Line, Self::Bait, Self::Engine, Self::Boat];

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lure => "lure",
			Self::Rod => "rod",
			Self::Reel => "reel",
			Self::Line => "line",
			Self::Bait => "bait",
			Self::Engine => "engine",
			Self::Boat => "boat",
		}
	}

	/// Tackle brands are linked to guides directly; engine and boat brands only through the
	/// guide's engines and boats.
	pub fn is_tackle(self) -> bool {
		!matches!(self, Self::Engine | Self::Boat)
	}
}

/// The twelve yes/no answers of a guide's FAQ, in display order, with their defaults.
pub const FAQ_FLAGS: [(&str, bool); 12] = [
	("child_friendly", true),
	("alcohol_allowed", true),
	("food_provided", true),
	("capture_release", true),
	("state_certified", false),
	("cg_certified", false),
	("handicap_friendly", true),
	("personal_equipment", false),
	("lost_tackle", false),
	("fillet_services", false),
	("taxidermy_services", false),
	("allow_international", true),
];

/// Column name for a FAQ flag given as a request parameter, matched case-insensitively so
/// `CG_certified` maps to `cg_certified`.
pub fn faq_column(param: &str) -> Option<&'static str> {
	let lowered = param.to_ascii_lowercase();

	FAQ_FLAGS.iter().map(|(name, _)| *name).find(|name| *name == lowered)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn water_type_is_case_insensitive() {
		assert_eq!(WaterType::parse("fw"), Some(WaterType::Fresh));
		assert_eq!(WaterType::parse(" SW "), Some(WaterType::Salt));
		assert_eq!(WaterType::parse("brackish"), None);
	}

	#[test]
	fn faq_params_map_to_columns() {
		assert_eq!(faq_column("CG_certified"), Some("cg_certified"));
		assert_eq!(faq_column("child_friendly"), Some("child_friendly"));
		assert_eq!(faq_column("isnew"), None);
	}

	#[test]
	fn brand_kinds_round_trip_names() {
		for kind in BrandKind::ALL {
			assert_eq!(BrandKind::parse(kind.as_str()), Some(kind));
		}

		assert!(BrandKind::Reel.is_tackle());
		assert!(!BrandKind::Boat.is_tackle());
	}
}
