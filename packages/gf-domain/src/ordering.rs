use serde::Serialize;

/// Result ordering selected by the `ordering` search parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
	#[default]
	Price,
	Recommend,
	Experience,
	Alpha,
	Party,
	Boat,
}
impl SortOrder {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"" | "price" => Some(Self::Price),
			"recommend" => Some(Self::Recommend),
			"experience" => Some(Self::Experience),
			"alpha" => Some(Self::Alpha),
			"party" => Some(Self::Party),
			"boat" => Some(Self::Boat),
			_ => None,
		}
	}

	/// Full key sequence: the selected key(s) first, then the remaining default keys in their
	/// default order.
	pub fn keys(self) -> Vec<SortKey> {
		let front: &[SortKey] = match self {
			Self::Price => &[],
			Self::Recommend => &[SortKey::Recommends],
			Self::Experience => &[SortKey::Experience],
			Self::Alpha => &[SortKey::FirstName, SortKey::LastName],
			Self::Party => &[SortKey::PreferredParty],
			Self::Boat => &[SortKey::LongestBoat, SortKey::PreferredParty],
		};
		let mut keys = front.to_vec();

		keys.extend(DEFAULT_KEYS.iter().copied().filter(|key| !front.contains(key)));

		keys
	}

	/// `ORDER BY` body over the search projection's column names. Guide id breaks ties.
	pub fn order_by_sql(self) -> String {
		let mut parts: Vec<&str> = self.keys().into_iter().map(SortKey::sql).collect();

		parts.push("guide_id ASC");

		parts.join(", ")
	}
}

const DEFAULT_KEYS: [SortKey; 6] = [
	SortKey::FullDayPrice,
	SortKey::Recommends,
	SortKey::Experience,
	SortKey::FirstName,
	SortKey::LastName,
	SortKey::PreferredParty,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
	FullDayPrice,
	Recommends,
	Experience,
	FirstName,
	LastName,
	PreferredParty,
	LongestBoat,
}
impl SortKey {
	pub fn sql(self) -> &'static str {
		match self {
			Self::FullDayPrice => "full_day_price_cents ASC NULLS LAST",
			Self::Recommends => "num_recommends DESC",
			Self::Experience => "experience DESC",
			Self::FirstName => "first_name ASC",
			Self::LastName => "last_name ASC",
			Self::PreferredParty => "avg_party DESC NULLS LAST",
			Self::LongestBoat => "max_boat DESC NULLS LAST",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn price_is_the_default_sequence() {
		assert_eq!(SortOrder::parse(""), Some(SortOrder::Price));
		assert_eq!(SortOrder::Price.keys(), DEFAULT_KEYS.to_vec());
	}

	#[test]
	fn selected_key_moves_to_front() {
		assert_eq!(
			SortOrder::Experience.keys(),
			vec![
				SortKey::Experience,
				SortKey::FullDayPrice,
				SortKey::Recommends,
				SortKey::FirstName,
				SortKey::LastName,
				SortKey::PreferredParty,
			]
		);
		assert_eq!(SortOrder::Alpha.keys()[..2], [SortKey::FirstName, SortKey::LastName]);
	}

	#[test]
	fn boat_sorts_by_longest_boat_then_party() {
		let keys = SortOrder::Boat.keys();

		assert_eq!(keys[0], SortKey::LongestBoat);
		assert_eq!(keys[1], SortKey::PreferredParty);
		assert_eq!(keys.len(), 7);
		assert!(SortOrder::Boat.order_by_sql().starts_with("max_boat DESC NULLS LAST, avg_party"));
	}

	#[test]
	fn unknown_ordering_is_rejected() {
		assert_eq!(SortOrder::parse("cheapest"), None);
		assert_eq!(SortOrder::parse("BOAT"), Some(SortOrder::Boat));
	}
}
