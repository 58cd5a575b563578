pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_countries.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_countries.sql")),
				"tables/002_states.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_states.sql")),
				"tables/003_locations.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_locations.sql")),
				"tables/004_water_bodies.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_water_bodies.sql")),
				"tables/005_geo_relations.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_geo_relations.sql")),
				"tables/006_customers.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_customers.sql")),
				"tables/007_contacts.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_contacts.sql")),
				"tables/008_customer_profiles.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_customer_profiles.sql")),
				"tables/009_galleries.sql" =>
					out.push_str(include_str!("../../../sql/tables/009_galleries.sql")),
				"tables/010_photos.sql" =>
					out.push_str(include_str!("../../../sql/tables/010_photos.sql")),
				"tables/011_catalog.sql" =>
					out.push_str(include_str!("../../../sql/tables/011_catalog.sql")),
				"tables/012_guides.sql" =>
					out.push_str(include_str!("../../../sql/tables/012_guides.sql")),
				"tables/013_guide_links.sql" =>
					out.push_str(include_str!("../../../sql/tables/013_guide_links.sql")),
				"tables/014_guide_equipment.sql" =>
					out.push_str(include_str!("../../../sql/tables/014_guide_equipment.sql")),
				"tables/015_guide_payments.sql" =>
					out.push_str(include_str!("../../../sql/tables/015_guide_payments.sql")),
				"tables/016_guide_details.sql" =>
					out.push_str(include_str!("../../../sql/tables/016_guide_details.sql")),
				"tables/017_shadow_guides.sql" =>
					out.push_str(include_str!("../../../sql/tables/017_shadow_guides.sql")),
				"tables/018_referrals.sql" =>
					out.push_str(include_str!("../../../sql/tables/018_referrals.sql")),
				"tables/019_trips.sql" =>
					out.push_str(include_str!("../../../sql/tables/019_trips.sql")),
				"tables/020_reviews.sql" =>
					out.push_str(include_str!("../../../sql/tables/020_reviews.sql")),
				"tables/021_contact_messages.sql" =>
					out.push_str(include_str!("../../../sql/tables/021_contact_messages.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_include_is_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "), "Unexpanded include left in schema.");
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS contact_messages"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS guide_faq"));
	}
}
