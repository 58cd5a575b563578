use serde_json::json;

use gf_config::Postgres;
use gf_domain::geo::{DistanceUnit, GeoPoint};
use gf_storage::{
	db::Db,
	geography::{self, NewPlace},
};
use gf_testkit::TestDatabase;

async fn bootstrapped(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(test_db) = TestDatabase::from_env("schema_bootstrap_is_idempotent")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let db = bootstrapped(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name IN ('guides', 'trips', 'geo_relations')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn cached_points_are_unique_and_searchable_by_radius() {
	let Some(test_db) = TestDatabase::from_env("cached_points_are_unique_and_searchable_by_radius")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let db = bootstrapped(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let country = geography::get_or_create_country(&mut conn, "us", "United States")
		.await
		.expect("Failed to create country.");
	let state = geography::get_or_create_state(&mut conn, &country.abbr, "Louisiana", "LA")
		.await
		.expect("Failed to create state.");
	let raw = json!({ "types": ["locality"] });
	let new_orleans = NewPlace {
		name: "New Orleans",
		state_id: Some(state.state_id),
		country_abbr: Some(country.abbr.as_str()),
		point: GeoPoint::new(29.9511, -90.0715),
		geocode: &raw,
		is_verified: false,
	};
	let first = geography::insert_location(&mut conn, &new_orleans).await.expect("Insert failed.");
	let again = geography::insert_location(&mut conn, &NewPlace { name: "NOLA", ..new_orleans.clone() })
		.await
		.expect("Second insert failed.");

	assert_eq!(country.abbr, "US");
	assert_eq!(first.location_id, again.location_id);
	assert_eq!(again.city, "New Orleans");

	let baton_rouge = NewPlace {
		name: "Baton Rouge",
		point: GeoPoint::new(30.4515, -91.1871),
		..new_orleans.clone()
	};
	let far = geography::insert_location(&mut conn, &baton_rouge).await.expect("Insert failed.");
	let near = geography::nearby_location_ids(
		&mut conn,
		GeoPoint::new(29.95, -90.07),
		50.0,
		DistanceUnit::Miles,
	)
	.await
	.expect("Radius query failed.");

	assert_eq!(near, vec![first.location_id]);

	let wide = geography::nearby_location_ids(
		&mut conn,
		GeoPoint::new(29.95, -90.07),
		100.0,
		DistanceUnit::Miles,
	)
	.await
	.expect("Radius query failed.");

	assert_eq!(wide, vec![first.location_id, far.location_id]);

	drop(conn);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
