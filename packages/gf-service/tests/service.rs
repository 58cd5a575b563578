use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};
use sqlx::PgPool;
use time::macros::datetime;
use uuid::Uuid;

use gf_config::{Config, Gallery, Geocoder, Guides, Postgres, Search, Security, Service, Storage};
use gf_service::{
	BoxFuture, ContactRequest, ContactUpdate, CountryRequest, Error, GeocoderProvider,
	GuideService, PaymentRequest, Providers, RegisterRequest, Result, ReviewRequest, StateRequest,
	SearchResponse, TripRequest,
};
use gf_domain::location_query::{CandidateStrategy, PlaceKind};
use gf_storage::db::Db;
use gf_testkit::{TestDatabase, geocode};

struct SpyGeocoder {
	calls: Arc<AtomicUsize>,
	response: Value,
}
impl SpyGeocoder {
	fn new(response: Value) -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), response }
	}

	fn counter(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}
impl GeocoderProvider for SpyGeocoder {
	fn geocode<'a>(&'a self, _cfg: &'a Geocoder, _address: &'a str) -> BoxFuture<'a, Result<Value>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let response = self.response.clone();

		Box::pin(async move { Ok(response) })
	}
}

fn test_config(dsn: &str) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:8080".to_string(),
			admin_bind: "127.0.0.1:8081".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 } },
		geocoder: Geocoder {
			provider_id: "test".to_string(),
			api_base: "http://127.0.0.1:1".to_string(),
			path: "/maps/api/geocode/json".to_string(),
			api_key: None,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		},
		search: Search::default(),
		guides: Guides::default(),
		gallery: Gallery::default(),
		security: Security { bind_localhost_only: true, admin_auth_token: None },
	}
}

/// A service whose pool never connects. Only paths that fail before touching storage may run.
fn offline_service() -> (GuideService, Arc<AtomicUsize>) {
	let pool = gf_testkit::offline_pool().expect("Failed to build offline pool.");
	let spy = SpyGeocoder::new(geocode::venice_la());
	let calls = spy.counter();
	let service = GuideService::with_providers(
		test_config(gf_testkit::offline_dsn()),
		Db::from_pool(pool),
		Providers::new(Arc::new(spy)),
	);

	(service, calls)
}

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}

async fn online_service(db: &TestDatabase, geocoded: Value) -> (GuideService, Arc<AtomicUsize>) {
	let pool = db.connect(2).await.expect("Failed to connect to test database.");
	let storage = Db::from_pool(pool);

	storage.ensure_schema().await.expect("Failed to apply schema.");

	let spy = SpyGeocoder::new(geocoded);
	let calls = spy.counter();
	let service = GuideService::with_providers(
		test_config(db.dsn()),
		storage,
		Providers::new(Arc::new(spy)),
	);

	(service, calls)
}

/// A guide seeded straight into storage, bypassing the profile flow.
struct SeedGuide<'a> {
	first_name: &'a str,
	full_day_cents: i64,
	search_cents: i64,
	recommends: i32,
	experience: i32,
	/// `(min, max, preferred)`.
	party: (i32, i32, i32),
	boats_ft: &'a [i32],
	child_friendly: bool,
}
impl<'a> SeedGuide<'a> {
	fn new(first_name: &'a str) -> Self {
		Self {
			first_name,
			full_day_cents: 0,
			search_cents: 0,
			recommends: 0,
			experience: 0,
			party: (1, 10, 4),
			boats_ft: &[],
			child_friendly: true,
		}
	}
}

async fn seed_guide(
	pool: &PgPool,
	seed: &SeedGuide<'_>,
	location_id: Option<Uuid>,
	water_body_id: Option<Uuid>,
) -> Uuid {
	let customer_id = Uuid::new_v4();
	let guide_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO customers (customer_id, first_name, last_name, email, is_guide)
VALUES ($1, $2, 'Guide', $3, true)",
	)
	.bind(customer_id)
	.bind(seed.first_name)
	.bind(format!("{}@example.com", seed.first_name.to_lowercase()))
	.execute(pool)
	.await
	.expect("Failed to seed customer.");
	sqlx::query(
		"\
INSERT INTO guides (
	guide_id, customer_id, experience, full_day_price_cents, search_price_cents, num_recommends
)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(guide_id)
	.bind(customer_id)
	.bind(seed.experience)
	.bind(seed.full_day_cents)
	.bind(seed.search_cents)
	.bind(seed.recommends)
	.execute(pool)
	.await
	.expect("Failed to seed guide.");
	sqlx::query(
		"INSERT INTO guide_party (guide_id, min_party, max_party, avg_party) VALUES ($1, $2, $3, $4)",
	)
	.bind(guide_id)
	.bind(seed.party.0)
	.bind(seed.party.1)
	.bind(seed.party.2)
	.execute(pool)
	.await
	.expect("Failed to seed party.");
	sqlx::query("INSERT INTO guide_faq (guide_id, child_friendly) VALUES ($1, $2)")
		.bind(guide_id)
		.bind(seed.child_friendly)
		.execute(pool)
		.await
		.expect("Failed to seed FAQ.");

	for length_ft in seed.boats_ft {
		sqlx::query("INSERT INTO guide_boats (boat_id, guide_id, length_ft) VALUES ($1, $2, $3)")
			.bind(Uuid::new_v4())
			.bind(guide_id)
			.bind(*length_ft)
			.execute(pool)
			.await
			.expect("Failed to seed boat.");
	}
	if let Some(location_id) = location_id {
		sqlx::query("INSERT INTO guide_locations (guide_id, location_id) VALUES ($1, $2)")
			.bind(guide_id)
			.bind(location_id)
			.execute(pool)
			.await
			.expect("Failed to link location.");
	}
	if let Some(water_body_id) = water_body_id {
		sqlx::query("INSERT INTO guide_water_bodies (guide_id, water_body_id) VALUES ($1, $2)")
			.bind(guide_id)
			.bind(water_body_id)
			.execute(pool)
			.await
			.expect("Failed to link water body.");
	}

	guide_id
}

async fn seed_location(pool: &PgPool, city: &str, state_id: Uuid, lat: f64, lng: f64) -> Uuid {
	let location_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO locations (location_id, city, state_id, country_abbr, lat, lng, is_verified)
VALUES ($1, $2, $3, 'US', $4, $5, true)",
	)
	.bind(location_id)
	.bind(city)
	.bind(state_id)
	.bind(lat)
	.bind(lng)
	.execute(pool)
	.await
	.expect("Failed to seed location.");

	location_id
}

async fn seed_water_body(pool: &PgPool, name: &str, state_id: Uuid, lat: f64, lng: f64) -> Uuid {
	let water_body_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO water_bodies (water_body_id, name, state_id, country_abbr, lat, lng, is_verified)
VALUES ($1, $2, $3, 'US', $4, $5, true)",
	)
	.bind(water_body_id)
	.bind(name)
	.bind(state_id)
	.bind(lat)
	.bind(lng)
	.execute(pool)
	.await
	.expect("Failed to seed water body.");

	water_body_id
}

async fn seed_gulf_states(service: &GuideService) -> (Uuid, Uuid) {
	service
		.create_country(CountryRequest { abbr: "US".to_string(), name: "United States".to_string() })
		.await
		.expect("Failed to create country.");

	let mut ids = Vec::new();

	for (name, key) in [("Louisiana", "LA"), ("Texas", "TX")] {
		let state = service
			.create_state(StateRequest {
				country_abbr: "US".to_string(),
				name: name.to_string(),
				key: Some(key.to_string()),
			})
			.await
			.expect("Failed to create state.");

		ids.push(state.state_id);
	}

	(ids[0], ids[1])
}

async fn search(service: &GuideService, pairs: &[(&str, &str)]) -> SearchResponse {
	service.search(&query(pairs)).await.expect("Search must succeed.")
}

fn first_names(response: &SearchResponse) -> Vec<&str> {
	response.items.iter().map(|item| item.first_name.as_str()).collect()
}

fn strategy(response: &SearchResponse) -> Option<&CandidateStrategy> {
	response.resolved.as_ref().map(|resolved| &resolved.strategy)
}

#[tokio::test]
async fn blank_location_searches_nothing_without_geocoding() {
	let (service, calls) = offline_service();
	let response = service.search(&query(&[("loc", "   ")])).await.expect("Search must succeed.");

	assert!(response.items.is_empty());
	assert!(response.resolved.is_none());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_ordering_is_rejected_before_lookup() {
	let (service, calls) = offline_service();
	let err = service
		.search(&query(&[("loc", "Venice, LA"), ("ordering", "random")]))
		.await
		.expect_err("Expected an ordering error.");

	assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "ordering"));
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn registration_requires_a_valid_email() {
	let (service, _) = offline_service();
	let err = service
		.register(RegisterRequest {
			first_name: "Ana".to_string(),
			middle_name: None,
			last_name: "Reyes".to_string(),
			email: "ana.at.example.com".to_string(),
			allow_text: false,
		})
		.await
		.expect_err("Expected an e-mail error.");

	assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "email"));
}

#[tokio::test]
async fn payment_window_is_checked_before_storage() {
	let (service, _) = offline_service();
	let err = service
		.add_payment(
			uuid::Uuid::new_v4(),
			PaymentRequest {
				start_time: Some("15:00".to_string()),
				end_time: Some("09:00".to_string()),
				amount: "150.00".to_string(),
			},
		)
		.await
		.expect_err("Expected a window error.");

	assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "end_time"));
}

#[tokio::test]
async fn short_contact_message_is_rejected() {
	let (service, _) = offline_service();
	let err = service
		.contact(ContactRequest {
			name: "Ana".to_string(),
			email: "ana@example.com".to_string(),
			message: "hi".to_string(),
		})
		.await
		.expect_err("Expected a message error.");

	assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "message"));
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn registered_guide_is_found_priced_and_booked() {
	let Some(test_db) = TestDatabase::from_env("registered_guide_is_found_priced_and_booked")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let (service, calls) = online_service(&test_db, geocode::venice_la()).await;

	service
		.create_country(CountryRequest { abbr: "US".to_string(), name: "United States".to_string() })
		.await
		.expect("Failed to create country.");
	service
		.create_state(StateRequest {
			country_abbr: "US".to_string(),
			name: "Louisiana".to_string(),
			key: Some("LA".to_string()),
		})
		.await
		.expect("Failed to create state.");

	let registered = service
		.register(RegisterRequest {
			first_name: "Ana".to_string(),
			middle_name: None,
			last_name: "Reyes".to_string(),
			email: "Ana@Example.com".to_string(),
			allow_text: true,
		})
		.await
		.expect("Failed to register.");
	let customer_id = registered.customer.customer_id;

	assert_eq!(registered.customer.email, "ana@example.com");
	assert_eq!(registered.full_name, "Ana Reyes");

	let duplicate = service
		.register(RegisterRequest {
			first_name: "Ana".to_string(),
			middle_name: None,
			last_name: "Other".to_string(),
			email: "ana@example.com".to_string(),
			allow_text: false,
		})
		.await
		.expect_err("Expected a duplicate e-mail.");

	assert!(matches!(duplicate, Error::Conflict { .. }));

	let contact = service
		.update_contact(
			customer_id,
			ContactUpdate {
				city: Some("Venice".to_string()),
				state: Some("LA".to_string()),
				country: Some("US".to_string()),
				main_phone: Some("504-555-0100".to_string()),
				..Default::default()
			},
		)
		.await
		.expect("Failed to update contact.");
	let location_id = contact.location_id.expect("Contact must be placed at a location.");

	assert!(calls.load(Ordering::SeqCst) >= 1);

	let guide = service.become_guide(customer_id).await.expect("Failed to become a guide.");

	assert_eq!(guide.home_location_id, Some(location_id));

	let again = service.become_guide(customer_id).await.expect_err("Expected a second guide error.");

	assert!(matches!(again, Error::Conflict { .. }));

	let prices = service
		.add_payment(
			guide.guide_id,
			PaymentRequest { start_time: None, end_time: None, amount: "250".to_string() },
		)
		.await
		.expect("Failed to add payment.");

	assert_eq!(prices.full_day_price_cents, 25_000);

	let overlap = service
		.add_payment(
			guide.guide_id,
			PaymentRequest {
				start_time: Some("16:00".to_string()),
				end_time: Some("18:00".to_string()),
				amount: "50".to_string(),
			},
		)
		.await
		.expect_err("Expected an overlapping window.");

	assert!(matches!(overlap, Error::Conflict { .. }));

	let before = calls.load(Ordering::SeqCst);
	let found = service
		.search(&query(&[("loc", "Venice, LA"), ("date", "6/7/2030")]))
		.await
		.expect("Search must succeed.");

	assert_eq!(calls.load(Ordering::SeqCst), before);
	assert_eq!(found.items.len(), 1);
	assert_eq!(found.items[0].guide_id, guide.guide_id);
	assert_eq!(found.items[0].full_name, "Ana Reyes");

	let trip = service
		.book_trip(TripRequest {
			customer_id,
			guide_id: guide.guide_id,
			location_id,
			starts_at: datetime!(2030-06-07 08:00 UTC),
			ends_at: datetime!(2030-06-07 16:00 UTC),
			num_people: 2,
		})
		.await
		.expect("Failed to book trip.");
	let booked = service
		.search(&query(&[("loc", "Venice, LA"), ("date", "6/7/2030")]))
		.await
		.expect("Search must succeed.");

	assert!(booked.items.is_empty());

	service
		.review_trip(ReviewRequest {
			trip_id: trip.trip_id,
			customer_id,
			comment: "Limits of redfish before noon.".to_string(),
			recommend: true,
		})
		.await
		.expect("Failed to review trip.");

	let twice = service
		.review_trip(ReviewRequest {
			trip_id: trip.trip_id,
			customer_id,
			comment: "Again.".to_string(),
			recommend: true,
		})
		.await
		.expect_err("Expected a second review error.");

	assert!(matches!(twice, Error::Conflict { .. }));

	let reviews = service.guide_reviews(guide.guide_id).await.expect("Failed to load reviews.");

	assert_eq!(reviews.num_recommends, 1);
	assert_eq!(reviews.reviews.len(), 1);

	drop(service);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn seeded_guides_are_filtered_ordered_and_located() {
	let Some(test_db) = TestDatabase::from_env("seeded_guides_are_filtered_ordered_and_located")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let (service, calls) = online_service(&test_db, geocode::zero_results()).await;
	let pool = service.db.pool.clone();
	let (louisiana, texas) = seed_gulf_states(&service).await;
	let venice = seed_location(&pool, "Venice", louisiana, 29.2769, -89.3545).await;
	let rockport = seed_location(&pool, "Rockport", texas, 28.0206, -97.0544).await;
	let breton_sound = seed_water_body(&pool, "Breton Sound", louisiana, 29.5, -89.5).await;

	seed_guide(
		&pool,
		&SeedGuide {
			full_day_cents: 30_000,
			search_cents: 15_000,
			recommends: 5,
			experience: 3,
			party: (1, 6, 4),
			boats_ft: &[18, 24],
			child_friendly: false,
			..SeedGuide::new("Amy")
		},
		Some(venice),
		None,
	)
	.await;
	seed_guide(
		&pool,
		&SeedGuide {
			full_day_cents: 50_000,
			search_cents: 25_000,
			recommends: 1,
			experience: 20,
			party: (2, 10, 8),
			boats_ft: &[30],
			..SeedGuide::new("Bob")
		},
		Some(venice),
		None,
	)
	.await;
	seed_guide(
		&pool,
		&SeedGuide {
			full_day_cents: 60_000,
			search_cents: 30_000,
			recommends: 9,
			experience: 1,
			party: (1, 2, 2),
			..SeedGuide::new("Cat")
		},
		Some(venice),
		None,
	)
	.await;
	seed_guide(
		&pool,
		&SeedGuide {
			full_day_cents: 40_000,
			search_cents: 20_000,
			experience: 10,
			party: (1, 4, 3),
			..SeedGuide::new("Dan")
		},
		Some(venice),
		None,
	)
	.await;
	seed_guide(
		&pool,
		&SeedGuide { full_day_cents: 5_000, ..SeedGuide::new("Eve") },
		None,
		Some(breton_sound),
	)
	.await;
	seed_guide(
		&pool,
		&SeedGuide { full_day_cents: 10_000, ..SeedGuide::new("Fay") },
		Some(rockport),
		None,
	)
	.await;

	let state = search(&service, &[("loc", "Louisiana")]).await;

	assert_eq!(strategy(&state), Some(&CandidateStrategy::State { key: "LA".to_string() }));
	assert_eq!(first_names(&state), ["Amy", "Dan", "Bob", "Cat"]);

	let boats = search(&service, &[("loc", "Louisiana"), ("boatsize", "20")]).await;

	assert_eq!(first_names(&boats), ["Amy", "Dan", "Cat"]);

	let priced = search(
		&service,
		&[("loc", "Louisiana"), ("price", "on"), ("minprice", "150"), ("maxprice", "200")],
	)
	.await;

	assert_eq!(first_names(&priced), ["Amy", "Dan"]);

	let not_for_kids =
		search(&service, &[("loc", "Louisiana"), ("child_friendly", "False")]).await;

	assert_eq!(first_names(&not_for_kids), ["Amy"]);

	let for_kids = search(&service, &[("loc", "Louisiana"), ("child_friendly", "yes")]).await;

	assert_eq!(first_names(&for_kids), ["Dan", "Bob", "Cat"]);

	for (ordering, expected) in [
		("recommend", ["Cat", "Amy", "Bob", "Dan"]),
		("experience", ["Bob", "Dan", "Amy", "Cat"]),
		("alpha", ["Amy", "Bob", "Cat", "Dan"]),
		("party", ["Bob", "Amy", "Dan", "Cat"]),
		("boat", ["Bob", "Amy", "Dan", "Cat"]),
	] {
		let ordered = service
			.search(&query(&[("loc", "Louisiana"), ("ordering", ordering)]))
			.await
			.expect("Search must succeed.");

		assert_eq!(first_names(&ordered), expected, "ordering={ordering}");
	}

	let near_venice = search(&service, &[("loc", "Venice, LA")]).await;

	assert!(matches!(strategy(&near_venice), Some(CandidateStrategy::Radius { radius: 100, .. })));
	assert_eq!(first_names(&near_venice), ["Eve", "Amy", "Dan", "Bob", "Cat"]);

	let tight = search(&service, &[("loc", "Venice, LA"), ("radius", "5")]).await;

	assert_eq!(first_names(&tight), ["Amy", "Dan", "Bob", "Cat"]);

	let country = search(&service, &[("loc", "United States")]).await;

	assert_eq!(strategy(&country), Some(&CandidateStrategy::Country { abbr: "US".to_string() }));
	assert_eq!(first_names(&country), ["Fay", "Amy", "Dan", "Bob", "Cat"]);

	let three_terms = search(&service, &[("loc", "Rockport, TX, US")]).await;

	assert_eq!(three_terms.resolved.as_ref().map(|resolved| resolved.kind), Some(PlaceKind::City));
	assert_eq!(first_names(&three_terms), ["Fay"]);
	assert_eq!(calls.load(Ordering::SeqCst), 0);

	let lake = geocode::ok(vec![geocode::water_body(
		"Lake Borgne",
		("Louisiana", "LA"),
		("United States", "US"),
		30.03,
		-89.65,
	)]);
	let (water_service, water_calls) = online_service(&test_db, lake).await;
	let fallback = water_service
		.search(&query(&[("loc", "Lake Borgne")]))
		.await
		.expect("Search must succeed.");
	let resolved = fallback.resolved.as_ref().expect("Lake must resolve.");

	assert_eq!(resolved.kind, PlaceKind::WaterBody);
	assert_eq!(resolved.source, gf_service::ResolvedFrom::Geocoder);
	assert_eq!(first_names(&fallback), ["Eve", "Amy", "Dan", "Bob", "Cat"]);
	assert_eq!(water_calls.load(Ordering::SeqCst), 2);

	let relations: Vec<(Uuid, bool)> = sqlx::query_as(
		"\
SELECT r.location_id, r.is_verified
FROM geo_relations r
JOIN water_bodies w ON w.water_body_id = r.water_body_id
WHERE w.name = 'Lake Borgne'",
	)
	.fetch_all(&pool)
	.await
	.expect("Failed to load relations.");

	assert_eq!(relations, vec![(venice, true)]);

	let cached = water_service
		.search(&query(&[("loc", "Lake Borgne")]))
		.await
		.expect("Search must succeed.");

	assert_eq!(
		cached.resolved.as_ref().map(|resolved| resolved.source),
		Some(gf_service::ResolvedFrom::Cache)
	);
	assert_eq!(water_calls.load(Ordering::SeqCst), 2);

	drop(water_service);
	drop(service);
	drop(pool);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn last_trip_is_the_one_ending_latest() {
	let Some(test_db) = TestDatabase::from_env("last_trip_is_the_one_ending_latest")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let (service, _) = online_service(&test_db, geocode::zero_results()).await;
	let pool = service.db.pool.clone();
	let (louisiana, _) = seed_gulf_states(&service).await;
	let venice = seed_location(&pool, "Venice", louisiana, 29.2769, -89.3545).await;
	let guide_id = seed_guide(&pool, &SeedGuide::new("Amy"), Some(venice), None).await;
	let customer_id = service
		.register(RegisterRequest {
			first_name: "Ana".to_string(),
			middle_name: None,
			last_name: "Reyes".to_string(),
			email: "ana@example.com".to_string(),
			allow_text: false,
		})
		.await
		.expect("Failed to register.")
		.customer
		.customer_id;
	let week_long = service
		.book_trip(TripRequest {
			customer_id,
			guide_id,
			location_id: venice,
			starts_at: datetime!(2030-06-01 06:00 UTC),
			ends_at: datetime!(2030-06-10 18:00 UTC),
			num_people: 1,
		})
		.await
		.expect("Failed to book the long trip.");

	service
		.book_trip(TripRequest {
			customer_id,
			guide_id,
			location_id: venice,
			starts_at: datetime!(2030-06-05 06:00 UTC),
			ends_at: datetime!(2030-06-05 14:00 UTC),
			num_people: 1,
		})
		.await
		.expect("Failed to book the day trip.");

	let view = service.customer_view(customer_id).await.expect("Failed to load the profile.");

	assert_eq!(view.profile.num_trips, 2);
	assert_eq!(view.profile.last_trip_id, Some(week_long.trip_id));

	drop(service);
	drop(pool);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
