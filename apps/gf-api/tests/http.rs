use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use gf_api::{routes, state::AppState};
use gf_config::{Config, Gallery, Geocoder, Guides, Postgres, Search, Security, Service, Storage};
use gf_service::GuideService;
use gf_storage::db::Db;
use gf_testkit::TestDatabase;

const ADMIN_TOKEN: &str = "s3cret";

fn test_config(dsn: String, admin_auth_token: Option<String>) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 1 } },
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
		security: Security { bind_localhost_only: true, admin_auth_token },
	}
}

/// State over a pool that never connects; handlers under test must fail before storage.
fn offline_state() -> AppState {
	let pool = gf_testkit::offline_pool().expect("Failed to build offline pool.");
	let config = test_config(gf_testkit::offline_dsn().to_string(), Some(ADMIN_TOKEN.to_string()));

	AppState::from_service(GuideService::new(config, Db::from_pool(pool)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
	let response: Response = app.oneshot(request).await.expect("Failed to call router.");
	let status = response.status();
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if body.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&body).expect("Failed to parse response.")
	};

	(status, json)
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

#[tokio::test]
async fn health_ok() {
	let app = routes::router(offline_state());
	let (status, _) = send(
		app,
		Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn blank_search_returns_no_guides() {
	let app = routes::router(offline_state());
	let (status, json) = send(
		app,
		Request::builder()
			.uri("/v1/search?loc=&fish=redfish")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json["items"], serde_json::json!([]));
	assert_eq!(json["resolved"], Value::Null);
}

#[tokio::test]
async fn bad_search_parameter_names_the_field() {
	let app = routes::router(offline_state());
	let (status, json) = send(
		app,
		Request::builder()
			.uri("/v1/search?loc=Venice&boatsize=big")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_FIELD");
	assert_eq!(json["fields"][0], "boatsize");
}

#[tokio::test]
async fn rejects_malformed_email_on_register() {
	let app = routes::router(offline_state());
	let payload = serde_json::json!({
		"first_name": "Ana",
		"last_name": "Reyes",
		"email": "not-an-address"
	});
	let (status, json) = send(app, post_json("/v1/customers", &payload)).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["error_code"], "INVALID_FIELD");
	assert_eq!(json["fields"][0], "email");
}

#[tokio::test]
async fn admin_requires_bearer_token() {
	let payload = serde_json::json!({ "abbr": "USA", "name": "United States" });
	let (status, json) =
		send(routes::admin_router(offline_state()), post_json("/v1/admin/countries", &payload)).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(json["error_code"], "UNAUTHORIZED");

	let mut request = post_json("/v1/admin/countries", &payload);

	request
		.headers_mut()
		.insert("authorization", "Bearer wrong".parse().expect("Failed to build header."));

	let (status, _) = send(routes::admin_router(offline_state()), request).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let mut request = post_json("/v1/admin/countries", &payload);

	request.headers_mut().insert(
		"authorization",
		format!("Bearer {ADMIN_TOKEN}").parse().expect("Failed to build header."),
	);

	let (status, json) = send(routes::admin_router(offline_state()), request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json["fields"][0], "abbr");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GF_PG_DSN to run."]
async fn duplicate_registration_conflicts() {
	let Some(test_db) = TestDatabase::from_env("duplicate_registration_conflicts")
		.await
		.expect("Failed to create test database.")
	else {
		return;
	};
	let config = test_config(test_db.dsn().to_string(), None);
	let state = AppState::new(config).await.expect("Failed to initialize app state.");
	let payload = serde_json::json!({
		"first_name": "Ana",
		"last_name": "Reyes",
		"email": "ana@example.com",
		"allow_text": true
	});
	let (status, json) = send(routes::router(state.clone()), post_json("/v1/customers", &payload)).await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(json["full_name"], "Ana Reyes");
	assert_eq!(json["gallery"]["max_photos"], 10);

	let (status, json) = send(routes::router(state.clone()), post_json("/v1/customers", &payload)).await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(json["error_code"], "CONFLICT");

	let missing = format!("/v1/customers/{}", uuid::Uuid::new_v4());
	let (status, json) = send(
		routes::router(state),
		Request::builder().uri(missing).body(Body::empty()).expect("Failed to build request."),
	)
	.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(json["error_code"], "NOT_FOUND");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
