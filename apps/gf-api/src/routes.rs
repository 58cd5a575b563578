use std::collections::HashMap;

use axum::{
	Json, Router,
	extract::{Path, Query, Request, State},
	http::{StatusCode, header},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gf_service::{
	AcceptRequest, BoatRequest, BrandRequest, ContactRequest, ContactUpdate, CountryRequest,
	CoverRequest, CustomerView, DeletedPhoto, DetailsRequest, EngineRequest, Error as ServiceError,
	ExtrasRequest, FaqRequest, FavoriteRequest, FishRequest, FishingTypeRequest, GalleryRequest,
	GalleryView, GuideReviews, GuideView, ImageRequest, ImageResponse, LinkTarget, LocationRequest,
	NearbyRequest, NearbyResponse, PartyRequest, PaymentRequest, PhotoRequest, PhotoResponse,
	PostKind, PriceView, RecommendationRequest, ReferralRequest, RegisterRequest, RegisterResponse,
	RelationRequest, ResponseRequest, ReviewRequest, SearchResponse, ShadowGuideRequest,
	ShadowGuideView, StateRequest, SuggestResponse, TripPriceRequest, TripRequest, VerifyRequest,
	WaterBodyRequest,
};
use gf_storage::models::{
	Boat, Brand, Contact, ContactMessage, Country, CustomerReview, Engine, ExtraDetails, Faq,
	Fish, FishingType, Gallery, GeoRelation, Guide, GuideRecommendation, GuideResponse, Location,
	Party, Referral, State as Region, Trip, WaterBody,
};

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", get(search))
		.route("/v1/suggest/fish", get(suggest_fish))
		.route("/v1/suggest/locations", get(suggest_locations))
		.route("/v1/suggest/methods", get(suggest_methods))
		.route("/v1/nearby", get(nearby))
		.route("/v1/relations", post(propose_relation))
		.route("/v1/catalog/fish", get(list_fish))
		.route("/v1/catalog/fishing-types", get(list_fishing_types))
		.route("/v1/catalog/brands", get(list_brands))
		.route("/v1/customers", post(register))
		.route("/v1/customers/{customer_id}", get(customer))
		.route("/v1/customers/{customer_id}/contact", put(update_contact))
		.route("/v1/customers/{customer_id}/guide", post(become_guide))
		.route("/v1/favorites", post(add_favorite).delete(remove_favorite))
		.route("/v1/guides/{guide_id}", get(guide))
		.route("/v1/guides/{guide_id}/details", put(update_details))
		.route("/v1/guides/{guide_id}/party", put(update_party))
		.route("/v1/guides/{guide_id}/faq", put(update_faq))
		.route("/v1/guides/{guide_id}/extras", put(update_extras))
		.route("/v1/guides/{guide_id}/links", post(link).delete(unlink))
		.route("/v1/guides/{guide_id}/prices", get(prices))
		.route("/v1/guides/{guide_id}/payments", post(add_payment))
		.route("/v1/guides/{guide_id}/payments/{payment_id}", delete(remove_payment))
		.route("/v1/guides/{guide_id}/boats", post(add_boat))
		.route("/v1/guides/{guide_id}/boats/{boat_id}", delete(remove_boat))
		.route("/v1/guides/{guide_id}/engines", post(add_engine))
		.route("/v1/guides/{guide_id}/engines/{engine_id}", delete(remove_engine))
		.route("/v1/guides/{guide_id}/reviews", get(guide_reviews))
		.route("/v1/guides/{guide_id}/referrals", get(list_referrals))
		.route("/v1/referrals", post(refer))
		.route("/v1/referrals/accept", post(accept_referral))
		.route("/v1/trips", post(book_trip))
		.route("/v1/trips/{trip_id}", get(trip))
		.route("/v1/trips/by-reference/{reference}", get(trip_by_reference))
		.route("/v1/trips/{trip_id}/price", put(set_trip_price))
		.route("/v1/trips/{trip_id}/paid", post(confirm_payment))
		.route("/v1/reviews", post(review_trip))
		.route("/v1/reviews/responses", post(respond_to_review))
		.route("/v1/recommendations", post(recommend_guide))
		.route("/v1/galleries", post(create_gallery))
		.route("/v1/galleries/{gallery_id}", get(gallery))
		.route("/v1/galleries/{gallery_id}/cover", put(set_cover))
		.route("/v1/galleries/{gallery_id}/photos", post(add_photo))
		.route("/v1/galleries/{gallery_id}/photos/{photo_id}", delete(delete_photo))
		.route("/v1/contact", post(contact))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/countries", post(create_country))
		.route("/v1/admin/states", post(create_state))
		.route("/v1/admin/locations", post(create_location))
		.route("/v1/admin/water-bodies", post(create_water_body))
		.route("/v1/admin/fish", post(create_fish))
		.route("/v1/admin/fishing-types", post(create_fishing_type))
		.route("/v1/admin/brands", post(create_brand))
		.route("/v1/admin/images", post(set_image))
		.route("/v1/admin/verify", post(verify))
		.route("/v1/admin/shadow-guides", post(create_shadow_guide).get(list_shadow_guides))
		.route("/v1/admin/guides/refresh-new", post(refresh_new_flags))
		.route("/v1/admin/posts/{kind}/{post_id}", delete(remove_post))
		.route_layer(middleware::from_fn_with_state(state.clone(), require_admin_token))
		.with_state(state)
}

#[derive(Debug, Deserialize)]
struct TermQuery {
	#[serde(default)]
	term: String,
}

#[derive(Debug, Deserialize)]
struct BrandQuery {
	#[serde(default)]
	kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshReport {
	updated: u64,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Query(query): Query<HashMap<String, String>>,
) -> ApiResult<SearchResponse> {
	Ok(Json(state.service.search(&query).await?))
}

async fn suggest_fish(
	State(state): State<AppState>,
	Query(query): Query<TermQuery>,
) -> ApiResult<SuggestResponse> {
	Ok(Json(state.service.suggest_fish(&query.term).await?))
}

async fn suggest_locations(
	State(state): State<AppState>,
	Query(query): Query<TermQuery>,
) -> ApiResult<SuggestResponse> {
	Ok(Json(state.service.suggest_locations(&query.term).await?))
}

async fn suggest_methods(
	State(state): State<AppState>,
	Query(query): Query<TermQuery>,
) -> ApiResult<SuggestResponse> {
	Ok(Json(state.service.suggest_methods(&query.term).await?))
}

async fn nearby(
	State(state): State<AppState>,
	Query(query): Query<NearbyRequest>,
) -> ApiResult<NearbyResponse> {
	Ok(Json(state.service.nearby(query).await?))
}

async fn propose_relation(
	State(state): State<AppState>,
	Json(payload): Json<RelationRequest>,
) -> ApiResult<GeoRelation> {
	Ok(Json(state.service.propose_relation(payload).await?))
}

async fn list_fish(State(state): State<AppState>) -> ApiResult<Vec<Fish>> {
	Ok(Json(state.service.list_fish().await?))
}

async fn list_fishing_types(State(state): State<AppState>) -> ApiResult<Vec<FishingType>> {
	Ok(Json(state.service.list_fishing_types().await?))
}

async fn list_brands(
	State(state): State<AppState>,
	Query(query): Query<BrandQuery>,
) -> ApiResult<Vec<Brand>> {
	Ok(Json(state.service.list_brands(query.kind.as_deref()).await?))
}

async fn register(
	State(state): State<AppState>,
	Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
	let response = state.service.register(payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn customer(
	State(state): State<AppState>,
	Path(customer_id): Path<Uuid>,
) -> ApiResult<CustomerView> {
	Ok(Json(state.service.customer_view(customer_id).await?))
}

async fn update_contact(
	State(state): State<AppState>,
	Path(customer_id): Path<Uuid>,
	Json(payload): Json<ContactUpdate>,
) -> ApiResult<Contact> {
	Ok(Json(state.service.update_contact(customer_id, payload).await?))
}

async fn become_guide(
	State(state): State<AppState>,
	Path(customer_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Guide>), ApiError> {
	let guide = state.service.become_guide(customer_id).await?;

	Ok((StatusCode::CREATED, Json(guide)))
}

async fn add_favorite(
	State(state): State<AppState>,
	Json(payload): Json<FavoriteRequest>,
) -> Result<StatusCode, ApiError> {
	state.service.add_favorite(payload).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn remove_favorite(
	State(state): State<AppState>,
	Json(payload): Json<FavoriteRequest>,
) -> Result<StatusCode, ApiError> {
	state.service.remove_favorite(payload).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn guide(State(state): State<AppState>, Path(guide_id): Path<Uuid>) -> ApiResult<GuideView> {
	Ok(Json(state.service.guide_view(guide_id).await?))
}

async fn update_details(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<DetailsRequest>,
) -> ApiResult<Guide> {
	Ok(Json(state.service.update_details(guide_id, payload).await?))
}

async fn update_party(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<PartyRequest>,
) -> ApiResult<Party> {
	Ok(Json(state.service.update_party(guide_id, payload).await?))
}

async fn update_faq(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<FaqRequest>,
) -> ApiResult<Faq> {
	Ok(Json(state.service.update_faq(guide_id, payload).await?))
}

async fn update_extras(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<ExtrasRequest>,
) -> ApiResult<ExtraDetails> {
	Ok(Json(state.service.update_extras(guide_id, payload).await?))
}

async fn link(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<LinkTarget>,
) -> Result<StatusCode, ApiError> {
	state.service.link(guide_id, payload).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn unlink(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<LinkTarget>,
) -> Result<StatusCode, ApiError> {
	state.service.unlink(guide_id, payload).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn prices(State(state): State<AppState>, Path(guide_id): Path<Uuid>) -> ApiResult<PriceView> {
	Ok(Json(state.service.prices(guide_id).await?))
}

async fn add_payment(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<PaymentRequest>,
) -> ApiResult<PriceView> {
	Ok(Json(state.service.add_payment(guide_id, payload).await?))
}

async fn remove_payment(
	State(state): State<AppState>,
	Path((guide_id, payment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<PriceView> {
	Ok(Json(state.service.remove_payment(guide_id, payment_id).await?))
}

async fn add_boat(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<BoatRequest>,
) -> ApiResult<Boat> {
	Ok(Json(state.service.add_boat(guide_id, payload).await?))
}

async fn remove_boat(
	State(state): State<AppState>,
	Path((guide_id, boat_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
	state.service.remove_boat(guide_id, boat_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn add_engine(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
	Json(payload): Json<EngineRequest>,
) -> ApiResult<Engine> {
	Ok(Json(state.service.add_engine(guide_id, payload).await?))
}

async fn remove_engine(
	State(state): State<AppState>,
	Path((guide_id, engine_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
	state.service.remove_engine(guide_id, engine_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn guide_reviews(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
) -> ApiResult<GuideReviews> {
	Ok(Json(state.service.guide_reviews(guide_id).await?))
}

async fn list_referrals(
	State(state): State<AppState>,
	Path(guide_id): Path<Uuid>,
) -> ApiResult<Vec<Referral>> {
	Ok(Json(state.service.list_referrals(guide_id).await?))
}

async fn refer(
	State(state): State<AppState>,
	Json(payload): Json<ReferralRequest>,
) -> ApiResult<Referral> {
	Ok(Json(state.service.refer(payload).await?))
}

async fn accept_referral(
	State(state): State<AppState>,
	Json(payload): Json<AcceptRequest>,
) -> ApiResult<Referral> {
	Ok(Json(state.service.accept_referral(payload).await?))
}

async fn book_trip(
	State(state): State<AppState>,
	Json(payload): Json<TripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
	let trip = state.service.book_trip(payload).await?;

	Ok((StatusCode::CREATED, Json(trip)))
}

async fn trip(State(state): State<AppState>, Path(trip_id): Path<Uuid>) -> ApiResult<Trip> {
	Ok(Json(state.service.trip(trip_id).await?))
}

async fn trip_by_reference(
	State(state): State<AppState>,
	Path(reference): Path<String>,
) -> ApiResult<Trip> {
	Ok(Json(state.service.trip_by_reference(&reference).await?))
}

async fn set_trip_price(
	State(state): State<AppState>,
	Path(trip_id): Path<Uuid>,
	Json(payload): Json<TripPriceRequest>,
) -> ApiResult<Trip> {
	Ok(Json(state.service.set_trip_price(trip_id, payload).await?))
}

async fn confirm_payment(
	State(state): State<AppState>,
	Path(trip_id): Path<Uuid>,
) -> ApiResult<Trip> {
	Ok(Json(state.service.confirm_payment(trip_id).await?))
}

async fn review_trip(
	State(state): State<AppState>,
	Json(payload): Json<ReviewRequest>,
) -> ApiResult<CustomerReview> {
	Ok(Json(state.service.review_trip(payload).await?))
}

async fn respond_to_review(
	State(state): State<AppState>,
	Json(payload): Json<ResponseRequest>,
) -> ApiResult<GuideResponse> {
	Ok(Json(state.service.respond_to_review(payload).await?))
}

async fn recommend_guide(
	State(state): State<AppState>,
	Json(payload): Json<RecommendationRequest>,
) -> ApiResult<GuideRecommendation> {
	Ok(Json(state.service.recommend_guide(payload).await?))
}

async fn create_gallery(
	State(state): State<AppState>,
	Json(payload): Json<GalleryRequest>,
) -> ApiResult<Gallery> {
	Ok(Json(state.service.create_gallery(payload).await?))
}

async fn gallery(
	State(state): State<AppState>,
	Path(gallery_id): Path<Uuid>,
) -> ApiResult<GalleryView> {
	Ok(Json(state.service.gallery_view(gallery_id).await?))
}

async fn set_cover(
	State(state): State<AppState>,
	Path(gallery_id): Path<Uuid>,
	Json(payload): Json<CoverRequest>,
) -> ApiResult<Gallery> {
	Ok(Json(state.service.set_cover(gallery_id, payload).await?))
}

async fn add_photo(
	State(state): State<AppState>,
	Path(gallery_id): Path<Uuid>,
	Json(payload): Json<PhotoRequest>,
) -> ApiResult<PhotoResponse> {
	Ok(Json(state.service.add_photo(gallery_id, payload).await?))
}

async fn delete_photo(
	State(state): State<AppState>,
	Path((gallery_id, photo_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<DeletedPhoto> {
	Ok(Json(state.service.delete_photo(gallery_id, photo_id).await?))
}

async fn contact(
	State(state): State<AppState>,
	Json(payload): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
	let message = state.service.contact(payload).await?;

	Ok((StatusCode::CREATED, Json(message)))
}

async fn create_country(
	State(state): State<AppState>,
	Json(payload): Json<CountryRequest>,
) -> ApiResult<Country> {
	Ok(Json(state.service.create_country(payload).await?))
}

async fn create_state(
	State(state): State<AppState>,
	Json(payload): Json<StateRequest>,
) -> ApiResult<Region> {
	Ok(Json(state.service.create_state(payload).await?))
}

async fn create_location(
	State(state): State<AppState>,
	Json(payload): Json<LocationRequest>,
) -> ApiResult<Location> {
	Ok(Json(state.service.create_location(payload).await?))
}

async fn create_water_body(
	State(state): State<AppState>,
	Json(payload): Json<WaterBodyRequest>,
) -> ApiResult<WaterBody> {
	Ok(Json(state.service.create_water_body(payload).await?))
}

async fn create_fish(
	State(state): State<AppState>,
	Json(payload): Json<FishRequest>,
) -> ApiResult<Fish> {
	Ok(Json(state.service.create_fish(payload).await?))
}

async fn create_fishing_type(
	State(state): State<AppState>,
	Json(payload): Json<FishingTypeRequest>,
) -> ApiResult<FishingType> {
	Ok(Json(state.service.create_fishing_type(payload).await?))
}

async fn create_brand(
	State(state): State<AppState>,
	Json(payload): Json<BrandRequest>,
) -> ApiResult<Brand> {
	Ok(Json(state.service.create_brand(payload).await?))
}

async fn set_image(
	State(state): State<AppState>,
	Json(payload): Json<ImageRequest>,
) -> ApiResult<ImageResponse> {
	Ok(Json(state.service.set_image(payload).await?))
}

async fn verify(
	State(state): State<AppState>,
	Json(payload): Json<VerifyRequest>,
) -> Result<StatusCode, ApiError> {
	state.service.verify(payload).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn create_shadow_guide(
	State(state): State<AppState>,
	Json(payload): Json<ShadowGuideRequest>,
) -> ApiResult<ShadowGuideView> {
	Ok(Json(state.service.create_shadow_guide(payload).await?))
}

async fn list_shadow_guides(State(state): State<AppState>) -> ApiResult<Vec<ShadowGuideView>> {
	Ok(Json(state.service.list_shadow_guides().await?))
}

async fn refresh_new_flags(State(state): State<AppState>) -> ApiResult<RefreshReport> {
	let updated = state.service.refresh_new_flags().await?;

	Ok(Json(RefreshReport { updated }))
}

async fn remove_post(
	State(state): State<AppState>,
	Path((kind, post_id)): Path<(PostKind, Uuid)>,
) -> Result<StatusCode, ApiError> {
	state.service.remove_post(kind, post_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

/// Admin requests must carry `Authorization: Bearer <token>` when a token is configured.
async fn require_admin_token(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Result<Response, ApiError> {
	if let Some(expected) = state.admin_token() {
		let provided = request
			.headers()
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "));

		if provided != Some(expected) {
			return Err(json_error(
				StatusCode::UNAUTHORIZED,
				"UNAUTHORIZED",
				"A valid admin token is required.",
				None,
			));
		}
	}

	Ok(next.run(request).await)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			ServiceError::InvalidField { field, message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_FIELD", message, Some(vec![field])),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Geocoder request failed.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", "Geocoder request failed.", None)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
					None,
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
