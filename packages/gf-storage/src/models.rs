use serde::Serialize;
use serde_json::Value;
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Country {
	pub abbr: String,
	pub name: String,
	pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct State {
	pub state_id: Uuid,
	pub country_abbr: String,
	pub key: String,
	pub name: String,
	pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Location {
	pub location_id: Uuid,
	pub city: String,
	pub state_id: Option<Uuid>,
	pub country_abbr: Option<String>,
	pub lat: f64,
	pub lng: f64,
	#[serde(skip)]
	pub geocode: Value,
	pub is_verified: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WaterBody {
	pub water_body_id: Uuid,
	pub name: String,
	pub state_id: Option<Uuid>,
	pub country_abbr: Option<String>,
	pub lat: f64,
	pub lng: f64,
	#[serde(skip)]
	pub geocode: Value,
	pub is_verified: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GeoRelation {
	pub relation_id: Uuid,
	pub location_id: Uuid,
	pub water_body_id: Uuid,
	pub is_verified: bool,
	pub added_by: Option<Uuid>,
	#[serde(with = "time::serde::rfc3339")]
	pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
	pub customer_id: Uuid,
	pub first_name: String,
	pub middle_name: Option<String>,
	pub last_name: String,
	pub email: String,
	pub is_guide: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Contact {
	pub customer_id: Uuid,
	pub address_line_1: Option<String>,
	pub address_line_2: Option<String>,
	pub city: Option<String>,
	pub state_id: Option<Uuid>,
	pub country_abbr: Option<String>,
	pub postal_code: Option<String>,
	pub website: Option<String>,
	pub main_phone: Option<String>,
	pub alternate_phone: Option<String>,
	pub location_id: Option<Uuid>,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerProfile {
	pub customer_id: Uuid,
	pub allow_text: bool,
	pub num_trips: i32,
	pub last_trip_id: Option<Uuid>,
	pub joined_on: Date,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Gallery {
	pub gallery_id: Uuid,
	pub customer_id: Uuid,
	pub description: Option<String>,
	pub created_on: Date,
	pub num_photos: i32,
	pub max_photos: i32,
	pub cover_photo_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Photo {
	pub photo_id: Uuid,
	pub gallery_id: Uuid,
	pub title: String,
	pub summary: String,
	pub image_path: String,
	pub thumb_path: String,
	pub width: i32,
	pub height: i32,
	pub thumb_width: i32,
	pub thumb_height: i32,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Fish {
	pub fish_id: Uuid,
	pub name: String,
	pub fish_type: String,
	pub water_type: String,
	pub alt_name_1: Option<String>,
	pub alt_name_2: Option<String>,
	pub alt_name_3: Option<String>,
	pub image_path: Option<String>,
	pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FishingType {
	pub fishing_type_id: Uuid,
	pub method: String,
	pub image_path: Option<String>,
	pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
	pub brand_id: Uuid,
	pub kind: String,
	pub name: String,
	pub image_path: Option<String>,
	pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Guide {
	pub guide_id: Uuid,
	pub customer_id: Uuid,
	pub company: Option<String>,
	pub experience: i32,
	pub blurb: Option<String>,
	pub profile: Option<String>,
	pub is_new: bool,
	pub full_day_price_cents: i64,
	pub search_price_cents: i64,
	pub num_recommends: i32,
	pub num_referrals: i32,
	pub home_location_id: Option<Uuid>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Boat {
	pub boat_id: Uuid,
	pub guide_id: Uuid,
	pub brand_id: Option<Uuid>,
	pub length_ft: i32,
	pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Engine {
	pub engine_id: Uuid,
	pub guide_id: Uuid,
	pub brand_id: Option<Uuid>,
	pub horsepower: i32,
	pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
	pub payment_id: Uuid,
	pub guide_id: Uuid,
	pub start_time: Time,
	pub end_time: Time,
	pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Party {
	pub guide_id: Uuid,
	pub min_party: i32,
	pub max_party: i32,
	pub avg_party: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Faq {
	pub guide_id: Uuid,
	pub child_friendly: bool,
	pub alcohol_allowed: bool,
	pub food_provided: bool,
	pub capture_release: bool,
	pub state_certified: bool,
	pub cg_certified: bool,
	pub handicap_friendly: bool,
	pub personal_equipment: bool,
	pub lost_tackle: bool,
	pub fillet_services: bool,
	pub taxidermy_services: bool,
	pub allow_international: bool,
	pub explanation: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExtraDetails {
	pub guide_id: Uuid,
	pub good_attitude: Option<bool>,
	pub life_jacket: Option<bool>,
	pub details: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShadowGuide {
	pub shadow_guide_id: Uuid,
	pub first_name: String,
	pub last_name: String,
	pub company: Option<String>,
	pub phone: String,
	pub email: String,
	pub source_url: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Referral {
	pub referral_id: Uuid,
	pub guide_id: Uuid,
	pub reference: String,
	pub first_name: String,
	pub last_name: String,
	pub email: String,
	pub created_on: Date,
	pub is_accepted: bool,
	pub accepted_on: Option<Date>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Trip {
	pub trip_id: Uuid,
	pub customer_id: Uuid,
	pub guide_id: Uuid,
	pub location_id: Uuid,
	#[serde(with = "time::serde::rfc3339")]
	pub starts_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub ends_at: OffsetDateTime,
	pub num_people: i32,
	pub price_cents: i64,
	pub is_paid: bool,
	pub is_reviewed: bool,
	pub reference: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerReview {
	pub review_id: Uuid,
	pub trip_id: Uuid,
	pub comment: String,
	pub recommend: bool,
	pub is_responded: bool,
	pub is_removed: bool,
	pub submitted_on: Date,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuideResponse {
	pub response_id: Uuid,
	pub review_id: Uuid,
	pub comment: String,
	pub is_removed: bool,
	pub submitted_on: Date,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuideRecommendation {
	pub recommendation_id: Uuid,
	pub customer_id: Uuid,
	pub guide_id: Uuid,
	pub recommend: bool,
	pub comment: String,
	pub is_removed: bool,
	pub submitted_on: Date,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactMessage {
	pub message_id: Uuid,
	pub name: String,
	pub email: String,
	pub message: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
