pub mod admin;
pub mod catalog;
pub mod contact;
pub mod customers;
pub mod galleries;
pub mod geography;
pub mod guides;
pub mod pricing;
pub mod referrals;
pub mod resolve;
pub mod reviews;
pub mod search;
pub mod shadow;
pub mod suggest;
pub mod trips;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use admin::{RecordKind, VerifyRequest};
pub use catalog::{
	BoatRequest, BrandRequest, EngineRequest, FishRequest, FishingTypeRequest, ImageOwner,
	ImageRequest, ImageResponse,
};
pub use contact::ContactRequest;
pub use customers::{ContactUpdate, CustomerView, FavoriteRequest, RegisterRequest, RegisterResponse};
pub use error::{Error, Result};
pub use galleries::{
	CoverRequest, DeletedPhoto, GalleryRequest, GalleryView, PhotoRequest, PhotoResponse,
};
pub use geography::{
	CountryRequest, LocationRequest, NearbyRequest, NearbyResponse, RelationRequest, StateRequest,
	WaterBodyRequest,
};
use gf_config::Config;
use gf_domain::geocode::{self, GeocodeMatch};
use gf_providers::geocoder;
use gf_storage::db::Db;
pub use guides::{
	DetailsRequest, ExtrasRequest, FaqRequest, GuideView, LinkTarget, PartyRequest,
};
pub use pricing::{PaymentRequest, PriceView};
pub use referrals::{AcceptRequest, ReferralRequest};
pub use resolve::{ResolvedFrom, ResolvedLocation};
pub use reviews::{
	GuideReviews, PostKind, RecommendationRequest, ResponseRequest, ReviewRequest, ReviewThread,
};
pub use search::{SearchItem, SearchResponse};
pub use shadow::{ShadowGuideRequest, ShadowGuideView};
pub use suggest::SuggestResponse;
pub use trips::{TripPriceRequest, TripRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GeocoderProvider
where
	Self: Send + Sync,
{
	fn geocode<'a>(
		&'a self,
		cfg: &'a gf_config::Geocoder,
		address: &'a str,
	) -> BoxFuture<'a, Result<Value>>;
}

#[derive(Clone)]
pub struct Providers {
	pub geocoder: Arc<dyn GeocoderProvider>,
}
impl Providers {
	pub fn new(geocoder: Arc<dyn GeocoderProvider>) -> Self {
		Self { geocoder }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { geocoder: Arc::new(DefaultProviders) }
	}
}

pub struct GuideService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl GuideService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}

	/// Geocodes `address` and picks the first land (or water) result.
	pub(crate) async fn geocode_match(
		&self,
		address: &str,
		water: bool,
	) -> Result<Option<GeocodeMatch>> {
		let raw = self.providers.geocoder.geocode(&self.cfg.geocoder, address).await?;
		let response = geocode::decode_response(raw)
			.map_err(|err| Error::Provider { message: format!("Malformed geocoder response: {err}") })?;

		Ok(geocode::select_result(&response, water))
	}
}

struct DefaultProviders;

impl GeocoderProvider for DefaultProviders {
	fn geocode<'a>(
		&'a self,
		cfg: &'a gf_config::Geocoder,
		address: &'a str,
	) -> BoxFuture<'a, Result<Value>> {
		Box::pin(async move { Ok(geocoder::geocode(cfg, address).await?) })
	}
}

/// Trims optional text, mapping blank input to `None`.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
	value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_optional_text_is_none() {
		assert_eq!(trimmed(Some("  Redfish Co. ")), Some("Redfish Co.".to_string()));
		assert_eq!(trimmed(Some("   ")), None);
		assert_eq!(trimmed(None), None);
	}
}
