pub mod catalog;
pub mod geo;
pub mod geocode;
pub mod location_query;
pub mod media;
pub mod naming;
pub mod ordering;
pub mod pricing;
pub mod rules;
pub mod search_params;
