use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gf_domain::rules;
use gf_storage::{
	models::{CustomerReview, GuideRecommendation, GuideResponse},
	queries,
};

use crate::{Error, GuideService, Result};

const REVIEW_COLUMNS: &str =
	"review_id, trip_id, comment, recommend, is_responded, is_removed, submitted_on";
const RESPONSE_COLUMNS: &str = "response_id, review_id, comment, is_removed, submitted_on";
const RECOMMENDATION_COLUMNS: &str =
	"recommendation_id, customer_id, guide_id, recommend, comment, is_removed, submitted_on";

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
	pub trip_id: Uuid,
	pub customer_id: Uuid,
	pub comment: String,
	pub recommend: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRequest {
	pub review_id: Uuid,
	pub guide_id: Uuid,
	pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
	pub customer_id: Uuid,
	pub guide_id: Uuid,
	pub comment: String,
	pub recommend: bool,
}

/// Review kinds that can be taken down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
	Review,
	Response,
	Recommendation,
}
impl PostKind {
	fn table(self) -> (&'static str, &'static str) {
		match self {
			Self::Review => ("customer_reviews", "review_id"),
			Self::Response => ("guide_responses", "response_id"),
			Self::Recommendation => ("guide_recommendations", "recommendation_id"),
		}
	}
}

/// A visible customer review with the guide's visible answer, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewThread {
	pub review: CustomerReview,
	pub response: Option<GuideResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuideReviews {
	pub guide_id: Uuid,
	pub num_recommends: i32,
	pub reviews: Vec<ReviewThread>,
	pub recommendations: Vec<GuideRecommendation>,
}

impl GuideService {
	/// One review per trip, by the customer who took it. A recommending review counts toward
	/// the guide's recommendations.
	pub async fn review_trip(&self, req: ReviewRequest) -> Result<CustomerReview> {
		let comment = rules::required_text("comment", &req.comment, rules::REVIEW_COMMENT_MAX_CHARS)?;
		let mut tx = self.db.pool.begin().await?;
		let trip: Option<(Uuid, Uuid, bool)> = sqlx::query_as(
			"SELECT customer_id, guide_id, is_reviewed FROM trips WHERE trip_id = $1 FOR UPDATE",
		)
		.bind(req.trip_id)
		.fetch_optional(&mut *tx)
		.await?;
		let (customer_id, guide_id, is_reviewed) =
			trip.ok_or_else(|| Error::not_found(format!("trip {}", req.trip_id)))?;

		if customer_id != req.customer_id {
			return Err(rules::RuleViolation::new("customer_id", "Only the traveller may review a trip.").into());
		}
		if is_reviewed {
			return Err(Error::conflict("You have already reviewed this trip."));
		}

		sqlx::query("UPDATE trips SET is_reviewed = true WHERE trip_id = $1")
			.bind(req.trip_id)
			.execute(&mut *tx)
			.await?;

		let sql = format!(
			"\
INSERT INTO customer_reviews (review_id, trip_id, comment, recommend)
VALUES ($1, $2, $3, $4)
RETURNING {REVIEW_COLUMNS}"
		);
		let review = sqlx::query_as::<_, CustomerReview>(&sql)
			.bind(Uuid::new_v4())
			.bind(req.trip_id)
			.bind(comment.as_str())
			.bind(req.recommend)
			.fetch_one(&mut *tx)
			.await?;

		if req.recommend {
			bump_recommends(&mut tx, guide_id).await?;
		}

		tx.commit().await?;

		tracing::info!(review_id = %review.review_id, guide_id = %guide_id, "Recorded trip review.");

		Ok(review)
	}

	/// The reviewed guide answers a review once.
	pub async fn respond_to_review(&self, req: ResponseRequest) -> Result<GuideResponse> {
		let comment = rules::required_text("comment", &req.comment, rules::REVIEW_COMMENT_MAX_CHARS)?;
		let mut tx = self.db.pool.begin().await?;
		let review: Option<(Uuid, bool)> = sqlx::query_as(
			"\
SELECT t.guide_id, r.is_responded
FROM customer_reviews r
JOIN trips t ON t.trip_id = r.trip_id
WHERE r.review_id = $1
FOR UPDATE OF r",
		)
		.bind(req.review_id)
		.fetch_optional(&mut *tx)
		.await?;
		let (guide_id, is_responded) =
			review.ok_or_else(|| Error::not_found(format!("review {}", req.review_id)))?;

		if guide_id != req.guide_id {
			return Err(rules::RuleViolation::new("guide_id", "Only the reviewed guide may respond.").into());
		}
		if is_responded {
			return Err(Error::conflict("You have already answered this review."));
		}

		sqlx::query("UPDATE customer_reviews SET is_responded = true WHERE review_id = $1")
			.bind(req.review_id)
			.execute(&mut *tx)
			.await?;

		let sql = format!(
			"\
INSERT INTO guide_responses (response_id, review_id, comment)
VALUES ($1, $2, $3)
RETURNING {RESPONSE_COLUMNS}"
		);
		let response = sqlx::query_as::<_, GuideResponse>(&sql)
			.bind(Uuid::new_v4())
			.bind(req.review_id)
			.bind(comment.as_str())
			.fetch_one(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(response)
	}

	/// A free-standing recommendation. Guides cannot recommend themselves.
	pub async fn recommend_guide(&self, req: RecommendationRequest) -> Result<GuideRecommendation> {
		let comment = rules::required_text("comment", &req.comment, rules::REVIEW_COMMENT_MAX_CHARS)?;
		let mut tx = self.db.pool.begin().await?;

		queries::get_customer(&mut tx, req.customer_id).await?;

		let guide = queries::get_guide(&mut tx, req.guide_id).await?;

		if guide.customer_id == req.customer_id {
			return Err(rules::RuleViolation::new("guide_id", "You cannot recommend yourself.").into());
		}

		let sql = format!(
			"\
INSERT INTO guide_recommendations (recommendation_id, customer_id, guide_id, recommend, comment)
VALUES ($1, $2, $3, $4, $5)
RETURNING {RECOMMENDATION_COLUMNS}"
		);
		let recommendation = sqlx::query_as::<_, GuideRecommendation>(&sql)
			.bind(Uuid::new_v4())
			.bind(req.customer_id)
			.bind(req.guide_id)
			.bind(req.recommend)
			.bind(comment.as_str())
			.fetch_one(&mut *tx)
			.await?;

		if req.recommend {
			bump_recommends(&mut tx, req.guide_id).await?;
		}

		tx.commit().await?;

		Ok(recommendation)
	}

	/// Hides a post from every listing. The row and any counts it contributed stay.
	pub async fn remove_post(&self, kind: PostKind, id: Uuid) -> Result<()> {
		let (table, column) = kind.table();
		let sql = format!("UPDATE {table} SET is_removed = true WHERE {column} = $1");
		let updated = sqlx::query(&sql).bind(id).execute(&self.db.pool).await?;

		if updated.rows_affected() == 0 {
			return Err(Error::not_found(format!("{table} record {id}")));
		}

		tracing::info!(kind = ?kind, id = %id, "Removed post.");

		Ok(())
	}

	pub async fn guide_reviews(&self, guide_id: Uuid) -> Result<GuideReviews> {
		let mut conn = self.db.pool.acquire().await?;
		let guide = queries::get_guide(&mut conn, guide_id).await?;
		let reviews = sqlx::query_as::<_, CustomerReview>(
			"\
SELECT r.review_id, r.trip_id, r.comment, r.recommend, r.is_responded, r.is_removed, r.submitted_on
FROM customer_reviews r
JOIN trips t ON t.trip_id = r.trip_id
WHERE t.guide_id = $1 AND NOT r.is_removed
ORDER BY r.submitted_on, r.review_id",
		)
		.bind(guide_id)
		.fetch_all(&mut *conn)
		.await?;
		let review_ids: Vec<Uuid> = reviews.iter().map(|review| review.review_id).collect();
		let sql = format!(
			"\
SELECT {RESPONSE_COLUMNS}
FROM guide_responses
WHERE review_id = ANY($1) AND NOT is_removed"
		);
		let mut responses = sqlx::query_as::<_, GuideResponse>(&sql)
			.bind(&review_ids)
			.fetch_all(&mut *conn)
			.await?;
		let sql = format!(
			"\
SELECT {RECOMMENDATION_COLUMNS}
FROM guide_recommendations
WHERE guide_id = $1 AND NOT is_removed
ORDER BY submitted_on, recommendation_id"
		);
		let recommendations = sqlx::query_as::<_, GuideRecommendation>(&sql)
			.bind(guide_id)
			.fetch_all(&mut *conn)
			.await?;
		let reviews = reviews
			.into_iter()
			.map(|review| {
				let response = responses
					.iter()
					.position(|response| response.review_id == review.review_id)
					.map(|idx| responses.swap_remove(idx));

				ReviewThread { review, response }
			})
			.collect();

		Ok(GuideReviews {
			guide_id,
			num_recommends: guide.num_recommends,
			reviews,
			recommendations,
		})
	}
}

async fn bump_recommends(conn: &mut sqlx::PgConnection, guide_id: Uuid) -> Result<()> {
	sqlx::query("UPDATE guides SET num_recommends = num_recommends + 1 WHERE guide_id = $1")
		.bind(guide_id)
		.execute(&mut *conn)
		.await?;

	Ok(())
}
