use serde::Deserialize;
use uuid::Uuid;

use gf_domain::rules;
use gf_storage::models::ContactMessage;

use crate::{GuideService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
	pub name: String,
	pub email: String,
	pub message: String,
}

impl GuideService {
	/// Stores a contact-us message.
	pub async fn contact(&self, req: ContactRequest) -> Result<ContactMessage> {
		let (name, email) = rules::contact_message(&req.name, &req.email, &req.message)?;
		let message = sqlx::query_as::<_, ContactMessage>(
			"\
INSERT INTO contact_messages (message_id, name, email, message)
VALUES ($1, $2, $3, $4)
RETURNING message_id, name, email, message, created_at",
		)
		.bind(Uuid::new_v4())
		.bind(name.as_str())
		.bind(email.as_str())
		.bind(req.message.trim())
		.fetch_one(&self.db.pool)
		.await?;

		tracing::info!(message_id = %message.message_id, "Received contact message.");

		Ok(message)
	}
}
