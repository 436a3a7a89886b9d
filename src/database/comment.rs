use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier for the comment.
	pub id: Uuid,
	/// The post the comment was left on.
	pub post_id: Uuid,
	/// The user who wrote the comment.
	pub author_id: Uuid,
	/// The body of the comment.
	pub body: String,
	/// Whether the comment has been hidden by a moderator.
	pub disabled: bool,
	/// The time the comment was created.
	pub created_at: DateTime<Utc>,
}
