use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier for the post.
	pub id: Uuid,
	/// The user who wrote the post.
	pub author_id: Uuid,
	/// The body of the post.
	pub body: String,
	/// Whether the post has been hidden by its author or an administrator.
	pub disabled: bool,
	/// The time the post was created.
	pub created_at: DateTime<Utc>,
}
