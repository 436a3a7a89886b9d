use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
/// A directed follow edge. Unique per ordered pair.
/// Every user carries a reflexive edge created at registration so that
/// "own + followed" content queries are a single join.
pub struct Follow {
	/// The user doing the following.
	pub follower_id: Uuid,
	/// The user being followed.
	pub followed_id: Uuid,
	/// The time the edge was created.
	pub created_at: DateTime<Utc>,
}

impl Follow {
	/// Whether this is the reflexive edge created at registration.
	pub fn is_self_edge(&self) -> bool {
		self.follower_id == self.followed_id
	}
}
