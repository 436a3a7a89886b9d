use std::sync::Arc;

use uuid::Uuid;

use crate::account::{ensure_active, require};
use crate::database::{Follow, Permission, Post, User};
use crate::error::{AuthError, Result};
use crate::store::Store;

/// Follower graph operations.
///
/// Redundant calls are tolerated: following an already-followed user or
/// unfollowing a stranger is a no-op, so callers can flash a message
/// instead of handling an error.
#[derive(Clone)]
pub struct SocialService {
	store: Arc<dyn Store>,
}

impl SocialService {
	pub fn new(store: Arc<dyn Store>) -> Self {
		Self { store }
	}

	pub async fn follow(&self, follower: &User, followed_id: Uuid) -> Result<()> {
		ensure_active(follower)?;
		require(self.store.as_ref(), follower, Permission::Follow).await?;

		self.store.user_by_id(followed_id).await?.ok_or(AuthError::UserNotFound)?;
		self.store.insert_follow(follower.id, followed_id).await
	}

	pub async fn unfollow(&self, follower: &User, followed_id: Uuid) -> Result<()> {
		ensure_active(follower)?;
		require(self.store.as_ref(), follower, Permission::Follow).await?;

		// The reflexive edge only goes away with the account.
		if follower.id == followed_id {
			return Ok(());
		}

		self.store.delete_follow(follower.id, followed_id).await
	}

	pub async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
		self.store.is_following(follower_id, followed_id).await
	}

	/// Everyone following the user, newest edge first. The reflexive self
	/// edge is hidden.
	pub async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		self.store.followers_of(user_id).await
	}

	/// Everyone the user follows, newest edge first. The reflexive self
	/// edge is hidden.
	pub async fn followed_by(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		self.store.followed_by(user_id).await
	}

	/// Posts by the user and everyone they follow, newest first. The user's
	/// own posts come along through the reflexive edge.
	pub async fn followed_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
		self.store.followed_posts(user_id).await
	}
}
