use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::account::{ensure_active, permissions_of, require};
use crate::database::{Comment, Permission, Post, User};
use crate::error::{AuthError, Result};
use crate::store::Store;

/// Post and comment operations, including the moderation surface.
///
/// Pagination and rendering belong to the route layer; this service owns
/// the permission gates and the writes.
#[derive(Clone)]
pub struct ContentService {
	store: Arc<dyn Store>,
}

impl ContentService {
	pub fn new(store: Arc<dyn Store>) -> Self {
		Self { store }
	}

	pub async fn create_post(&self, author: &User, body: String) -> Result<Post> {
		ensure_active(author)?;
		require(self.store.as_ref(), author, Permission::Write).await?;

		if body.trim().is_empty() {
			return Err(AuthError::InvalidInput {
				field: "body",
				message: "Post body cannot be empty",
			});
		}

		self.store
			.insert_post(Post {
				id: Uuid::now_v7(),
				author_id: author.id,
				body,
				disabled: false,
				created_at: Utc::now(),
			})
			.await
	}

	pub async fn edit_post(&self, actor: &User, post_id: Uuid, body: String) -> Result<Post> {
		ensure_active(actor)?;

		let mut post = self.store.post_by_id(post_id).await?.ok_or(AuthError::NotFound("post"))?;
		self.ensure_author_or_admin(actor, post.author_id).await?;

		if body.trim().is_empty() {
			return Err(AuthError::InvalidInput {
				field: "body",
				message: "Post body cannot be empty",
			});
		}

		post.body = body;
		self.store.update_post(&post).await?;

		Ok(post)
	}

	pub async fn create_comment(&self, author: &User, post_id: Uuid, body: String) -> Result<Comment> {
		ensure_active(author)?;
		require(self.store.as_ref(), author, Permission::Comment).await?;

		self.store.post_by_id(post_id).await?.ok_or(AuthError::NotFound("post"))?;

		if body.trim().is_empty() {
			return Err(AuthError::InvalidInput {
				field: "body",
				message: "Comment body cannot be empty",
			});
		}

		self.store
			.insert_comment(Comment {
				id: Uuid::now_v7(),
				post_id,
				author_id: author.id,
				body,
				disabled: false,
				created_at: Utc::now(),
			})
			.await
	}

	/// Hides or restores a post. Allowed for the author or an
	/// administrator.
	pub async fn set_post_disabled(&self, actor: &User, post_id: Uuid, disabled: bool) -> Result<Post> {
		ensure_active(actor)?;

		let mut post = self.store.post_by_id(post_id).await?.ok_or(AuthError::NotFound("post"))?;
		self.ensure_author_or_admin(actor, post.author_id).await?;

		post.disabled = disabled;
		self.store.update_post(&post).await?;

		Ok(post)
	}

	/// Hides or restores a comment. Requires the moderation permission.
	pub async fn set_comment_disabled(&self, actor: &User, comment_id: Uuid, disabled: bool) -> Result<Comment> {
		ensure_active(actor)?;
		require(self.store.as_ref(), actor, Permission::Moderate).await?;

		let mut comment = self
			.store
			.comment_by_id(comment_id)
			.await?
			.ok_or(AuthError::NotFound("comment"))?;
		comment.disabled = disabled;
		self.store.update_comment(&comment).await?;

		Ok(comment)
	}

	/// Deletes a post and its comments. Allowed for the author or an
	/// administrator.
	pub async fn delete_post(&self, actor: &User, post_id: Uuid) -> Result<()> {
		ensure_active(actor)?;

		let post = self.store.post_by_id(post_id).await?.ok_or(AuthError::NotFound("post"))?;
		self.ensure_author_or_admin(actor, post.author_id).await?;

		self.store.delete_post(post.id).await
	}

	/// Deletes a comment. Allowed for the author, a moderator or an
	/// administrator.
	pub async fn delete_comment(&self, actor: &User, comment_id: Uuid) -> Result<()> {
		ensure_active(actor)?;

		let comment = self
			.store
			.comment_by_id(comment_id)
			.await?
			.ok_or(AuthError::NotFound("comment"))?;

		if comment.author_id != actor.id {
			let permissions = permissions_of(self.store.as_ref(), actor).await?;
			if !permissions.has_permission(Permission::Moderate) && !permissions.has_permission(Permission::Admin) {
				return Err(AuthError::PermissionDenied);
			}
		}

		self.store.delete_comment(comment.id).await
	}

	pub async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
		self.store.posts_by_author(author_id).await
	}

	pub async fn comments_on_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
		self.store.comments_on_post(post_id).await
	}

	async fn ensure_author_or_admin(&self, actor: &User, author_id: Uuid) -> Result<()> {
		if actor.id == author_id {
			return Ok(());
		}

		require(self.store.as_ref(), actor, Permission::Admin).await
	}
}
