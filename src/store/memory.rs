use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::{Comment, Follow, Permission, Post, Role, User};
use crate::error::{AuthError, Result};

use super::Store;

/// In-memory store backing the test suite and local development.
///
/// Mirrors the unique-index semantics of [`super::PgStore`]: duplicate user
/// emails/usernames fail with the field-level error and the follow pair is
/// unique, so exactly one of two racing duplicate inserts wins.
#[derive(Default)]
pub struct MemoryStore {
	inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
	users: HashMap<Uuid, User>,
	roles: HashMap<Uuid, Role>,
	follows: HashMap<(Uuid, Uuid), Follow>,
	posts: HashMap<Uuid, Post>,
	comments: HashMap<Uuid, Comment>,
}

impl MemoryStore {
	fn read(&self) -> RwLockReadGuard<'_, Inner> {
		self.inner.read().expect("store lock poisoned")
	}

	fn write(&self) -> RwLockWriteGuard<'_, Inner> {
		self.inner.write().expect("store lock poisoned")
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
		Ok(self.read().users.get(&id).cloned())
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(self.read().users.values().find(|u| u.email == email).cloned())
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
		Ok(self.read().users.values().find(|u| u.username == username).cloned())
	}

	async fn insert_user(&self, user: User) -> Result<User> {
		let mut inner = self.write();

		if inner.users.values().any(|u| u.email == user.email) {
			return Err(AuthError::DuplicateEmail);
		}
		if inner.users.values().any(|u| u.username == user.username) {
			return Err(AuthError::DuplicateUsername);
		}

		inner.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn update_user(&self, user: &User) -> Result<()> {
		let mut inner = self.write();

		if inner.users.values().any(|u| u.id != user.id && u.email == user.email) {
			return Err(AuthError::DuplicateEmail);
		}
		if inner.users.values().any(|u| u.id != user.id && u.username == user.username) {
			return Err(AuthError::DuplicateUsername);
		}
		if !inner.users.contains_key(&user.id) {
			return Err(AuthError::UserNotFound);
		}

		inner.users.insert(user.id, user.clone());
		Ok(())
	}

	async fn delete_user(&self, id: Uuid) -> Result<()> {
		let mut inner = self.write();

		let owned_posts: Vec<Uuid> = inner
			.posts
			.values()
			.filter(|p| p.author_id == id)
			.map(|p| p.id)
			.collect();

		inner.comments.retain(|_, c| !owned_posts.contains(&c.post_id));
		inner.posts.retain(|_, p| p.author_id != id);
		inner.comments.retain(|_, c| c.author_id != id);
		inner.follows.retain(|_, f| f.follower_id != id && f.followed_id != id);
		inner.users.remove(&id);

		Ok(())
	}

	async fn role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
		Ok(self.read().roles.get(&id).cloned())
	}

	async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
		Ok(self.read().roles.values().find(|r| r.name == name).cloned())
	}

	async fn default_role(&self) -> Result<Option<Role>> {
		Ok(self.read().roles.values().find(|r| r.is_default).cloned())
	}

	async fn upsert_role(&self, name: &str, permissions: Permission, is_default: bool) -> Result<Role> {
		let mut inner = self.write();

		if is_default {
			for role in inner.roles.values_mut() {
				if role.name != name {
					role.is_default = false;
				}
			}
		}

		if let Some(existing) = inner.roles.values_mut().find(|r| r.name == name) {
			existing.permissions = permissions;
			existing.is_default = is_default;
			return Ok(existing.clone());
		}

		let role = Role {
			id: Uuid::now_v7(),
			name: name.to_string(),
			permissions,
			is_default,
			created_at: Utc::now(),
		};
		inner.roles.insert(role.id, role.clone());
		Ok(role)
	}

	async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
		self.write().follows.entry((follower_id, followed_id)).or_insert(Follow {
			follower_id,
			followed_id,
			created_at: Utc::now(),
		});
		Ok(())
	}

	async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
		self.write().follows.remove(&(follower_id, followed_id));
		Ok(())
	}

	async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
		Ok(self.read().follows.contains_key(&(follower_id, followed_id)))
	}

	async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		let mut edges: Vec<Follow> = self
			.read()
			.follows
			.values()
			.filter(|f| f.followed_id == user_id && !f.is_self_edge())
			.cloned()
			.collect();
		edges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(edges)
	}

	async fn followed_by(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		let mut edges: Vec<Follow> = self
			.read()
			.follows
			.values()
			.filter(|f| f.follower_id == user_id && !f.is_self_edge())
			.cloned()
			.collect();
		edges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(edges)
	}

	async fn insert_post(&self, post: Post) -> Result<Post> {
		self.write().posts.insert(post.id, post.clone());
		Ok(post)
	}

	async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
		Ok(self.read().posts.get(&id).cloned())
	}

	async fn update_post(&self, post: &Post) -> Result<()> {
		let mut inner = self.write();
		if !inner.posts.contains_key(&post.id) {
			return Err(AuthError::NotFound("post"));
		}
		inner.posts.insert(post.id, post.clone());
		Ok(())
	}

	async fn delete_post(&self, id: Uuid) -> Result<()> {
		let mut inner = self.write();
		inner.comments.retain(|_, c| c.post_id != id);
		inner.posts.remove(&id);
		Ok(())
	}

	async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
		let mut posts: Vec<Post> = self
			.read()
			.posts
			.values()
			.filter(|p| p.author_id == author_id)
			.cloned()
			.collect();
		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(posts)
	}

	async fn followed_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
		let inner = self.read();

		let followed: Vec<Uuid> = inner
			.follows
			.values()
			.filter(|f| f.follower_id == user_id)
			.map(|f| f.followed_id)
			.collect();

		let mut posts: Vec<Post> = inner
			.posts
			.values()
			.filter(|p| followed.contains(&p.author_id))
			.cloned()
			.collect();
		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(posts)
	}

	async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
		self.write().comments.insert(comment.id, comment.clone());
		Ok(comment)
	}

	async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
		Ok(self.read().comments.get(&id).cloned())
	}

	async fn update_comment(&self, comment: &Comment) -> Result<()> {
		let mut inner = self.write();
		if !inner.comments.contains_key(&comment.id) {
			return Err(AuthError::NotFound("comment"));
		}
		inner.comments.insert(comment.id, comment.clone());
		Ok(())
	}

	async fn delete_comment(&self, id: Uuid) -> Result<()> {
		self.write().comments.remove(&id);
		Ok(())
	}

	async fn comments_on_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
		let mut comments: Vec<Comment> = self
			.read()
			.comments
			.values()
			.filter(|c| c.post_id == post_id)
			.cloned()
			.collect();
		comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(comments)
	}
}
