use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{Comment, Follow, Permission, Post, Role, User};
use crate::error::{AuthError, Result};

use super::Store;

/// Postgres-backed store.
///
/// Expects the column-level contract of the core: `users` (email and
/// username unique), `roles` (name unique, permissions bigint, partial
/// unique index on `is_default` where true), `follows` (primary key on the
/// ordered pair), `posts` and `comments`. Migrations live with the
/// embedding application.
#[derive(Clone)]
pub struct PgStore {
	db: PgPool,
}

impl PgStore {
	pub fn new(db: PgPool) -> Self {
		Self { db }
	}

	pub async fn connect(uri: &str) -> Result<Self> {
		Ok(Self {
			db: PgPool::connect(uri).await?,
		})
	}
}

fn map_unique_violation(err: sqlx::Error) -> AuthError {
	if let sqlx::Error::Database(db_err) = &err {
		if db_err.is_unique_violation() {
			match db_err.constraint() {
				Some("users_email_key") => return AuthError::DuplicateEmail,
				Some("users_username_key") => return AuthError::DuplicateUsername,
				_ => {}
			}
		}
	}

	AuthError::Database(err)
}

#[async_trait]
impl Store for PgStore {
	async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
		Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
		Ok(sqlx::query_as("SELECT * FROM users WHERE email = $1")
			.bind(email)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
		Ok(sqlx::query_as("SELECT * FROM users WHERE username = $1")
			.bind(username)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn insert_user(&self, user: User) -> Result<User> {
		sqlx::query_as(
			r#"
			INSERT INTO users (
				id,
				email,
				username,
				password_hash,
				role_id,
				confirmed,
				disabled,
				name,
				location,
				bio,
				avatar_hash,
				last_seen,
				created_at
			) VALUES (
				$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
			) RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password_hash)
		.bind(user.role_id)
		.bind(user.confirmed)
		.bind(user.disabled)
		.bind(&user.name)
		.bind(&user.location)
		.bind(&user.bio)
		.bind(&user.avatar_hash)
		.bind(user.last_seen)
		.bind(user.created_at)
		.fetch_one(&self.db)
		.await
		.map_err(map_unique_violation)
	}

	async fn update_user(&self, user: &User) -> Result<()> {
		sqlx::query(
			r#"
			UPDATE users
			SET
				email = $2,
				username = $3,
				password_hash = $4,
				role_id = $5,
				confirmed = $6,
				disabled = $7,
				name = $8,
				location = $9,
				bio = $10,
				avatar_hash = $11,
				last_seen = $12
			WHERE id = $1
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password_hash)
		.bind(user.role_id)
		.bind(user.confirmed)
		.bind(user.disabled)
		.bind(&user.name)
		.bind(&user.location)
		.bind(&user.bio)
		.bind(&user.avatar_hash)
		.bind(user.last_seen)
		.execute(&self.db)
		.await
		.map_err(map_unique_violation)?;

		Ok(())
	}

	async fn delete_user(&self, id: Uuid) -> Result<()> {
		let mut tx = self.db.begin().await?;

		sqlx::query("DELETE FROM comments WHERE post_id IN (SELECT id FROM posts WHERE author_id = $1)")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		sqlx::query("DELETE FROM posts WHERE author_id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		sqlx::query("DELETE FROM comments WHERE author_id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		sqlx::query("DELETE FROM follows WHERE follower_id = $1 OR followed_id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *tx).await?;

		tx.commit().await?;

		Ok(())
	}

	async fn role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
		Ok(sqlx::query_as("SELECT * FROM roles WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
		Ok(sqlx::query_as("SELECT * FROM roles WHERE name = $1")
			.bind(name)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn default_role(&self) -> Result<Option<Role>> {
		Ok(sqlx::query_as("SELECT * FROM roles WHERE is_default").fetch_optional(&self.db).await?)
	}

	async fn upsert_role(&self, name: &str, permissions: Permission, is_default: bool) -> Result<Role> {
		let mut tx = self.db.begin().await?;

		if is_default {
			sqlx::query("UPDATE roles SET is_default = false WHERE is_default AND name <> $1")
				.bind(name)
				.execute(&mut *tx)
				.await?;
		}

		let role: Role = sqlx::query_as(
			r#"
			INSERT INTO roles (
				id,
				name,
				permissions,
				is_default,
				created_at
			) VALUES (
				$1, $2, $3, $4, NOW()
			)
			ON CONFLICT (name) DO UPDATE
			SET
				permissions = EXCLUDED.permissions,
				is_default = EXCLUDED.is_default
			RETURNING *
			"#,
		)
		.bind(Uuid::now_v7())
		.bind(name)
		.bind(permissions.bits())
		.bind(is_default)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(role)
	}

	async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO follows (
				follower_id,
				followed_id,
				created_at
			) VALUES (
				$1, $2, NOW()
			)
			ON CONFLICT (follower_id, followed_id) DO NOTHING
			"#,
		)
		.bind(follower_id)
		.bind(followed_id)
		.execute(&self.db)
		.await?;

		Ok(())
	}

	async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
			.bind(follower_id)
			.bind(followed_id)
			.execute(&self.db)
			.await?;

		Ok(())
	}

	async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
		let edge: Option<Follow> = sqlx::query_as("SELECT * FROM follows WHERE follower_id = $1 AND followed_id = $2")
			.bind(follower_id)
			.bind(followed_id)
			.fetch_optional(&self.db)
			.await?;

		Ok(edge.is_some())
	}

	async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		Ok(sqlx::query_as(
			r#"
			SELECT *
			FROM follows
			WHERE followed_id = $1 AND follower_id <> $1
			ORDER BY created_at DESC
			"#,
		)
		.bind(user_id)
		.fetch_all(&self.db)
		.await?)
	}

	async fn followed_by(&self, user_id: Uuid) -> Result<Vec<Follow>> {
		Ok(sqlx::query_as(
			r#"
			SELECT *
			FROM follows
			WHERE follower_id = $1 AND followed_id <> $1
			ORDER BY created_at DESC
			"#,
		)
		.bind(user_id)
		.fetch_all(&self.db)
		.await?)
	}

	async fn insert_post(&self, post: Post) -> Result<Post> {
		Ok(sqlx::query_as(
			r#"
			INSERT INTO posts (
				id,
				author_id,
				body,
				disabled,
				created_at
			) VALUES (
				$1, $2, $3, $4, $5
			) RETURNING *
			"#,
		)
		.bind(post.id)
		.bind(post.author_id)
		.bind(&post.body)
		.bind(post.disabled)
		.bind(post.created_at)
		.fetch_one(&self.db)
		.await?)
	}

	async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
		Ok(sqlx::query_as("SELECT * FROM posts WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn update_post(&self, post: &Post) -> Result<()> {
		sqlx::query("UPDATE posts SET body = $2, disabled = $3 WHERE id = $1")
			.bind(post.id)
			.bind(&post.body)
			.bind(post.disabled)
			.execute(&self.db)
			.await?;

		Ok(())
	}

	async fn delete_post(&self, id: Uuid) -> Result<()> {
		let mut tx = self.db.begin().await?;

		sqlx::query("DELETE FROM comments WHERE post_id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		sqlx::query("DELETE FROM posts WHERE id = $1").bind(id).execute(&mut *tx).await?;

		tx.commit().await?;

		Ok(())
	}

	async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
		Ok(sqlx::query_as("SELECT * FROM posts WHERE author_id = $1 ORDER BY created_at DESC")
			.bind(author_id)
			.fetch_all(&self.db)
			.await?)
	}

	async fn followed_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
		Ok(sqlx::query_as(
			r#"
			SELECT p.*
			FROM posts p
			JOIN follows f ON f.followed_id = p.author_id
			WHERE f.follower_id = $1
			ORDER BY p.created_at DESC
			"#,
		)
		.bind(user_id)
		.fetch_all(&self.db)
		.await?)
	}

	async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
		Ok(sqlx::query_as(
			r#"
			INSERT INTO comments (
				id,
				post_id,
				author_id,
				body,
				disabled,
				created_at
			) VALUES (
				$1, $2, $3, $4, $5, $6
			) RETURNING *
			"#,
		)
		.bind(comment.id)
		.bind(comment.post_id)
		.bind(comment.author_id)
		.bind(&comment.body)
		.bind(comment.disabled)
		.bind(comment.created_at)
		.fetch_one(&self.db)
		.await?)
	}

	async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
		Ok(sqlx::query_as("SELECT * FROM comments WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.db)
			.await?)
	}

	async fn update_comment(&self, comment: &Comment) -> Result<()> {
		sqlx::query("UPDATE comments SET body = $2, disabled = $3 WHERE id = $1")
			.bind(comment.id)
			.bind(&comment.body)
			.bind(comment.disabled)
			.execute(&self.db)
			.await?;

		Ok(())
	}

	async fn delete_comment(&self, id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM comments WHERE id = $1").bind(id).execute(&self.db).await?;

		Ok(())
	}

	async fn comments_on_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
		Ok(sqlx::query_as("SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at DESC")
			.bind(post_id)
			.fetch_all(&self.db)
			.await?)
	}
}
