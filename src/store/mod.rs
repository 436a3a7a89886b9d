use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{Comment, Follow, Permission, Post, Role, User};
use crate::error::Result;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence port for the account core.
///
/// Implementations must enforce the unique keys (user email, user username,
/// role name, follow pair) at write time: under concurrent duplicate inserts
/// exactly one writer wins and the loser sees the field-level duplicate
/// error.
#[async_trait]
pub trait Store: Send + Sync {
	async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
	async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
	async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
	async fn insert_user(&self, user: User) -> Result<User>;
	async fn update_user(&self, user: &User) -> Result<()>;
	/// Removes the user together with their posts, the comments on those
	/// posts, their own comments and every follow edge touching them.
	async fn delete_user(&self, id: Uuid) -> Result<()>;

	async fn role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
	async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;
	async fn default_role(&self) -> Result<Option<Role>>;
	/// Creates or updates a role by name, keeping its id stable. Setting the
	/// default flag clears it from every other role.
	async fn upsert_role(&self, name: &str, permissions: Permission, is_default: bool) -> Result<Role>;

	/// Creates the edge. Inserting an existing edge is a no-op.
	async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()>;
	/// Deletes the edge. Deleting a missing edge is a no-op.
	async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<()>;
	async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool>;
	/// Edges pointing at the user, newest first. The reflexive self edge is
	/// not listed.
	async fn followers_of(&self, user_id: Uuid) -> Result<Vec<Follow>>;
	/// Edges leaving the user, newest first. The reflexive self edge is not
	/// listed.
	async fn followed_by(&self, user_id: Uuid) -> Result<Vec<Follow>>;

	async fn insert_post(&self, post: Post) -> Result<Post>;
	async fn post_by_id(&self, id: Uuid) -> Result<Option<Post>>;
	async fn update_post(&self, post: &Post) -> Result<()>;
	/// Removes the post and its comments.
	async fn delete_post(&self, id: Uuid) -> Result<()>;
	async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;
	/// Posts written by the user and everyone they follow, newest first.
	/// Leans on the reflexive self edge to fold the user's own posts in.
	async fn followed_posts(&self, user_id: Uuid) -> Result<Vec<Post>>;

	async fn insert_comment(&self, comment: Comment) -> Result<Comment>;
	async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
	async fn update_comment(&self, comment: &Comment) -> Result<()>;
	async fn delete_comment(&self, id: Uuid) -> Result<()>;
	async fn comments_on_post(&self, post_id: Uuid) -> Result<Vec<Comment>>;
}
