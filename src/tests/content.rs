use uuid::Uuid;

use crate::database::Permission;
use crate::error::AuthError;
use crate::store::Store;

use super::{admin, harness, register, register_confirmed};

#[tokio::test]
async fn writing_needs_a_confirmed_account_and_the_write_bit() {
	let h = harness().await;

	let unconfirmed = register(&h, "new@example.com", "newcomer").await;
	let err = h.content.create_post(&unconfirmed, "hello".to_string()).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	let user = register_confirmed(&h, "reader@example.com", "reader").await;
	let post = h.content.create_post(&user, "hello".to_string()).await.unwrap();
	assert_eq!(post.author_id, user.id);

	let err = h.content.create_post(&user, "   ".to_string()).await.unwrap_err();
	assert!(matches!(err, AuthError::InvalidInput { field: "body", .. }));
}

#[tokio::test]
async fn commenting_needs_an_existing_post() {
	let h = harness().await;

	let user = register_confirmed(&h, "reader@example.com", "reader").await;
	let post = h.content.create_post(&user, "hello".to_string()).await.unwrap();

	let comment = h.content.create_comment(&user, post.id, "hi".to_string()).await.unwrap();
	assert_eq!(comment.post_id, post.id);

	let err = h
		.content
		.create_comment(&user, Uuid::now_v7(), "hi".to_string())
		.await
		.unwrap_err();
	assert!(matches!(err, AuthError::NotFound("post")));
}

#[tokio::test]
async fn comment_moderation_is_gated_on_the_moderate_bit() {
	let h = harness().await;

	let admin = admin(&h).await;
	let author = register_confirmed(&h, "author@example.com", "author").await;
	let plain = register_confirmed(&h, "plain@example.com", "plain").await;

	let post = h.content.create_post(&author, "hello".to_string()).await.unwrap();
	let comment = h.content.create_comment(&author, post.id, "spam".to_string()).await.unwrap();

	let err = h.content.set_comment_disabled(&plain, comment.id, true).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	let moderator_role = h.store.role_by_name("Moderator").await.unwrap().unwrap();
	let moderator = h.accounts.set_role(&admin, plain.id, moderator_role.id).await.unwrap();
	assert!(h.accounts.can(&moderator, Permission::Moderate).await.unwrap());

	let hidden = h.content.set_comment_disabled(&moderator, comment.id, true).await.unwrap();
	assert!(hidden.disabled);

	let restored = h.content.set_comment_disabled(&moderator, comment.id, false).await.unwrap();
	assert!(!restored.disabled);
}

#[tokio::test]
async fn posts_are_moderated_by_their_author_or_an_administrator() {
	let h = harness().await;

	let admin = admin(&h).await;
	let author = register_confirmed(&h, "author@example.com", "author").await;
	let other = register_confirmed(&h, "other@example.com", "other").await;

	let post = h.content.create_post(&author, "hello".to_string()).await.unwrap();

	let err = h.content.set_post_disabled(&other, post.id, true).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	let hidden = h.content.set_post_disabled(&author, post.id, true).await.unwrap();
	assert!(hidden.disabled);

	let restored = h.content.set_post_disabled(&admin, post.id, false).await.unwrap();
	assert!(!restored.disabled);

	let err = h.content.edit_post(&other, post.id, "defaced".to_string()).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	let edited = h.content.edit_post(&author, post.id, "hello again".to_string()).await.unwrap();
	assert_eq!(edited.body, "hello again");
}

#[tokio::test]
async fn deleting_a_post_takes_its_comments_along() {
	let h = harness().await;

	let author = register_confirmed(&h, "author@example.com", "author").await;
	let commenter = register_confirmed(&h, "commenter@example.com", "commenter").await;

	let post = h.content.create_post(&author, "hello".to_string()).await.unwrap();
	let comment = h.content.create_comment(&commenter, post.id, "hi".to_string()).await.unwrap();

	h.content.delete_post(&author, post.id).await.unwrap();

	assert!(h.store.post_by_id(post.id).await.unwrap().is_none());
	assert!(h.store.comment_by_id(comment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn comments_go_away_for_authors_moderators_and_administrators_only() {
	let h = harness().await;

	let admin = admin(&h).await;
	let author = register_confirmed(&h, "author@example.com", "author").await;
	let other = register_confirmed(&h, "other@example.com", "other").await;

	let post = h.content.create_post(&author, "hello".to_string()).await.unwrap();

	let own = h.content.create_comment(&other, post.id, "mine".to_string()).await.unwrap();
	h.content.delete_comment(&other, own.id).await.unwrap();

	let foreign = h.content.create_comment(&author, post.id, "not yours".to_string()).await.unwrap();
	let err = h.content.delete_comment(&other, foreign.id).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	h.content.delete_comment(&admin, foreign.id).await.unwrap();
	assert!(h.store.comment_by_id(foreign.id).await.unwrap().is_none());
}
