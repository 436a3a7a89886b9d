use uuid::Uuid;

use crate::database::User;
use crate::error::AuthError;
use crate::store::Store;

use super::{harness, register, register_confirmed, PASSWORD};

#[tokio::test]
async fn the_self_follow_edge_exists_but_stays_hidden() {
	let h = harness().await;

	let user = register(&h, "reader@example.com", "reader").await;

	assert!(h.social.is_following(user.id, user.id).await.unwrap());
	assert!(h.social.followers_of(user.id).await.unwrap().is_empty());
	assert!(h.social.followed_by(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_and_unfollow_round_trip() {
	let h = harness().await;

	let a = register_confirmed(&h, "a@example.com", "user_a").await;
	let b = register_confirmed(&h, "b@example.com", "user_b").await;

	assert!(!h.social.is_following(a.id, b.id).await.unwrap());

	h.social.follow(&a, b.id).await.unwrap();
	assert!(h.social.is_following(a.id, b.id).await.unwrap());
	assert!(!h.social.is_following(b.id, a.id).await.unwrap());

	// Redundant calls are no-ops.
	h.social.follow(&a, b.id).await.unwrap();
	assert_eq!(h.social.followed_by(a.id).await.unwrap().len(), 1);

	let followers = h.social.followers_of(b.id).await.unwrap();
	assert_eq!(followers.len(), 1);
	assert_eq!(followers[0].follower_id, a.id);

	h.social.unfollow(&a, b.id).await.unwrap();
	assert!(!h.social.is_following(a.id, b.id).await.unwrap());

	h.social.unfollow(&a, b.id).await.unwrap();
}

#[tokio::test]
async fn unfollowing_yourself_keeps_the_reflexive_edge() {
	let h = harness().await;

	let user = register_confirmed(&h, "reader@example.com", "reader").await;

	h.social.unfollow(&user, user.id).await.unwrap();

	assert!(h.social.is_following(user.id, user.id).await.unwrap());
}

#[tokio::test]
async fn following_requires_the_permission_and_a_confirmed_account() {
	let h = harness().await;

	let unconfirmed = register(&h, "new@example.com", "newcomer").await;
	let target = register_confirmed(&h, "target@example.com", "target").await;

	let err = h.social.follow(&unconfirmed, target.id).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));

	let roleless = h
		.store
		.insert_user(User {
			id: Uuid::now_v7(),
			email: "roleless@example.com".to_string(),
			username: "roleless".to_string(),
			password_hash: User::hash_password(PASSWORD),
			role_id: None,
			confirmed: true,
			..Default::default()
		})
		.await
		.unwrap();

	let err = h.social.follow(&roleless, target.id).await.unwrap_err();
	assert!(matches!(err, AuthError::PermissionDenied));
}

#[tokio::test]
async fn following_a_missing_user_fails() {
	let h = harness().await;

	let user = register_confirmed(&h, "reader@example.com", "reader").await;

	let err = h.social.follow(&user, Uuid::now_v7()).await.unwrap_err();
	assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn followed_posts_blend_own_and_followed_newest_first() {
	let h = harness().await;

	let a = register_confirmed(&h, "a@example.com", "user_a").await;
	let b = register_confirmed(&h, "b@example.com", "user_b").await;
	let c = register_confirmed(&h, "c@example.com", "user_c").await;

	h.social.follow(&a, b.id).await.unwrap();

	let first = h.content.create_post(&a, "a's first".to_string()).await.unwrap();
	let second = h.content.create_post(&b, "b's post".to_string()).await.unwrap();
	h.content.create_post(&c, "c's post".to_string()).await.unwrap();
	let third = h.content.create_post(&a, "a's second".to_string()).await.unwrap();

	let feed = h.social.followed_posts(a.id).await.unwrap();

	assert_eq!(
		feed.iter().map(|p| p.id).collect::<Vec<_>>(),
		vec![third.id, second.id, first.id]
	);
}
