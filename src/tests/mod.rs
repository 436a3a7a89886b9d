use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::Mac;
use jwt::SignWithKey;
use uuid::Uuid;

use crate::account::{AccountService, NewAccount};
use crate::config::{CoreConfig, TokenConfig};
use crate::content::ContentService;
use crate::database::User;
use crate::mailer::{Mailer, MailerError};
use crate::social::SocialService;
use crate::store::{MemoryStore, Store};

mod content;
mod social;

pub(crate) const ADMIN_EMAIL: &str = "admin@example.com";
pub(crate) const PASSWORD: &str = "Sup3r$ecret";
pub(crate) const TOKEN_SECRET: &str = "test-secret";
pub(crate) const TOKEN_ISSUER: &str = "quill-test";

#[derive(Debug, Clone)]
pub(crate) struct SentMail {
	pub to: String,
	pub subject: String,
	pub body: String,
}

/// Mailer double that records every message.
#[derive(Default)]
pub(crate) struct RecordingMailer {
	pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
		self.sent.lock().unwrap().push(SentMail {
			to: to.to_string(),
			subject: subject.to_string(),
			body: body.to_string(),
		});
		Ok(())
	}
}

pub(crate) struct Harness {
	pub accounts: AccountService,
	pub social: SocialService,
	pub content: ContentService,
	pub store: Arc<MemoryStore>,
	pub mailer: Arc<RecordingMailer>,
}

pub(crate) async fn harness() -> Harness {
	let config = CoreConfig {
		token: TokenConfig {
			secret: TOKEN_SECRET.to_string(),
			issuer: TOKEN_ISSUER.to_string(),
			ttl_seconds: 3600,
		},
		admin_email: ADMIN_EMAIL.to_string(),
		..Default::default()
	};

	let store = Arc::new(MemoryStore::default());
	let mailer = Arc::new(RecordingMailer::default());
	let accounts = AccountService::bootstrap(store.clone(), mailer.clone(), &config).await.unwrap();

	Harness {
		accounts,
		social: SocialService::new(store.clone()),
		content: ContentService::new(store.clone()),
		store,
		mailer,
	}
}

pub(crate) async fn register(h: &Harness, email: &str, username: &str) -> User {
	h.accounts
		.register(NewAccount {
			email: email.to_string(),
			username: username.to_string(),
			password: PASSWORD.to_string(),
		})
		.await
		.unwrap()
}

/// Registers and confirms a user through the real token flow.
pub(crate) async fn register_confirmed(h: &Harness, email: &str, username: &str) -> User {
	let user = register(h, email, username).await;
	let token = h.accounts.generate_confirmation_token(&user).unwrap();
	h.accounts.confirm(&user, &token).await.unwrap();
	h.store.user_by_id(user.id).await.unwrap().unwrap()
}

/// Registers and confirms the configured administrator account.
pub(crate) async fn admin(h: &Harness) -> User {
	register_confirmed(h, ADMIN_EMAIL, "site_admin").await
}

/// Signs a token outside the service, for expiry and tamper scenarios.
pub(crate) fn forge_token(
	secret: &str,
	user_id: Uuid,
	intent: &str,
	issued_at: DateTime<Utc>,
	expires_at: DateTime<Utc>,
) -> String {
	let key = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();

	let mut claims = jwt::Claims::new(jwt::RegisteredClaims {
		issuer: Some(TOKEN_ISSUER.to_string()),
		subject: Some(user_id.to_string()),
		audience: None,
		expiration: Some(expires_at.timestamp() as u64),
		not_before: None,
		issued_at: Some(issued_at.timestamp() as u64),
		json_web_token_id: None,
	});
	claims.private.insert("intent".into(), intent.into());

	claims.sign_with_key(&key).unwrap()
}
