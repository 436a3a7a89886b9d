use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::database::{Permission, Role, User};
use crate::error::{AuthError, Result};
use crate::mailer::Mailer;
use crate::store::Store;
use crate::token::{TokenError, TokenIntent, TokenSigner};

/// A new account registration request.
#[derive(Debug, Clone)]
pub struct NewAccount {
	pub email: String,
	pub username: String,
	pub password: String,
}

/// The full editing surface an administrator gets over an account.
#[derive(Debug, Clone)]
pub struct AdminAccountUpdate {
	pub email: String,
	pub username: String,
	pub confirmed: bool,
	pub role_id: Option<Uuid>,
	pub name: Option<String>,
	pub location: Option<String>,
	pub bio: Option<String>,
}

/// The account state machine.
///
/// Owns every transition on a user row: registration, authentication, the
/// token-guarded confirmation / password reset / email change flows, role
/// and disabled-flag changes, and cascading account deletion. The acting
/// user is always passed explicitly; there is no implicit current user.
#[derive(Clone)]
pub struct AccountService {
	store: Arc<dyn Store>,
	mailer: Arc<dyn Mailer>,
	signer: TokenSigner,
	admin_email: String,
	roles: RoleRefs,
}

/// Stable references to the bootstrap roles, resolved by name exactly once
/// at seeding time.
#[derive(Debug, Clone, Copy)]
struct RoleRefs {
	default: Uuid,
	administrator: Uuid,
}

/// Resolves the user's permission mask. A user without a role (or with a
/// role that no longer exists) holds no permissions at all.
pub(crate) async fn permissions_of(store: &dyn Store, user: &User) -> Result<Permission> {
	let Some(role_id) = user.role_id else {
		return Ok(Permission::none());
	};

	Ok(store.role_by_id(role_id).await?.map(|r| r.permissions).unwrap_or_default())
}

pub(crate) async fn require(store: &dyn Store, user: &User, permission: Permission) -> Result<()> {
	if permissions_of(store, user).await?.has_permission(permission) {
		Ok(())
	} else {
		Err(AuthError::PermissionDenied)
	}
}

/// A disabled account may not perform any write action; an unconfirmed one
/// may only touch the confirmation/auth surface.
pub(crate) fn ensure_active(user: &User) -> Result<()> {
	if user.disabled {
		return Err(AuthError::AccountDisabled);
	}

	if !user.confirmed {
		return Err(AuthError::PermissionDenied);
	}

	Ok(())
}

impl AccountService {
	/// Seeds the built-in roles and resolves the default and administrator
	/// ids once. Idempotent: reruns keep role ids stable.
	pub async fn bootstrap(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: &CoreConfig) -> Result<Self> {
		for (name, permissions, is_default) in Role::presets() {
			store.upsert_role(name, permissions, is_default).await?;
		}

		let default = store.default_role().await?.ok_or(AuthError::NotFound("default role"))?;
		let administrator = store
			.role_by_name(Role::ADMINISTRATOR)
			.await?
			.ok_or(AuthError::NotFound("administrator role"))?;

		Ok(Self {
			store,
			mailer,
			signer: TokenSigner::new(&config.token),
			admin_email: config.admin_email.trim().to_lowercase(),
			roles: RoleRefs {
				default: default.id,
				administrator: administrator.id,
			},
		})
	}

	pub fn signer(&self) -> &TokenSigner {
		&self.signer
	}

	/// Registers a new account: unconfirmed, enabled, default role (or
	/// administrator for the configured admin address), reflexive follow
	/// edge, and a confirmation mail on its way.
	pub async fn register(&self, new: NewAccount) -> Result<User> {
		User::validate_email(&new.email).map_err(|message| AuthError::InvalidInput { field: "email", message })?;
		User::validate_username(&new.username).map_err(|message| AuthError::InvalidInput {
			field: "username",
			message,
		})?;
		User::validate_password(&new.password).map_err(|message| AuthError::InvalidInput {
			field: "password",
			message,
		})?;

		let email = new.email.trim().to_lowercase();

		let role_id = if email == self.admin_email {
			self.roles.administrator
		} else {
			self.roles.default
		};

		let now = Utc::now();
		let user = self
			.store
			.insert_user(User {
				id: Uuid::now_v7(),
				avatar_hash: User::email_digest(&email),
				email,
				username: new.username,
				password_hash: User::hash_password(&new.password),
				role_id: Some(role_id),
				confirmed: false,
				disabled: false,
				name: None,
				location: None,
				bio: None,
				last_seen: now,
				created_at: now,
			})
			.await?;

		self.store.insert_follow(user.id, user.id).await?;

		tracing::info!(user_id = %user.id, username = %user.username, "account registered");

		let token = self.generate_confirmation_token(&user)?;
		self.notify(
			&user.email,
			"Confirm your account",
			format!(
				"Hello {},\n\nwelcome to Quill! Visit /auth/confirm/{} to confirm your account.",
				user.username, token
			),
		)
		.await;

		Ok(user)
	}

	/// Looks the user up by email and verifies the password. A disabled
	/// account fails with `AccountDisabled` whatever the password says;
	/// that takes precedence over login success.
	pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
		let user = self
			.store
			.user_by_email(&email.trim().to_lowercase())
			.await?
			.ok_or(AuthError::InvalidCredentials)?;

		if user.disabled {
			return Err(AuthError::AccountDisabled);
		}

		if !user.verify_password(password) {
			return Err(AuthError::InvalidCredentials);
		}

		Ok(user)
	}

	/// Whether the user's role grants the permission.
	pub async fn can(&self, user: &User, permission: Permission) -> Result<bool> {
		Ok(permissions_of(self.store.as_ref(), user).await?.has_permission(permission))
	}

	/// `can`, surfaced as the hard rejection the route layer maps to 403.
	pub async fn require(&self, user: &User, permission: Permission) -> Result<()> {
		require(self.store.as_ref(), user, permission).await
	}

	pub async fn is_administrator(&self, user: &User) -> Result<bool> {
		self.can(user, Permission::Admin).await
	}

	pub fn generate_confirmation_token(&self, user: &User) -> Result<String> {
		Ok(self.signer.issue(user.id, TokenIntent::Confirm, None)?)
	}

	/// Confirms the account guarded by the token. Confirming an already
	/// confirmed account is a no-op that still reports success.
	pub async fn confirm(&self, user: &User, token: &str) -> Result<()> {
		let mut user = self.store.user_by_id(user.id).await?.ok_or(AuthError::UserNotFound)?;

		if user.confirmed {
			return Ok(());
		}

		let payload = self.signer.verify(token, TokenIntent::Confirm)?;
		if payload.user_id != user.id {
			return Err(TokenError::UserMismatch.into());
		}

		user.confirmed = true;
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "account confirmed");

		Ok(())
	}

	/// Mails a fresh confirmation token to an unconfirmed account.
	pub async fn resend_confirmation(&self, user: &User) -> Result<()> {
		if user.confirmed {
			return Ok(());
		}

		let token = self.generate_confirmation_token(user)?;
		self.notify(
			&user.email,
			"Confirm your account",
			format!(
				"Hello {},\n\nvisit /auth/confirm/{} to confirm your account.",
				user.username, token
			),
		)
		.await;

		Ok(())
	}

	pub fn generate_reset_password_token(&self, user: &User) -> Result<String> {
		Ok(self.signer.issue(user.id, TokenIntent::ResetPassword, None)?)
	}

	/// Issues a reset token and mails it. The account stays untouched until
	/// the token is redeemed.
	pub async fn request_password_reset(&self, email: &str) -> Result<()> {
		let user = self
			.store
			.user_by_email(&email.trim().to_lowercase())
			.await?
			.ok_or(AuthError::UserNotFound)?;

		let token = self.generate_reset_password_token(&user)?;
		self.notify(
			&user.email,
			"Reset your password",
			format!(
				"Hello {},\n\nvisit /auth/reset-password/{} to choose a new password.",
				user.username, token
			),
		)
		.await;

		Ok(())
	}

	/// Redeems a reset token. The token is the sole proof of identity; no
	/// authenticated caller is required. An invalid or expired token leaves
	/// the stored hash untouched.
	pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User> {
		User::validate_password(new_password).map_err(|message| AuthError::InvalidInput {
			field: "password",
			message,
		})?;

		let payload = self.signer.verify(token, TokenIntent::ResetPassword)?;

		let mut user = self.store.user_by_id(payload.user_id).await?.ok_or(AuthError::UserNotFound)?;
		user.password_hash = User::hash_password(new_password);
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "password reset");

		Ok(user)
	}

	pub fn generate_change_email_token(&self, user: &User, new_email: &str) -> Result<String> {
		Ok(self.signer.issue(user.id, TokenIntent::ChangeEmail, Some(new_email))?)
	}

	/// Verifies the password and issues a change-email token carrying the
	/// new address, mailed to that address.
	pub async fn request_email_change(&self, user: &User, new_email: &str, password: &str) -> Result<()> {
		if !user.verify_password(password) {
			return Err(AuthError::InvalidCredentials);
		}

		User::validate_email(new_email).map_err(|message| AuthError::InvalidInput { field: "email", message })?;

		let new_email = new_email.trim().to_lowercase();
		let token = self.generate_change_email_token(user, &new_email)?;
		self.notify(
			&new_email,
			"Confirm your new email",
			format!(
				"Hello {},\n\nvisit /auth/change-email/{} to confirm your new address.",
				user.username, token
			),
		)
		.await;

		Ok(())
	}

	/// Redeems a change-email token. Uniqueness of the new address is
	/// re-checked here: it may have been registered by someone else between
	/// issuance and redemption.
	pub async fn change_email(&self, user: &User, token: &str) -> Result<User> {
		let payload = self.signer.verify(token, TokenIntent::ChangeEmail)?;
		if payload.user_id != user.id {
			return Err(TokenError::UserMismatch.into());
		}

		let new_email = payload.new_email.ok_or(TokenError::Malformed)?;

		if let Some(existing) = self.store.user_by_email(&new_email).await? {
			if existing.id != user.id {
				return Err(AuthError::DuplicateEmail);
			}
		}

		let mut user = self.store.user_by_id(user.id).await?.ok_or(AuthError::UserNotFound)?;
		user.avatar_hash = User::email_digest(&new_email);
		user.email = new_email;
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "email changed");

		Ok(user)
	}

	/// Changes the password of an authenticated user, guarded by the old
	/// password.
	pub async fn change_password(&self, user: &User, old_password: &str, new_password: &str) -> Result<User> {
		if !user.verify_password(old_password) {
			return Err(AuthError::InvalidCredentials);
		}

		User::validate_password(new_password).map_err(|message| AuthError::InvalidInput {
			field: "password",
			message,
		})?;

		let mut user = self.store.user_by_id(user.id).await?.ok_or(AuthError::UserNotFound)?;
		user.password_hash = User::hash_password(new_password);
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "password changed");

		Ok(user)
	}

	/// Updates the last-seen timestamp. Side effect only.
	pub async fn ping(&self, user: &User) -> Result<()> {
		let mut user = self.store.user_by_id(user.id).await?.ok_or(AuthError::UserNotFound)?;
		user.last_seen = Utc::now();
		self.store.update_user(&user).await
	}

	pub async fn update_profile(
		&self,
		user: &User,
		name: Option<String>,
		location: Option<String>,
		bio: Option<String>,
	) -> Result<User> {
		ensure_active(user)?;

		let mut user = self.store.user_by_id(user.id).await?.ok_or(AuthError::UserNotFound)?;
		user.name = name;
		user.location = location;
		user.bio = bio;
		self.store.update_user(&user).await?;

		Ok(user)
	}

	/// Administrator-only edit of another account: email, username,
	/// confirmed flag, role and profile fields. A duplicate email or
	/// username surfaces as the field-level error, never as a raw
	/// constraint fault.
	pub async fn admin_update(&self, actor: &User, user_id: Uuid, update: AdminAccountUpdate) -> Result<User> {
		ensure_active(actor)?;
		self.require(actor, Permission::Admin).await?;

		User::validate_email(&update.email).map_err(|message| AuthError::InvalidInput { field: "email", message })?;
		User::validate_username(&update.username).map_err(|message| AuthError::InvalidInput {
			field: "username",
			message,
		})?;

		if let Some(role_id) = update.role_id {
			self.store.role_by_id(role_id).await?.ok_or(AuthError::NotFound("role"))?;
		}

		let mut user = self.store.user_by_id(user_id).await?.ok_or(AuthError::UserNotFound)?;

		let email = update.email.trim().to_lowercase();
		if email != user.email {
			user.avatar_hash = User::email_digest(&email);
		}
		user.email = email;
		user.username = update.username;
		user.confirmed = update.confirmed;
		user.role_id = update.role_id;
		user.name = update.name;
		user.location = update.location;
		user.bio = update.bio;

		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, "account edited by administrator");

		Ok(user)
	}

	/// Administrator-only: move the user to another role (any-to-any).
	pub async fn set_role(&self, actor: &User, user_id: Uuid, role_id: Uuid) -> Result<User> {
		ensure_active(actor)?;
		self.require(actor, Permission::Admin).await?;

		let role = self.store.role_by_id(role_id).await?.ok_or(AuthError::NotFound("role"))?;
		let mut user = self.store.user_by_id(user_id).await?.ok_or(AuthError::UserNotFound)?;
		user.role_id = Some(role.id);
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, role = %role.name, "role changed");

		Ok(user)
	}

	/// Administrator-only: disable or re-enable the account. Reversible.
	pub async fn set_disabled(&self, actor: &User, user_id: Uuid, disabled: bool) -> Result<User> {
		ensure_active(actor)?;
		self.require(actor, Permission::Admin).await?;

		let mut user = self.store.user_by_id(user_id).await?.ok_or(AuthError::UserNotFound)?;
		user.disabled = disabled;
		self.store.update_user(&user).await?;

		tracing::info!(user_id = %user.id, disabled, "account disabled flag changed");

		Ok(user)
	}

	/// Deletes the account and everything it owns: posts, the comments on
	/// them, the user's own comments and every follow edge in either
	/// direction. Allowed for the user themselves or an administrator.
	pub async fn delete_account(&self, actor: &User, user_id: Uuid) -> Result<()> {
		if actor.id != user_id {
			ensure_active(actor)?;
			self.require(actor, Permission::Admin).await?;
		}

		let user = self.store.user_by_id(user_id).await?.ok_or(AuthError::UserNotFound)?;
		self.store.delete_user(user.id).await?;

		tracing::info!(user_id = %user.id, username = %user.username, "account deleted");

		Ok(())
	}

	async fn notify(&self, to: &str, subject: &str, body: String) {
		if let Err(err) = self.mailer.send(to, subject, &body).await {
			tracing::warn!(to, %err, "failed to send notification mail");
		}
	}
}
