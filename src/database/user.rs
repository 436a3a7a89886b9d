use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct User {
	/// The unique identifier for the user.
	pub id: Uuid,
	/// The email of the user. Unique, stored lowercased.
	pub email: String,
	/// The username of the user. Unique.
	pub username: String,
	/// The hashed password of the user. (argon2)
	pub password_hash: String,
	/// The role granted to the user. A user without a role can do nothing.
	pub role_id: Option<Uuid>,
	/// Whether the user has confirmed their email address.
	pub confirmed: bool,
	/// Whether the account has been disabled by an administrator.
	pub disabled: bool,
	/// Display name shown on the profile.
	pub name: Option<String>,
	/// Free-form location shown on the profile.
	pub location: Option<String>,
	/// Short biography shown on the profile.
	pub bio: Option<String>,
	/// Digest of the email, used to build avatar URLs.
	pub avatar_hash: String,
	/// The time the user was last seen.
	pub last_seen: DateTime<Utc>,
	/// The time the user was created.
	pub created_at: DateTime<Utc>,
}

impl User {
	/// Uses argon2 to verify the password hash against the provided password.
	pub fn verify_password(&self, password: &str) -> bool {
		let hash = match PasswordHash::new(&self.password_hash) {
			Ok(hash) => hash,
			Err(err) => {
				tracing::error!("failed to parse password hash: {}", err);
				return false;
			}
		};

		Argon2::default().verify_password(password.as_bytes(), &hash).is_ok()
	}

	/// Generates a new password hash using argon2.
	pub fn hash_password(password: &str) -> String {
		let salt = SaltString::generate(&mut OsRng);

		let hash = Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.expect("failed to hash password");

		hash.to_string()
	}

	/// Digest of the trimmed, lowercased email used for avatar URLs.
	/// Recomputed whenever the email changes.
	pub fn email_digest(email: &str) -> String {
		let mut hasher = Sha256::new();
		hasher.update(email.trim().to_lowercase().as_bytes());
		hex::encode(hasher.finalize())
	}

	/// Validates a username.
	pub fn validate_username(username: &str) -> Result<(), &'static str> {
		if username.len() < 3 {
			return Err("Username must be at least 3 characters long");
		}

		if username.len() > 20 {
			return Err("Username must be at most 20 characters long");
		}

		if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return Err("Username must only contain alphanumeric characters and underscores");
		}

		Ok(())
	}

	/// Validates a password.
	pub fn validate_password(password: &str) -> Result<(), &'static str> {
		if password.len() < 8 {
			return Err("Password must be at least 8 characters long");
		}

		if !password.chars().any(|c| c.is_ascii_lowercase()) {
			return Err("Password must contain at least one lowercase character");
		}

		if !password.chars().any(|c| c.is_ascii_uppercase()) {
			return Err("Password must contain at least one uppercase character");
		}

		if !password.chars().any(|c| c.is_ascii_digit()) {
			return Err("Password must contain at least one digit");
		}

		if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
			return Err("Password must contain at least one special character");
		}

		if password.len() > 100 {
			return Err("Password must be at most 100 characters long");
		}

		Ok(())
	}

	/// Validates an email.
	pub fn validate_email(email: &str) -> Result<(), &'static str> {
		if email.len() < 5 {
			return Err("Email must be at least 5 characters long");
		}

		if email.len() > 100 {
			return Err("Email must be at most 100 characters long");
		}

		if !email.contains('@') {
			return Err("Email must contain an @");
		}

		if !email.contains('.') {
			return Err("Email must contain a .");
		}

		if !email_address::EmailAddress::is_valid(email) {
			return Err("Email is not a valid email address");
		}

		Ok(())
	}
}
