use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::TokenConfig;

const INTENT_CLAIM: &str = "intent";
const EMAIL_CLAIM: &str = "email";

/// The declared purpose of an account token, checked at verification to
/// prevent cross-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenIntent {
	Confirm,
	ResetPassword,
	ChangeEmail,
}

impl TokenIntent {
	pub fn as_str(&self) -> &'static str {
		match self {
			TokenIntent::Confirm => "confirm",
			TokenIntent::ResetPassword => "reset",
			TokenIntent::ChangeEmail => "change_email",
		}
	}

	fn parse(value: &str) -> Option<Self> {
		match value {
			"confirm" => Some(TokenIntent::Confirm),
			"reset" => Some(TokenIntent::ResetPassword),
			"change_email" => Some(TokenIntent::ChangeEmail),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
	#[error("malformed token")]
	Malformed,
	#[error("invalid token signature")]
	SignatureInvalid,
	#[error("token has expired")]
	Expired,
	#[error("token was issued for a different purpose")]
	IntentMismatch,
	#[error("token was issued for a different user")]
	UserMismatch,
	#[error("failed to sign token")]
	Sign,
}

/// A verified account token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountToken {
	pub user_id: Uuid,
	pub intent: TokenIntent,
	/// Only present on change-email tokens: the address chosen at issuance.
	pub new_email: Option<String>,
	pub issued_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

/// Issues and verifies the signed, time-limited tokens embedded in
/// confirmation, password reset and email change links.
///
/// Tokens are HMAC-SHA256 JWTs keyed by the process-wide secret; any bit
/// flip invalidates them and rotating the secret invalidates every
/// outstanding token.
#[derive(Debug, Clone)]
pub struct TokenSigner {
	secret: String,
	issuer: String,
	ttl: Duration,
}

impl TokenSigner {
	pub fn new(config: &TokenConfig) -> Self {
		Self {
			secret: config.secret.clone(),
			issuer: config.issuer.clone(),
			ttl: Duration::seconds(config.ttl_seconds as i64),
		}
	}

	fn key(&self) -> Result<Hmac<Sha256>, TokenError> {
		Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).map_err(|_| TokenError::Sign)
	}

	/// Produces a signed token for the given user and intent. Change-email
	/// tokens carry the new address chosen at issuance time.
	pub fn issue(&self, user_id: Uuid, intent: TokenIntent, new_email: Option<&str>) -> Result<String, TokenError> {
		let issued_at = Utc::now();
		let expires_at = issued_at + self.ttl;

		let mut claims = Claims::new(RegisteredClaims {
			issuer: Some(self.issuer.clone()),
			subject: Some(user_id.to_string()),
			audience: None,
			expiration: Some(expires_at.timestamp() as u64),
			not_before: None,
			issued_at: Some(issued_at.timestamp() as u64),
			json_web_token_id: None,
		});

		claims.private.insert(INTENT_CLAIM.into(), intent.as_str().into());
		if let Some(email) = new_email {
			claims.private.insert(EMAIL_CLAIM.into(), email.into());
		}

		claims.sign_with_key(&self.key()?).map_err(|_| TokenError::Sign)
	}

	/// Verifies a token string against the expected intent.
	///
	/// Verification is read-only: the same valid token verifies to the same
	/// payload every time. Single-use semantics belong to the state
	/// transition the token guards, which goes idempotent once applied.
	pub fn verify(&self, token: &str, expected: TokenIntent) -> Result<AccountToken, TokenError> {
		let token: Token<Header, Claims, _> = token.verify_with_key(&self.key()?).map_err(|err| match err {
			jwt::Error::InvalidSignature => TokenError::SignatureInvalid,
			_ => TokenError::Malformed,
		})?;

		let claims = token.claims();

		if claims.registered.issuer.as_deref() != Some(self.issuer.as_str()) {
			return Err(TokenError::Malformed);
		}

		let issued_at = claims
			.registered
			.issued_at
			.and_then(|x| Utc.timestamp_opt(x as i64, 0).single())
			.ok_or(TokenError::Malformed)?;

		let expires_at = claims
			.registered
			.expiration
			.and_then(|x| Utc.timestamp_opt(x as i64, 0).single())
			.ok_or(TokenError::Malformed)?;

		if Utc::now() > expires_at {
			return Err(TokenError::Expired);
		}

		let user_id = claims
			.registered
			.subject
			.as_ref()
			.and_then(|x| Uuid::parse_str(x).ok())
			.ok_or(TokenError::Malformed)?;

		let intent = claims
			.private
			.get(INTENT_CLAIM)
			.and_then(|v| v.as_str())
			.and_then(TokenIntent::parse)
			.ok_or(TokenError::Malformed)?;

		if intent != expected {
			return Err(TokenError::IntentMismatch);
		}

		let new_email = claims.private.get(EMAIL_CLAIM).and_then(|v| v.as_str()).map(str::to_owned);

		Ok(AccountToken {
			user_id,
			intent,
			new_email,
			issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn signer() -> TokenSigner {
		TokenSigner::new(&TokenConfig {
			secret: "test-secret".to_string(),
			issuer: "quill-test".to_string(),
			ttl_seconds: 3600,
		})
	}

	#[test]
	fn round_trip_returns_the_original_payload() {
		let signer = signer();
		let user_id = Uuid::now_v7();

		let token = signer.issue(user_id, TokenIntent::Confirm, None).unwrap();

		let first = signer.verify(&token, TokenIntent::Confirm).unwrap();
		let second = signer.verify(&token, TokenIntent::Confirm).unwrap();

		assert_eq!(first.user_id, user_id);
		assert_eq!(first.intent, TokenIntent::Confirm);
		assert_eq!(first.new_email, None);
		assert_eq!(first, second);
	}

	#[test]
	fn change_email_tokens_carry_the_new_address() {
		let signer = signer();
		let user_id = Uuid::now_v7();

		let token = signer
			.issue(user_id, TokenIntent::ChangeEmail, Some("new@example.com"))
			.unwrap();
		let payload = signer.verify(&token, TokenIntent::ChangeEmail).unwrap();

		assert_eq!(payload.new_email.as_deref(), Some("new@example.com"));
	}

	#[test]
	fn intent_mismatch_is_rejected() {
		let signer = signer();
		let token = signer.issue(Uuid::now_v7(), TokenIntent::Confirm, None).unwrap();

		assert_eq!(
			signer.verify(&token, TokenIntent::ResetPassword),
			Err(TokenError::IntentMismatch)
		);
	}

	#[test]
	fn expired_tokens_are_rejected() {
		let expired = TokenSigner {
			ttl: Duration::seconds(-60),
			..signer()
		};

		let token = expired.issue(Uuid::now_v7(), TokenIntent::ResetPassword, None).unwrap();

		assert_eq!(expired.verify(&token, TokenIntent::ResetPassword), Err(TokenError::Expired));
	}

	#[test]
	fn tampering_invalidates_the_signature() {
		let signer = signer();
		let token = signer.issue(Uuid::now_v7(), TokenIntent::Confirm, None).unwrap();

		let mut tampered = token.into_bytes();
		let last = tampered.len() - 1;
		tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
		let tampered = String::from_utf8(tampered).unwrap();

		assert!(matches!(
			signer.verify(&tampered, TokenIntent::Confirm),
			Err(TokenError::SignatureInvalid | TokenError::Malformed)
		));
	}

	#[test]
	fn a_foreign_secret_is_rejected() {
		let signer = signer();
		let foreign = TokenSigner {
			secret: "other-secret".to_string(),
			..signer.clone()
		};

		let token = foreign.issue(Uuid::now_v7(), TokenIntent::Confirm, None).unwrap();

		assert_eq!(signer.verify(&token, TokenIntent::Confirm), Err(TokenError::SignatureInvalid));
	}

	#[test]
	fn garbage_is_malformed() {
		assert_eq!(
			signer().verify("not-a-token", TokenIntent::Confirm),
			Err(TokenError::Malformed)
		);
	}
}
