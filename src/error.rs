use crate::token::TokenError;

pub type Result<T, E = AuthError> = std::result::Result<T, E>;

/// The primary error type for account, social and content operations.
///
/// Credential and token failures are meant to be recovered at the route
/// boundary and turned into a user-facing message. `PermissionDenied` is the
/// hard rejection the route layer maps to a 403. Uniqueness violations are
/// surfaced as the field-level duplicate variants, never as a raw constraint
/// fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("invalid email or password")]
	InvalidCredentials,
	#[error("account is disabled")]
	AccountDisabled,
	#[error("email is already registered")]
	DuplicateEmail,
	#[error("username is already taken")]
	DuplicateUsername,
	#[error("permission denied")]
	PermissionDenied,
	#[error("user not found")]
	UserNotFound,
	#[error("{0} not found")]
	NotFound(&'static str),
	#[error("invalid {field}: {message}")]
	InvalidInput {
		field: &'static str,
		message: &'static str,
	},
	#[error(transparent)]
	Token(#[from] TokenError),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

impl AuthError {
	/// Whether the error is one of the recoverable token failures. Callers
	/// that only need pass/fail can collapse on this; the variant keeps the
	/// cause distinguishable.
	pub fn is_token_failure(&self) -> bool {
		matches!(self, AuthError::Token(_))
	}
}
