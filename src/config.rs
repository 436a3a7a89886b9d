use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
/// Configuration for the account core.
pub struct CoreConfig {
	/// Signed-token settings.
	pub token: TokenConfig,

	/// Email address that is granted the administrator role at registration.
	pub admin_email: String,

	/// Database settings.
	pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
	/// Secret used to sign account tokens.
	/// Rotating it invalidates every outstanding token.
	pub secret: String,

	/// Issuer claim embedded in account tokens.
	pub issuer: String,

	/// Lifetime of issued tokens in seconds.
	pub ttl_seconds: u64,
}

impl Default for TokenConfig {
	fn default() -> Self {
		Self {
			secret: "quill".to_string(),
			issuer: "quill".to_string(),
			ttl_seconds: 3600,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// The database URL to use
	pub uri: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			uri: "postgres://root@localhost:5432/quill_dev".to_string(),
		}
	}
}

impl Default for CoreConfig {
	fn default() -> Self {
		Self {
			token: TokenConfig::default(),
			admin_email: "admin@quill.blog".to_string(),
			database: DatabaseConfig::default(),
		}
	}
}
