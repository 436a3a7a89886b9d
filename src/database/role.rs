use bitmask_enum::bitmask;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Default, sqlx::FromRow)]
/// A named bundle of permissions assigned to users.
/// Exactly one role is flagged as the default for newly registered users,
/// and the administrator role holds every permission bit.
pub struct Role {
	/// The unique identifier for the role.
	pub id: Uuid,
	/// The name of the role.
	pub name: String,
	/// The permissions granted by this role.
	pub permissions: Permission,
	/// Whether newly registered users are assigned this role.
	pub is_default: bool,
	/// The time the role was created.
	pub created_at: DateTime<Utc>,
}

#[bitmask(i64)]
pub enum Permission {
	/// Can follow other users
	Follow,
	/// Can comment on posts
	Comment,
	/// Can write posts
	Write,
	/// Can moderate comments written by other users
	Moderate,
	/// Can do anything
	Admin,
}

impl sqlx::Decode<'_, sqlx::Postgres> for Permission {
	fn decode(value: sqlx::postgres::PgValueRef<'_>) -> Result<Self, Box<dyn std::error::Error + 'static + Send + Sync>> {
		<i64 as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self::from)
	}
}

impl sqlx::Type<sqlx::Postgres> for Permission {
	fn type_info() -> sqlx::postgres::PgTypeInfo {
		<i64 as sqlx::Type<sqlx::Postgres>>::type_info()
	}
}

impl Default for Permission {
	fn default() -> Self {
		Self::none()
	}
}

impl Permission {
	/// Checks if the current permission set contains the given permission.
	/// A set granted under a subset mask is always granted under a superset
	/// mask.
	pub fn has_permission(&self, other: Self) -> bool {
		(*self & other) == other
	}

	/// Folds a set of named bits into a composed role mask.
	pub fn compose(bits: impl IntoIterator<Item = Self>) -> Self {
		bits.into_iter().fold(Self::none(), |mask, bit| mask | bit)
	}
}

impl Role {
	/// Name of the role granted to the configured administrator account.
	pub const ADMINISTRATOR: &'static str = "Administrator";

	/// The roles seeded at bootstrap, as (name, permissions, default flag).
	/// Seeding upserts by name, so reruns keep ids stable.
	pub fn presets() -> [(&'static str, Permission, bool); 3] {
		[
			(
				"User",
				Permission::compose([Permission::Follow, Permission::Comment, Permission::Write]),
				true,
			),
			(
				"Moderator",
				Permission::compose([
					Permission::Follow,
					Permission::Comment,
					Permission::Write,
					Permission::Moderate,
				]),
				false,
			),
			(Self::ADMINISTRATOR, Permission::all(), false),
		]
	}
}
