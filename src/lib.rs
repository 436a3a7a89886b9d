//! Account, authorization and social graph core for the Quill blogging
//! platform.
//!
//! The route layer drives this crate and owns everything user-facing:
//! routing, templates, sessions, flash messages. What lives here are the
//! decisions — who may log in, what a role's bitmask grants, whether a
//! signed confirmation / password-reset / email-change token is still good,
//! and how an account and its follower edges come and go.
//!
//! Persistence goes through the [`store::Store`] port ([`store::PgStore`]
//! for Postgres, [`store::MemoryStore`] for tests and development) and mail
//! goes through the fire-and-forget [`mailer::Mailer`] trait.

pub mod account;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod mailer;
pub mod social;
pub mod store;
pub mod token;

#[cfg(test)]
mod tests;

pub use account::{AccountService, AdminAccountUpdate, NewAccount};
pub use config::CoreConfig;
pub use content::ContentService;
pub use database::{Comment, Follow, Permission, Post, Role, User};
pub use error::AuthError;
pub use mailer::{LogMailer, Mailer};
pub use social::SocialService;
pub use store::{MemoryStore, PgStore, Store};
pub use token::{AccountToken, TokenError, TokenIntent, TokenSigner};
