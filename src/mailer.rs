use async_trait::async_trait;

/// Outbound notification sender.
///
/// Delivery is fire-and-forget: the account core logs failures and never
/// lets them interfere with the state transition that triggered the mail.
#[async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to send mail: {0}")]
pub struct MailerError(pub String);

/// Mailer that only logs the outgoing message. Used in development; real
/// deliveries are wired up by the embedding application.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
		tracing::info!(to, subject, body, "mail dispatched");
		Ok(())
	}
}
