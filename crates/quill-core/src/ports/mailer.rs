//! Mailer port - abstraction over the email transport.

use async_trait::async_trait;

/// A single outgoing email message.
#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mailer errors.
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Transport unavailable: {0}")]
    Transport(String),
}

/// Email transport trait. Delivery success or failure is fully determined
/// by the implementation; one call attempts exactly one message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}
