//! Logging mailer - a development transport.
//!
//! Logs every message instead of delivering it. Delivery always succeeds;
//! the counting contract upstream holds against any transport, so real
//! failures belong to a real transport implementation.

use std::time::Duration;

use async_trait::async_trait;

use quill_core::ports::{Email, Mailer, MailerError};

/// Logging mailer configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingMailerConfig {
    /// Simulated per-message latency.
    pub delay: Duration,
}

impl LoggingMailerConfig {
    pub fn from_env() -> Self {
        Self {
            delay: std::env::var("MAILER_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or_default(),
        }
    }
}

/// Development mailer that writes messages to the log.
pub struct LoggingMailer {
    config: LoggingMailerConfig,
}

impl LoggingMailer {
    pub fn new(config: LoggingMailerConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(LoggingMailerConfig::from_env())
    }
}

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let preview: String = email.text.chars().take(100).collect();

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            preview = %preview,
            "Sending email"
        );

        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }

        tracing::info!(to = %email.to, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_reports_success() {
        let mailer = LoggingMailer::new(LoggingMailerConfig::default());
        let email = Email {
            to: "a@example.com".into(),
            subject: "Hi".into(),
            text: "body".into(),
            html: "<p>body</p>".into(),
        };

        assert!(mailer.send(&email).await.is_ok());
    }
}
