//! Mailer implementations.

mod logging;

pub use logging::{LoggingMailer, LoggingMailerConfig};
