//! Outbound mail abstraction.
//!
//! The server only needs one message shape (verification codes), so the
//! trait is deliberately small and synchronous. [`TracingMailer`] logs mail
//! instead of delivering it; swap in an SMTP implementation behind the same
//! trait when a relay is available.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

pub trait Mailer: Send + Sync {
  fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes outbound mail to the log.
pub struct TracingMailer;

impl Mailer for TracingMailer {
  fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
    tracing::info!(%to, %subject, %body, "outbound mail");
    Ok(())
  }
}
