//! Email notifications.
//!
//! [`Notifier`] is the seam the library talks to. [`SmtpNotifier`] delivers
//! single-recipient plaintext messages through a STARTTLS relay;
//! [`DisabledNotifier`] is used when no `[smtp]` section is configured.
//! Delivery errors are returned to the caller, never retried.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;

use crate::config::SmtpConfig;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Build the notifier for the optional `[smtp]` section.
pub fn create_notifier(config: Option<&SmtpConfig>) -> Result<Arc<dyn Notifier>> {
    match config {
        Some(smtp) => Ok(Arc::new(SmtpNotifier::new(smtp)?)),
        None => Ok(Arc::new(DisabledNotifier)),
    }
}

pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<()> {
        bail!("email notifications are disabled")
    }
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let password = std::env::var(&config.password_env)
            .with_context(|| format!("{} environment variable not set", config.password_env))?;

        let from: Mailbox = config
            .sender()
            .parse()
            .with_context(|| format!("invalid sender address: {}", config.sender()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP relay: {}", config.host))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), password))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = build_message(&self.from, to, subject, body)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery to {} failed", to))?;
        tracing::info!(subject, "email sent");
        Ok(())
    }
}

/// Assemble a plaintext message for a single recipient.
pub fn build_message(from: &Mailbox, to: &str, subject: &str, body: &str) -> Result<Message> {
    let to: Mailbox = to
        .trim()
        .parse()
        .with_context(|| format!("invalid recipient address: {}", to))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .context("failed to build email message")
}
