//! Outbound email.
//!
//! The flows only see the [`Mailer`] trait and treat delivery as
//! best-effort: a failed send is logged by the caller, never surfaced to the
//! user, and never rolls anything back. [`LogMailer`] is the default when
//! SMTP is unconfigured; [`SmtpMailer`] delivers over lettre's blocking
//! transport, which callers drive through `spawn_blocking`.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{error, info};

/// Email delivery abstraction.
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    ///
    /// # Errors
    /// Returns an error when the transport rejects the message.
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Fallback sender that logs the message instead of delivering it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        info!(recipient, subject, body, "email delivery stub");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build an SMTP sender using STARTTLS on the given relay.
    ///
    /// # Errors
    /// Returns an error if the relay host or the `from` address is invalid.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<String>,
        password: Option<SecretString>,
        from: &str,
    ) -> Result<Self> {
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid SMTP from address: {from}"))?;
        let mut builder = SmtpTransport::starttls_relay(host)
            .with_context(|| format!("Invalid SMTP relay host: {host}"))?
            .port(port);
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient address: {recipient}"))?)
            .subject(subject)
            .body(body.to_string())
            .context("failed to build email message")?;
        self.transport
            .send(&message)
            .context("failed to send email")?;
        Ok(())
    }
}

/// Fire-and-forget delivery off the async executor. Failures are logged and
/// swallowed; account creation must not hinge on the mail relay.
pub(crate) async fn deliver_best_effort(
    mailer: Arc<dyn Mailer>,
    recipient: String,
    subject: String,
    body: String,
) {
    let result =
        tokio::task::spawn_blocking(move || mailer.send(&recipient, &subject, &body)).await;
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("Failed to deliver email: {err:#}"),
        Err(err) => error!("Email delivery task failed: {err}"),
    }
}
