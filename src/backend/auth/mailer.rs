/**
 * Magic Link Mailer
 *
 * Sends login links over SMTP (STARTTLS) with lettre. Only built when SMTP
 * is configured; delivery failures are reported to the caller, which logs
 * them without failing the login request.
 */

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::backend::server::config::SmtpConfig;

const SUBJECT: &str = "Your login link for Kanban";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.sender().parse()?,
        })
    }

    pub async fn send_magic_link(&self, to: &str, link: &str) -> Result<(), MailError> {
        let email = compose(&self.from, to, link)?;
        self.transport.send(email).await?;
        tracing::info!("[Auth] login link mailed to {}", to);
        Ok(())
    }
}

fn compose(from: &Mailbox, to: &str, link: &str) -> Result<Message, MailError> {
    let body = format!(
        "Click the link below to log in:\n\n{}\n\nIf you didn't request this link, you can safely ignore this email.",
        link
    );
    Ok(Message::builder()
        .from(from.clone())
        .to(to.parse()?)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(body)?)
}
