// src/notify/email.rs
use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{DigestMessage, Notifier};
use crate::config::env_opt;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// `Ok(None)` when `SMTP_HOST` is unset; an error when it is set but the
    /// rest of the settings are missing or invalid.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(host) = env_opt("SMTP_HOST") else {
            return Ok(None);
        };
        let user = env_opt("SMTP_USER").context("SMTP_USER missing")?;
        let pass = env_opt("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = env_opt("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;
        let to_addr = env_opt("NOTIFY_EMAIL_TO").context("NOTIFY_EMAIL_TO missing")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(Credentials::new(user, pass))
            .build();

        let from = from_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Some(Self { mailer, from, to }))
    }

    fn build(&self, msg: &DigestMessage) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(msg.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.text.clone())
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailSender {
    async fn send(&self, msg: &DigestMessage) -> Result<()> {
        let email = self.build(msg)?;
        self.mailer.send(email).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
