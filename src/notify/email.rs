// src/notify/email.rs
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::OperatorConfig;
use crate::error::{ConfigError, DeliveryError};

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

/// Unset and blank count the same.
fn env_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    env_opt(var).ok_or(ConfigError::MissingEnv(var))
}

fn parse_mailbox(var: &'static str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.parse().map_err(|e: lettre::address::AddressError| ConfigError::Address {
        var,
        reason: e.to_string(),
    })
}

impl EmailNotifier {
    /// SMTP credentials come from the environment only:
    /// SMTP_HOST, SMTP_USER, SMTP_PASS, optional SMTP_PORT.
    /// NOTIFY_EMAIL_TO / NOTIFY_EMAIL_FROM override the config file.
    pub fn from_env(operator: &OperatorConfig) -> Result<Self, ConfigError> {
        let host = env_required("SMTP_HOST")?;
        let user = env_required("SMTP_USER")?;
        let pass = env_required("SMTP_PASS")?;

        let to_addr = env_opt("NOTIFY_EMAIL_TO")
            .or_else(|| operator.to.clone())
            .ok_or(ConfigError::MissingEnv("NOTIFY_EMAIL_TO"))?;
        let from_addr = env_opt("NOTIFY_EMAIL_FROM")
            .or_else(|| operator.from.clone())
            .unwrap_or_else(|| user.clone());

        let creds = Credentials::new(user, pass);
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .map_err(|e| ConfigError::Invalid(format!("SMTP_HOST {host}: {e}")))?
            .credentials(creds);
        if let Some(raw) = env_opt("SMTP_PORT") {
            let port: u16 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SMTP_PORT {raw} is not a port")))?;
            builder = builder.port(port);
        }

        Ok(Self {
            mailer: builder.build(),
            from: parse_mailbox("NOTIFY_EMAIL_FROM", &from_addr)?,
            to: parse_mailbox("NOTIFY_EMAIL_TO", &to_addr)?,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        self.mailer
            .send(msg)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tracing::info!(to = %self.to, %subject, "email sent");
        Ok(())
    }
}
