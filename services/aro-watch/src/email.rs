//! SMTP e-mail notification client

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmailConfig;
use crate::io::{Mailer, OutgoingMail, SmtpMailer};
use crate::notifier::{Channel, NotificationMessage, Notifier};
use crate::WatchError;

/// E-mail sender over an injectable mail transport
pub struct EmailNotifier {
    from: String,
    recipients: Vec<String>,
    mailer: Arc<dyn Mailer>,
}

impl std::fmt::Debug for EmailNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailNotifier")
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl EmailNotifier {
    pub fn new(from: String, recipients: Vec<String>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            from,
            recipients,
            mailer,
        }
    }

    /// Build an SMTP-backed notifier; `None` when the channel is disabled or incomplete
    pub fn from_config(config: &EmailConfig) -> crate::Result<Option<Self>> {
        if !config.is_active() {
            return Ok(None);
        }
        let (Some(username), Some(password), Some(from)) = (
            config.username.as_deref(),
            config.password.as_deref(),
            config.sender(),
        ) else {
            return Ok(None);
        };

        let mailer = SmtpMailer::new(&config.smtp_host, config.smtp_port, username, password)?;
        tracing::debug!(
            "Created EmailNotifier via {}:{} for {} recipient(s)",
            config.smtp_host,
            config.smtp_port,
            config.recipients.len()
        );

        Ok(Some(Self::new(
            from.to_string(),
            config.recipients.clone(),
            Arc::new(mailer),
        )))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn recipients(&self) -> &[String] {
        &self.recipients
    }

    async fn send(&self, message: &NotificationMessage) -> crate::Result<()> {
        let mail = OutgoingMail {
            from: self.from.clone(),
            to: message.recipient.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
        };

        tracing::debug!("Sending e-mail '{}' to {}", mail.subject, mail.to);
        self.mailer.send(&mail).await.map_err(|e| match e {
            e @ WatchError::Notification { .. } => e,
            other => WatchError::notification(Channel::Email, other.to_string()),
        })?;

        tracing::debug!("E-mail to {} sent", message.recipient);
        Ok(())
    }
}
