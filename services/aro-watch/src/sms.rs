//! Twilio SMS notification client

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SmsConfig;
use crate::io::{BasicAuth, HttpClient};
use crate::notifier::{Channel, NotificationMessage, Notifier};
use crate::WatchError;

/// Twilio Messages API sender
pub struct SmsNotifier {
    messages_url: String,
    auth: BasicAuth,
    from_number: String,
    recipients: Vec<String>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SmsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsNotifier")
            .field("from_number", &self.from_number)
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl SmsNotifier {
    /// Build from config; `None` when the channel is disabled or incomplete
    pub fn from_config(config: &SmsConfig, http: Arc<dyn HttpClient>) -> Option<Self> {
        if !config.is_active() {
            return None;
        }
        let account_sid = config.account_sid.clone()?;
        let auth_token = config.auth_token.clone()?;
        let from_number = config.from_number.clone()?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base.trim_end_matches('/'),
            account_sid
        );
        tracing::debug!(
            "Created SmsNotifier from {} for {} recipient(s)",
            from_number,
            config.recipients.len()
        );

        Some(Self {
            messages_url,
            auth: BasicAuth {
                username: account_sid,
                password: auth_token,
            },
            from_number,
            recipients: config.recipients.clone(),
            http,
        })
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn recipients(&self) -> &[String] {
        &self.recipients
    }

    async fn send(&self, message: &NotificationMessage) -> crate::Result<()> {
        let params = [
            ("To", message.recipient.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", message.body.as_str()),
        ];

        tracing::debug!("Sending SMS to {}", message.recipient);

        let response = self
            .http
            .post_form(&self.messages_url, &self.auth, &params)
            .await
            .map_err(|e| WatchError::notification(Channel::Sms, e.to_string()))?;

        if !response.is_success() {
            return Err(WatchError::notification(
                Channel::Sms,
                format!(
                    "Twilio API returned status {}: {}",
                    response.status, response.body
                ),
            ));
        }

        tracing::debug!("SMS to {} accepted", message.recipient);
        Ok(())
    }
}
