//! Notifier trait and message composition

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::AvailabilityResult;

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Sms => write!(f, "sms"),
        }
    }
}

/// Why a message is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Listing went from unavailable to available
    Transition,
    /// Listing is still available and the reminder interval elapsed
    Reminder,
}

/// A single message to a single recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub channel: Channel,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Outcome of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub channel: Channel,
    pub recipient: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Trait for sending notifications over one channel
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    fn channel(&self) -> Channel;

    fn recipients(&self) -> &[String];

    /// Send a message to its recipient
    async fn send(&self, message: &NotificationMessage) -> crate::Result<()>;
}

/// Text shared by every channel for one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    /// Long form, for e-mail
    pub body: String,
    /// Short form, for SMS
    pub summary: String,
}

impl Alert {
    pub fn availability(
        listing: &str,
        url: &str,
        result: &AvailabilityResult,
        reason: Reason,
    ) -> Self {
        let count = result.available_units().count();
        let subject = match reason {
            Reason::Transition => format!("{} available - {} unit(s)", listing, count),
            Reason::Reminder => format!("Reminder: {} still available - {} unit(s)", listing, count),
        };

        let mut body = format!(
            "{} units are available.\n\nFound {} available unit(s):\n",
            listing, count
        );
        for (i, unit) in result.available_units().enumerate() {
            body.push_str(&format!(
                "\nUnit {}:\n- Name: {}\n- Availability: {}\n- Price: {}\n- Square Footage: {}\n",
                i + 1,
                unit.name.as_deref().unwrap_or("N/A"),
                unit.availability.as_deref().unwrap_or("N/A"),
                unit.price.as_deref().unwrap_or("N/A"),
                unit.sqft.as_deref().unwrap_or("N/A"),
            ));
        }
        body.push_str(&format!(
            "\nCheck the website for details and to apply:\n{}\n\nChecked at {}\n",
            url,
            result.checked_at.to_rfc3339()
        ));

        let summary = format!(
            "ALERT: {} {} unit(s) available. Check now: {}",
            count, listing, url
        );

        Self {
            subject,
            body,
            summary,
        }
    }

    pub fn monitor_error(url: &str, failures: u32, error: &str, at: DateTime<Utc>) -> Self {
        Self {
            subject: "Availability monitor error".to_string(),
            body: format!(
                "The availability monitor for {} has failed {} consecutive check(s).\n\n\
                 Last error: {}\n\nAt {}. Check the logs and configuration.\n",
                url,
                failures,
                error,
                at.to_rfc3339()
            ),
            summary: format!(
                "Availability monitor failing ({} in a row): {}",
                failures, error
            ),
        }
    }

    /// One message per recipient of the given notifier
    pub fn messages_for(&self, notifier: &dyn Notifier) -> Vec<NotificationMessage> {
        let channel = notifier.channel();
        notifier
            .recipients()
            .iter()
            .map(|recipient| NotificationMessage {
                channel,
                recipient: recipient.clone(),
                subject: self.subject.clone(),
                body: match channel {
                    Channel::Email => self.body.clone(),
                    Channel::Sms => self.summary.clone(),
                },
            })
            .collect()
    }
}

/// Send an alert over every notifier; failures are recorded, never propagated
pub async fn dispatch(alert: &Alert, notifiers: &[Arc<dyn Notifier>]) -> Vec<DeliveryRecord> {
    let mut records = Vec::new();

    for notifier in notifiers {
        for message in alert.messages_for(notifier.as_ref()) {
            tracing::debug!(
                "Dispatching via {} to {}: {}",
                message.channel,
                message.recipient,
                message.subject
            );

            let result = notifier.send(&message).await;
            if let Err(e) = &result {
                tracing::warn!(
                    "Notification via {} to {} failed: {}",
                    message.channel,
                    message.recipient,
                    e
                );
            }

            records.push(DeliveryRecord {
                channel: message.channel,
                recipient: message.recipient,
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            });
        }
    }

    records
}
