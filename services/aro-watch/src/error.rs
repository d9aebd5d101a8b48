//! Error types for the availability watcher

use crate::notifier::Channel;

/// Failures talking to the monitored site
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("{url} returned HTTP status {status}")]
    Status { url: String, status: u16 },
}

/// Errors that can occur in the availability watcher
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The listing markup could not be located; usually a site redesign
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Notification via {channel} failed: {message}")]
    Notification { channel: Channel, message: String },

    #[error("State error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WatchError {
    pub fn notification(channel: Channel, message: impl Into<String>) -> Self {
        WatchError::Notification {
            channel,
            message: message.into(),
        }
    }
}

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
