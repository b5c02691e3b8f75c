//! SMS and WhatsApp alert dispatch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::ClientError;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Validation(String),

    /// The provider rejected the message; carries its explanation.
    #[error("Twilio API error: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Provider(ClientError),
}

impl From<ClientError> for NotificationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status {
                status, message, ..
            } => Self::Rejected { status, message },
            other => Self::Provider(other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Sms,
    Whatsapp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub channel: Channel,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertReceipt {
    pub success: bool,
    pub message_id: String,
    pub delivery_status: String,
    pub cost: f64,
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_alert(&self, request: &AlertRequest) -> Result<AlertReceipt, NotificationError>;
}
