use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

/// Outbound channel for booking confirmations. Delivery is one-shot;
/// callers never retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
