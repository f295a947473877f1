use async_trait::async_trait;
use grocer_shared::models::events::OrderPlacedEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReceipt {
    pub sent_to: String,
}

/// Tells store staff that an order came in. Best-effort from the caller's side.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn notify(&self, event: &OrderPlacedEvent) -> Result<NotificationReceipt, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification service rejected the request ({status})")]
    Rejected {
        status: u16,
    },

    #[error("Notification timed out after {0:?}")]
    Timeout(Duration),
}
