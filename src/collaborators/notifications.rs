use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CollaboratorError, NotificationTransport};
use crate::types::{Notification, NotificationChannel};

/// Transport that records deliveries in the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

#[async_trait]
impl NotificationTransport for TracingTransport {
    async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        message: &str,
    ) -> Result<bool, CollaboratorError> {
        info!(
            notification.channel = %channel,
            notification.recipient = recipient,
            notification.message = message,
            "Notification sent"
        );
        Ok(true)
    }
}

/// Sends through a transport and turns the result into an audit record.
/// Delivery failures are logged and recorded, never propagated.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn NotificationTransport>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    pub async fn send(
        &self,
        channel: NotificationChannel,
        recipient: &str,
        message: impl Into<String>,
    ) -> Notification {
        let message = message.into();
        let delivered = match self.transport.send(channel, recipient, &message).await {
            Ok(delivered) => {
                if !delivered {
                    warn!(
                        notification.channel = %channel,
                        notification.recipient = recipient,
                        "Notification transport reported non-delivery"
                    );
                }
                delivered
            }
            Err(e) => {
                warn!(
                    notification.channel = %channel,
                    notification.recipient = recipient,
                    error = %e,
                    "Notification transport failed"
                );
                false
            }
        };

        Notification {
            id: format!("NOT-{}", uuid::Uuid::new_v4().simple()),
            channel,
            recipient: recipient.to_string(),
            message,
            sent_at: Utc::now(),
            delivered,
        }
    }

    /// Same message to every recipient
    pub async fn broadcast(
        &self,
        channel: NotificationChannel,
        recipients: &[String],
        message: &str,
    ) -> Vec<Notification> {
        let mut sent = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            sent.push(self.send(channel, recipient, message).await);
        }
        sent
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("transport", &"Arc<dyn NotificationTransport>")
            .finish()
    }
}
