//! Transfer notifications
//!
//! After a transfer commits, a [`TransferEvent`] is handed to the
//! [`NotificationDispatcher`], which publishes it on a background task. The
//! transfer never waits for, or fails because of, the publish.
//!
//! The consumer side ([`worker::NotificationWorker`]) turns events into
//! emails independently of the transfer path.

pub mod channel;
pub mod worker;

pub use channel::{ChannelPublisher, Envelope, EventReceiver, event_channel};
pub use worker::{Email, LogMailer, MailError, Mailer, NotificationWorker};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Default topic for transfer events
pub const TRANSFER_TOPIC: &str = "transfer-notifications";

/// "Transfer occurred" event, addressed to the sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub recipient_address: String,
    pub recipient_name: String,
    pub amount: Decimal,
    pub receiver_iban: String,
    pub reference_code: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Notification channel is full")]
    ChannelFull,

    #[error("Notification channel is closed")]
    ChannelClosed,
}

/// Fire-and-forget publish to an external channel
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &TransferEvent) -> Result<(), PublishError>;
}

/// Publishes events on background tasks, swallowing every failure
#[derive(Clone)]
pub struct NotificationDispatcher {
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    publish_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        topic: impl Into<String>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            publish_timeout,
        }
    }

    /// Spawn the publish and return immediately.
    ///
    /// The handle is only useful to tests; the task never reports an error.
    pub fn dispatch(&self, event: TransferEvent) -> JoinHandle<()> {
        let publisher = self.publisher.clone();
        let topic = self.topic.clone();
        let publish_timeout = self.publish_timeout;

        tokio::spawn(async move {
            let reference = event.reference_code.clone();
            match tokio::time::timeout(publish_timeout, publisher.publish(&topic, &event)).await {
                Ok(Ok(())) => debug!(reference = %reference, topic = %topic, "Transfer event published"),
                Ok(Err(e)) => error!(
                    reference = %reference,
                    topic = %topic,
                    error = %e,
                    "Failed to publish transfer event"
                ),
                Err(_) => warn!(
                    reference = %reference,
                    topic = %topic,
                    timeout_ms = publish_timeout.as_millis() as u64,
                    "Transfer event publish timed out"
                ),
            }
        })
    }
}
