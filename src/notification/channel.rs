//! In-process notification channel
//!
//! Bounded `mpsc` pair standing in for an external message broker. Publishing
//! never waits: a full queue is reported as `ChannelFull`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{EventPublisher, PublishError, TransferEvent};

/// Message as it travels on the channel: topic plus JSON payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub payload: String,
}

/// Producer side, used by the dispatcher
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<Envelope>,
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, topic: &str, event: &TransferEvent) -> Result<(), PublishError> {
        let envelope = Envelope {
            topic: topic.to_string(),
            payload: serde_json::to_string(event)?,
        };
        self.tx.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::ChannelFull,
            TrySendError::Closed(_) => PublishError::ChannelClosed,
        })
    }
}

/// Consumer side, owned by the notification worker
pub struct EventReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl EventReceiver {
    /// Try to receive an envelope (non-blocking)
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Receive an envelope (waits until one arrives or every publisher is gone)
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// Create a new publisher/receiver pair
pub fn event_channel(capacity: usize) -> (ChannelPublisher, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelPublisher { tx }, EventReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(reference: &str) -> TransferEvent {
        TransferEvent {
            recipient_address: "ada@example.com".into(),
            recipient_name: "Ada".into(),
            amount: dec!(1),
            receiver_iban: "NL91ABNA0417164300".into(),
            reference_code: reference.into(),
        }
    }

    #[tokio::test]
    async fn test_envelope_carries_json_payload() {
        let (publisher, mut receiver) = event_channel(4);
        publisher.publish("topic-a", &event("TX-1-AAAAA")).await.unwrap();

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.topic, "topic-a");
        let decoded: TransferEvent = serde_json::from_str(&envelope.payload).unwrap();
        assert_eq!(decoded, event("TX-1-AAAAA"));
    }

    #[tokio::test]
    async fn test_full_channel_does_not_block() {
        let (publisher, _receiver) = event_channel(1);
        publisher.publish("t", &event("TX-1-AAAAA")).await.unwrap();
        let err = publisher.publish("t", &event("TX-2-BBBBB")).await.unwrap_err();
        assert!(matches!(err, PublishError::ChannelFull));
    }

    #[tokio::test]
    async fn test_closed_channel_reported() {
        let (publisher, receiver) = event_channel(1);
        drop(receiver);
        let err = publisher.publish("t", &event("TX-1-AAAAA")).await.unwrap_err();
        assert!(matches!(err, PublishError::ChannelClosed));
    }
}
