//! Notification Worker
//!
//! Consumes transfer events from the channel and sends one email per event.
//! Failures are logged and dropped; they never reach the transfer path.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::TransferEvent;
use super::channel::{Envelope, EventReceiver};
use crate::money::format_amount;

/// Outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    pub fn for_transfer(event: &TransferEvent) -> Self {
        Self {
            to: event.recipient_address.clone(),
            subject: format!("Transfer Notification - Ref: {}", event.reference_code),
            body: format!(
                "Hello {},\n\n\
                 Your transfer of {} to {} has been completed successfully.\n\
                 Reference: {}\n\n\
                 Thank you for banking with us.",
                event.recipient_name,
                format_amount(event.amount),
                event.receiver_iban,
                event.reference_code
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Writes emails to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if !email.to.contains('@') {
            return Err(MailError::InvalidRecipient(email.to.clone()));
        }
        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Notification Worker
pub struct NotificationWorker {
    receiver: EventReceiver,
    mailer: Arc<dyn Mailer>,
    topic: String,
}

impl NotificationWorker {
    pub fn new(receiver: EventReceiver, mailer: Arc<dyn Mailer>, topic: impl Into<String>) -> Self {
        Self {
            receiver,
            mailer,
            topic: topic.into(),
        }
    }

    /// Run until every publisher has been dropped.
    ///
    /// Returns the number of emails sent.
    pub async fn run(mut self) -> usize {
        info!(topic = %self.topic, "Starting notification worker");
        let mut sent = 0;
        while let Some(envelope) = self.receiver.recv().await {
            if self.handle(envelope).await {
                sent += 1;
            }
        }
        info!(sent, "Notification channel closed, worker stopping");
        sent
    }

    /// Process whatever is queued right now, up to `max_per_batch`
    pub async fn drain(&mut self, max_per_batch: usize) -> usize {
        let mut sent = 0;
        for _ in 0..max_per_batch {
            let Some(envelope) = self.receiver.try_recv() else {
                break;
            };
            if self.handle(envelope).await {
                sent += 1;
            }
        }
        sent
    }

    /// Returns true when an email went out
    async fn handle(&self, envelope: Envelope) -> bool {
        if envelope.topic != self.topic {
            debug!(topic = %envelope.topic, "Ignoring envelope for other topic");
            return false;
        }

        let event: TransferEvent = match serde_json::from_str(&envelope.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable transfer event");
                return false;
            }
        };

        let email = Email::for_transfer(&event);
        match self.mailer.send(&email).await {
            Ok(()) => {
                debug!(reference = %event.reference_code, "Transfer notification delivered");
                true
            }
            Err(e) => {
                error!(
                    reference = %event.reference_code,
                    error = %e,
                    "Failed to send transfer notification"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{EventPublisher, event_channel};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<Email>>);

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            self.0.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn event() -> TransferEvent {
        TransferEvent {
            recipient_address: "ada@example.com".into(),
            recipient_name: "Ada".into(),
            amount: dec!(75),
            receiver_iban: "DE89370400440532013000".into(),
            reference_code: "TX-9-ABCDE".into(),
        }
    }

    #[test]
    fn test_email_content() {
        let email = Email::for_transfer(&event());
        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, "Transfer Notification - Ref: TX-9-ABCDE");
        assert!(email.body.starts_with("Hello Ada,"));
        assert!(email.body.contains("75.00"));
        assert!(email.body.contains("DE89370400440532013000"));
    }

    #[tokio::test]
    async fn test_worker_sends_one_email_per_event() {
        let (publisher, receiver) = event_channel(8);
        let outbox = Arc::new(Outbox::default());
        let worker = NotificationWorker::new(receiver, outbox.clone(), "transfers");

        publisher.publish("transfers", &event()).await.unwrap();
        publisher.publish("other", &event()).await.unwrap();
        drop(publisher);

        assert_eq!(worker.run().await, 1);
        assert_eq!(outbox.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drain_processes_queued_only() {
        let (publisher, receiver) = event_channel(8);
        let mut worker = NotificationWorker::new(receiver, Arc::new(LogMailer), "transfers");
        publisher.publish("transfers", &event()).await.unwrap();

        assert_eq!(worker.drain(10).await, 1);
        assert_eq!(worker.drain(10).await, 0);
    }

    #[tokio::test]
    async fn test_log_mailer_rejects_bad_address() {
        let mut email = Email::for_transfer(&event());
        email.to = "nobody".into();
        assert!(matches!(
            LogMailer.send(&email).await,
            Err(MailError::InvalidRecipient(_))
        ));
    }
}
