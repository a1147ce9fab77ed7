//! Transfer receipts
//!
//! [`ReceiptService`] looks up a transfer, checks the caller is one of its
//! parties (or admin), then renders it through a [`ReceiptRenderer`] guarded
//! by a bounded retry and a circuit breaker. Breaker-open and exhausted
//! retries both surface as `ServiceUnavailable`.

pub mod breaker;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use retry::{BackoffJitter, NoJitter, RandomJitter, RetryPolicy};

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::identity::CallerIdentity;
use crate::money::format_amount;
use crate::transfer::error::TransferError;
use crate::transfer::store::LedgerStore;
use crate::transfer::types::{TransferDetails, TransferId};

pub const RECEIPT_UNAVAILABLE: &str = "Receipt generation temporarily unavailable";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// Worth retrying (timeouts, busy backends)
    #[error("Transient render failure: {0}")]
    Transient(String),

    /// Retrying will not help
    #[error("Fatal render failure: {0}")]
    Fatal(String),
}

/// Document renderer collaborator
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    async fn render(&self, details: &TransferDetails) -> Result<Vec<u8>, RenderError>;
}

/// Rendered receipt document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub reference_code: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

// ============================================================================
// Plain-text renderer
// ============================================================================

const RULE: &str = "==================================================";

/// Renders a fixed-width plain-text receipt
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextReceiptRenderer;

impl PlainTextReceiptRenderer {
    pub fn render_text(details: &TransferDetails) -> String {
        let record = &details.record;
        let description = record
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("-");
        let rows = [
            ("Transaction Reference", record.reference_code.clone()),
            ("Date", record.created_at.format("%d.%m.%Y %H:%M").to_string()),
            ("Sender Name", details.sender.display_name()),
            ("Sender IBAN", record.sender_iban.clone()),
            ("Receiver Name", details.receiver.display_name()),
            ("Receiver IBAN", record.receiver_iban.clone()),
            (
                "Amount",
                format!("{} {}", format_amount(record.amount), record.currency),
            ),
            ("Description", description.to_string()),
            ("Status", record.status.to_string()),
        ];

        let body: String = rows
            .iter()
            .map(|(label, value)| format!("{:<22}: {}\n", label, value))
            .collect();
        format!(
            "BANK TRANSACTION RECEIPT\n{RULE}\n{body}{RULE}\n\
             This receipt is computer-generated and does not require a signature.\n"
        )
    }
}

#[async_trait]
impl ReceiptRenderer for PlainTextReceiptRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    async fn render(&self, details: &TransferDetails) -> Result<Vec<u8>, RenderError> {
        Ok(Self::render_text(details).into_bytes())
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct ReceiptService {
    store: Arc<dyn LedgerStore>,
    renderer: Arc<dyn ReceiptRenderer>,
    breaker: Mutex<CircuitBreaker>,
    retry: RetryPolicy,
    jitter: Arc<dyn BackoffJitter>,
    clock: Arc<dyn Clock>,
}

impl ReceiptService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        renderer: Arc<dyn ReceiptRenderer>,
        breaker: BreakerConfig,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            renderer,
            breaker: Mutex::new(CircuitBreaker::new(breaker)),
            retry,
            jitter: Arc::new(RandomJitter),
            clock,
        }
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn BackoffJitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().await.state()
    }

    /// Receipt for one transfer; only its sender, its receiver, or an admin
    pub async fn receipt(
        &self,
        id: TransferId,
        caller: &CallerIdentity,
    ) -> Result<Receipt, TransferError> {
        let details = self
            .store
            .find_transfer(id)
            .await?
            .ok_or_else(|| TransferError::NotFound(format!("Transfer not found: {}", id)))?;

        let is_party = details.sender.user_id == caller.user_id
            || details.receiver.user_id == caller.user_id;
        if !(caller.is_admin() || is_party) {
            return Err(TransferError::Forbidden(
                "You are not authorized to view this receipt".into(),
            ));
        }

        let bytes = self.render_guarded(&details).await?;
        Ok(Receipt {
            reference_code: details.record.reference_code,
            content_type: self.renderer.content_type(),
            bytes,
        })
    }

    async fn render_guarded(&self, details: &TransferDetails) -> Result<Vec<u8>, TransferError> {
        let reference = details.record.reference_code.as_str();
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if !self.breaker.lock().await.admit(self.clock.utc()) {
                warn!(reference = %reference, "Receipt breaker open, failing fast");
                return Err(TransferError::ServiceUnavailable(RECEIPT_UNAVAILABLE.into()));
            }

            match self.renderer.render(details).await {
                Ok(bytes) => {
                    self.breaker.lock().await.record_success();
                    debug!(reference = %reference, attempt, "Receipt rendered");
                    return Ok(bytes);
                }
                Err(RenderError::Fatal(msg)) => {
                    self.breaker.lock().await.record_failure(self.clock.utc());
                    error!(reference = %reference, error = %msg, "Receipt rendering failed");
                    return Err(TransferError::SystemError(format!(
                        "Receipt rendering failed: {}",
                        msg
                    )));
                }
                Err(RenderError::Transient(msg)) => {
                    self.breaker.lock().await.record_failure(self.clock.utc());
                    if attempt >= max_attempts {
                        warn!(
                            reference = %reference,
                            attempts = attempt,
                            error = %msg,
                            "Receipt retries exhausted"
                        );
                        return Err(TransferError::ServiceUnavailable(
                            RECEIPT_UNAVAILABLE.into(),
                        ));
                    }
                    let delay = self
                        .jitter
                        .jittered_delay(self.retry.base_delay(attempt), attempt);
                    debug!(
                        reference = %reference,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %msg,
                        "Retrying receipt rendering"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
