//! Transfer Coordinator
//!
//! Drives one transfer through `Requested → Locked → Validated → Accounted →
//! Recorded → Finalized`. Everything up to `Recorded` happens inside a single
//! store transaction; any error rolls the whole attempt back. Audit and
//! notification run only after commit and can never change the outcome.

use std::sync::Arc;

use mockable::Clock;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::accounting::{self, Posting};
use super::error::TransferError;
use super::locking::lock_pair;
use super::reference::{ReferenceSource, TimestampReference};
use super::state::{TransferStage, TransferStatus, TransferType};
use super::store::{LedgerStore, LedgerTx};
use super::types::{NewTransfer, TransferRecord, TransferRequest, TransferView};
use super::validator::{TransferCandidate, validate};
use crate::account::normalize_iban;
use crate::audit::{AuditEntry, AuditSink};
use crate::identity::CallerIdentity;
use crate::notification::{NotificationDispatcher, TransferEvent};

/// Transfer Coordinator - orchestrates one atomic transfer per call
pub struct TransferCoordinator {
    store: Arc<dyn LedgerStore>,
    audit: Arc<dyn AuditSink>,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    references: Arc<dyn ReferenceSource>,
}

impl TransferCoordinator {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        audit: Arc<dyn AuditSink>,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            audit,
            notifier,
            clock,
            references: Arc::new(TimestampReference),
        }
    }

    /// Replace the reference code source
    pub fn with_reference_source(mut self, references: Arc<dyn ReferenceSource>) -> Self {
        self.references = references;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Move `req.amount` from sender to receiver on behalf of `caller`
    pub async fn transfer(
        &self,
        req: TransferRequest,
        caller: &CallerIdentity,
    ) -> Result<TransferView, TransferError> {
        let sender_iban = normalize_iban(&req.sender_iban);
        let receiver_iban = normalize_iban(&req.receiver_iban);
        trace_stage(TransferStage::Requested, &sender_iban, &receiver_iban);

        // Cheap pre-check: no lock is taken for a self-transfer
        if sender_iban == receiver_iban {
            return Err(TransferError::InvalidArgument(
                "Cannot transfer to the same account".into(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let outcome = self
            .execute(tx.as_mut(), &req, &sender_iban, &receiver_iban, caller)
            .await;

        let (record, posting) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed transfer also failed");
                }
                debug!(
                    sender = %sender_iban,
                    receiver = %receiver_iban,
                    kind = e.code(),
                    error = %e,
                    "Transfer rejected"
                );
                return Err(e);
            }
        };

        tx.commit().await?;
        trace_stage(TransferStage::Finalized, &sender_iban, &receiver_iban);
        info!(
            reference = %record.reference_code,
            sender = %record.sender_iban,
            receiver = %record.receiver_iban,
            amount = %record.amount,
            currency = %record.currency,
            "Transfer completed"
        );

        self.after_commit(&record, &posting, caller).await;
        Ok(TransferView::from(record))
    }

    /// Steps inside the transaction; the caller commits or rolls back
    async fn execute(
        &self,
        tx: &mut dyn LedgerTx,
        req: &TransferRequest,
        sender_iban: &str,
        receiver_iban: &str,
        caller: &CallerIdentity,
    ) -> Result<(TransferRecord, Posting), TransferError> {
        let pair = lock_pair(tx, sender_iban, receiver_iban).await?;
        trace_stage(TransferStage::Locked, sender_iban, receiver_iban);

        let now = self.clock.utc();
        let today = now.date_naive();
        let today_record = tx.daily_limit(sender_iban, today).await?;
        let used_today = today_record
            .as_ref()
            .map_or(Decimal::ZERO, |r| r.used_amount);

        validate(&TransferCandidate {
            sender: &pair.sender,
            receiver: &pair.receiver,
            amount: req.amount,
            currency: req.currency,
            caller,
            used_today,
        })?;
        trace_stage(TransferStage::Validated, sender_iban, receiver_iban);

        let posting = accounting::post(&pair, req.amount, today, today_record)?;
        accounting::apply(tx, &posting).await?;
        trace_stage(TransferStage::Accounted, sender_iban, receiver_iban);

        let new_transfer = NewTransfer {
            external_id: Uuid::new_v4(),
            reference_code: self.references.next_reference(now),
            sender_iban: pair.sender.iban.clone(),
            receiver_iban: pair.receiver.iban.clone(),
            amount: req.amount,
            currency: pair.sender.currency,
            transfer_type: TransferType::Transfer,
            status: TransferStatus::Completed,
            description: req.description.clone(),
            created_at: now,
        };
        let record = tx.insert_transfer(&new_transfer).await?;
        trace_stage(TransferStage::Recorded, sender_iban, receiver_iban);

        Ok((record, posting))
    }

    /// Best-effort side effects; failures are logged only
    async fn after_commit(&self, record: &TransferRecord, posting: &Posting, caller: &CallerIdentity) {
        let entry = AuditEntry::transfer(caller, &record.reference_code, self.clock.utc());
        if let Err(e) = self.audit.record(&entry).await {
            error!(
                reference = %record.reference_code,
                error = %e,
                "Audit write failed; transfer stays committed"
            );
        }

        self.notifier.dispatch(TransferEvent {
            recipient_address: posting.sender.owner.email.clone(),
            recipient_name: posting.sender.owner.first_name.clone(),
            amount: record.amount,
            receiver_iban: record.receiver_iban.clone(),
            reference_code: record.reference_code.clone(),
        });
    }
}

#[inline]
fn trace_stage(stage: TransferStage, sender: &str, receiver: &str) {
    debug!(stage = %stage, sender = %sender, receiver = %receiver, "Transfer stage");
}
