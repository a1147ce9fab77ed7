//! In-memory ledger store
//!
//! Same transactional contract as the PostgreSQL store:
//! - row locks are per-account `tokio::sync::Mutex`es kept in a `DashMap`
//!   registry and held by the transaction until commit/rollback
//! - writes are staged in the transaction and applied under the table lock
//!   on commit, so readers never observe a half-applied transfer
//! - lock waits are bounded by the configured lock timeout

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use super::{DUPLICATE_REFERENCE, LedgerStore, LedgerTx};
use crate::account::Account;
use crate::transfer::error::{ACCOUNT_BUSY, TransferError};
use crate::transfer::types::{
    DailyLimitRecord, DailySpend, NewTransfer, Page, PageRequest, TransferDetails, TransferFilter,
    TransferId, TransferRecord, TransferSummary,
};

type LimitKey = (String, NaiveDate);

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    limits: HashMap<LimitKey, DailyLimitRecord>,
    transfers: Vec<TransferRecord>,
}

impl Tables {
    fn reference_taken(&self, transfer: &TransferRecord) -> bool {
        self.transfers.iter().any(|t| {
            t.reference_code == transfer.reference_code || t.external_id == transfer.external_id
        })
    }
}

/// In-memory [`LedgerStore`]
pub struct MemoryLedgerStore {
    tables: Arc<Mutex<Tables>>,
    row_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    next_transfer_id: Arc<AtomicI64>,
    lock_timeout: Duration,
}

impl MemoryLedgerStore {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            row_locks: Arc::new(DashMap::new()),
            next_transfer_id: Arc::new(AtomicI64::new(1)),
            lock_timeout,
        }
    }

    /// Open an account (account lifecycle lives outside the engine)
    pub async fn insert_account(&self, account: Account) {
        let mut tables = self.tables.lock().await;
        tables.accounts.insert(account.iban.clone(), account);
    }

    /// Flip a user's active flag on every account they own
    pub async fn set_user_active(&self, user_id: i64, is_active: bool) {
        let mut tables = self.tables.lock().await;
        for account in tables.accounts.values_mut() {
            if account.owner.user_id == user_id {
                account.owner.is_active = is_active;
            }
        }
    }

    /// Append a historical transfer record directly (imports, fixtures)
    pub async fn import_transfer(&self, transfer: &NewTransfer) -> Result<TransferRecord, TransferError> {
        let record = TransferRecord::from_new(self.next_id(), transfer);
        let mut tables = self.tables.lock().await;
        if tables.reference_taken(&record) {
            return Err(TransferError::Conflict(DUPLICATE_REFERENCE.into()));
        }
        tables.transfers.push(record.clone());
        Ok(record)
    }

    /// Sum of all balances (conservation checks)
    pub async fn total_balance(&self) -> Decimal {
        let tables = self.tables.lock().await;
        tables.accounts.values().map(|a| a.balance).sum()
    }

    pub async fn transfer_count(&self) -> usize {
        self.tables.lock().await.transfers.len()
    }

    fn next_id(&self) -> TransferId {
        self.next_transfer_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, TransferError> {
        Ok(Box::new(MemoryTx {
            tables: self.tables.clone(),
            row_locks: self.row_locks.clone(),
            next_transfer_id: self.next_transfer_id.clone(),
            lock_timeout: self.lock_timeout,
            held: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_limits: HashMap::new(),
            staged_transfers: Vec::new(),
        }))
    }

    async fn find_account(&self, iban: &str) -> Result<Option<Account>, TransferError> {
        Ok(self.tables.lock().await.accounts.get(iban).cloned())
    }

    async fn find_transfer(
        &self,
        id: TransferId,
    ) -> Result<Option<TransferDetails>, TransferError> {
        let tables = self.tables.lock().await;
        let Some(record) = tables.transfers.iter().find(|t| t.transfer_id == id) else {
            return Ok(None);
        };
        let owner_of = |iban: &str| {
            tables
                .accounts
                .get(iban)
                .map(|a| a.owner.clone())
                .ok_or_else(|| {
                    TransferError::SystemError(format!("Transfer {} references unknown account", id))
                })
        };
        Ok(Some(TransferDetails {
            sender: owner_of(&record.sender_iban)?,
            receiver: owner_of(&record.receiver_iban)?,
            record: record.clone(),
        }))
    }

    async fn list_transfers(
        &self,
        iban: &str,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<Page<TransferRecord>, TransferError> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<&TransferRecord> = tables
            .transfers
            .iter()
            .filter(|t| t.involves(iban) && filter.matches(t))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.transfer_id.cmp(&a.transfer_id))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn summarize(&self, iban: &str) -> Result<TransferSummary, TransferError> {
        let tables = self.tables.lock().await;
        let mut summary = TransferSummary {
            total_sent: Decimal::ZERO,
            total_received: Decimal::ZERO,
            count: 0,
        };
        for t in tables.transfers.iter().filter(|t| t.involves(iban)) {
            if t.sender_iban == iban {
                summary.total_sent += t.amount;
            }
            if t.receiver_iban == iban {
                summary.total_received += t.amount;
            }
            summary.count += 1;
        }
        Ok(summary)
    }

    async fn outgoing_transfers(&self, iban: &str) -> Result<Vec<TransferRecord>, TransferError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transfers
            .iter()
            .filter(|t| t.sender_iban == iban)
            .cloned()
            .collect())
    }

    async fn daily_outgoing_since(
        &self,
        iban: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailySpend>, TransferError> {
        let tables = self.tables.lock().await;
        let mut per_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for t in tables
            .transfers
            .iter()
            .filter(|t| t.sender_iban == iban && t.created_at >= since)
        {
            *per_day.entry(t.created_at.date_naive()).or_default() += t.amount;
        }
        Ok(per_day
            .into_iter()
            .map(|(date, total_amount)| DailySpend { date, total_amount })
            .collect())
    }

    async fn daily_limit(
        &self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError> {
        let tables = self.tables.lock().await;
        Ok(tables.limits.get(&(iban.to_string(), date)).cloned())
    }
}

/// In-memory transaction
pub struct MemoryTx {
    tables: Arc<Mutex<Tables>>,
    row_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    next_transfer_id: Arc<AtomicI64>,
    lock_timeout: Duration,
    held: HashMap<String, OwnedMutexGuard<()>>,
    staged_accounts: HashMap<String, Account>,
    staged_limits: HashMap<LimitKey, DailyLimitRecord>,
    staged_transfers: Vec<TransferRecord>,
}

impl MemoryTx {
    fn ensure_locked(&self, iban: &str) -> Result<(), TransferError> {
        if self.held.contains_key(iban) {
            Ok(())
        } else {
            Err(TransferError::SystemError(format!(
                "Write to account {} without holding its row lock",
                iban
            )))
        }
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_for_update(&mut self, iban: &str) -> Result<Option<Account>, TransferError> {
        if let Some(account) = self.staged_accounts.get(iban) {
            return Ok(Some(account.clone()));
        }

        if !self.held.contains_key(iban) {
            if !self.tables.lock().await.accounts.contains_key(iban) {
                return Ok(None);
            }

            let row_lock = self
                .row_locks
                .entry(iban.to_string())
                .or_default()
                .value()
                .clone();
            let guard = tokio::time::timeout(self.lock_timeout, row_lock.lock_owned())
                .await
                .map_err(|_| {
                    warn!(iban = %iban, timeout = ?self.lock_timeout, "Row lock wait timed out");
                    TransferError::ServiceUnavailable(ACCOUNT_BUSY.into())
                })?;
            self.held.insert(iban.to_string(), guard);
        }

        // Re-read after acquiring: the previous holder may have committed
        Ok(self.tables.lock().await.accounts.get(iban).cloned())
    }

    async fn daily_limit(
        &mut self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError> {
        let key = (iban.to_string(), date);
        if let Some(record) = self.staged_limits.get(&key) {
            return Ok(Some(record.clone()));
        }
        Ok(self.tables.lock().await.limits.get(&key).cloned())
    }

    async fn save_daily_limit(&mut self, record: &DailyLimitRecord) -> Result<(), TransferError> {
        self.ensure_locked(&record.iban)?;
        self.staged_limits.insert(
            (record.iban.clone(), record.limit_date),
            record.clone(),
        );
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), TransferError> {
        self.ensure_locked(&account.iban)?;
        if account.balance < Decimal::ZERO {
            return Err(TransferError::DatabaseError(format!(
                "balance check violated for account {}",
                account.iban
            )));
        }
        self.staged_accounts
            .insert(account.iban.clone(), account.clone());
        Ok(())
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, TransferError> {
        if transfer.amount <= Decimal::ZERO {
            return Err(TransferError::DatabaseError(
                "amount check violated for transfer".into(),
            ));
        }

        let record = TransferRecord::from_new(
            self.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            transfer,
        );
        let staged_dup = self.staged_transfers.iter().any(|t| {
            t.reference_code == record.reference_code || t.external_id == record.external_id
        });
        if staged_dup || self.tables.lock().await.reference_taken(&record) {
            return Err(TransferError::Conflict(DUPLICATE_REFERENCE.into()));
        }

        self.staged_transfers.push(record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> Result<(), TransferError> {
        let MemoryTx {
            tables,
            held,
            staged_accounts,
            staged_limits,
            staged_transfers,
            ..
        } = *self;

        {
            let mut tables = tables.lock().await;
            // Concurrent transactions share no row lock on the reference code
            if staged_transfers.iter().any(|t| tables.reference_taken(t)) {
                return Err(TransferError::Conflict(DUPLICATE_REFERENCE.into()));
            }

            tables.accounts.extend(staged_accounts);
            tables.limits.extend(staged_limits);
            tables.transfers.extend(staged_transfers);
        }

        debug!(released = held.len(), "Memory transaction committed");
        drop(held);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransferError> {
        debug!(
            released = self.held.len(),
            discarded = self.staged_transfers.len(),
            "Memory transaction rolled back"
        );
        Ok(())
    }
}
