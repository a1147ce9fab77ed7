//! Ledger storage seam
//!
//! [`LedgerStore`] is the read side plus the entry point into a transaction.
//! [`LedgerTx`] is one atomic unit: row locks taken through it are held until
//! `commit` or `rollback`, and nothing written through it is visible to other
//! transactions before `commit`. Dropping a transaction rolls it back.
//!
//! The lock ordering rule lives in [`super::locking`], not here.

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::error::TransferError;
use super::types::{
    DailyLimitRecord, DailySpend, NewTransfer, Page, PageRequest, TransferDetails, TransferFilter,
    TransferId, TransferRecord, TransferSummary,
};
use crate::account::Account;

/// Unique-constraint message shared by both stores
pub(crate) const DUPLICATE_REFERENCE: &str = "Transfer reference code already exists";

/// Read access and transaction factory
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Start a new atomic unit
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, TransferError>;

    /// Account with its owner, without locking
    async fn find_account(&self, iban: &str) -> Result<Option<Account>, TransferError>;

    /// Transfer with both parties' owners
    async fn find_transfer(&self, id: TransferId)
    -> Result<Option<TransferDetails>, TransferError>;

    /// Transfers where `iban` is sender or receiver, newest first
    async fn list_transfers(
        &self,
        iban: &str,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<Page<TransferRecord>, TransferError>;

    /// Sent/received totals and transfer count for one account
    async fn summarize(&self, iban: &str) -> Result<TransferSummary, TransferError>;

    /// Every transfer sent by `iban`
    async fn outgoing_transfers(&self, iban: &str) -> Result<Vec<TransferRecord>, TransferError>;

    /// Outgoing totals per UTC day for transfers created at or after `since`,
    /// ascending by date
    async fn daily_outgoing_since(
        &self,
        iban: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailySpend>, TransferError>;

    /// Committed daily limit record, without locking
    async fn daily_limit(
        &self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError>;
}

/// One atomic unit of ledger writes
#[async_trait]
pub trait LedgerTx: Send {
    /// Exclusive row lock on an account; `None` if the account does not exist.
    ///
    /// Blocks until the lock is free or the configured lock timeout expires
    /// (`ServiceUnavailable`).
    async fn lock_for_update(&mut self, iban: &str) -> Result<Option<Account>, TransferError>;

    /// Daily limit record as seen by this transaction.
    ///
    /// Only called while the account's row lock is held, which orders all
    /// access to the record.
    async fn daily_limit(
        &mut self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError>;

    /// Insert or update a daily limit record
    async fn save_daily_limit(&mut self, record: &DailyLimitRecord) -> Result<(), TransferError>;

    /// Persist a locked account's balance
    async fn save_account(&mut self, account: &Account) -> Result<(), TransferError>;

    /// Append a transfer record; duplicate reference codes are `Conflict`
    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, TransferError>;

    async fn commit(self: Box<Self>) -> Result<(), TransferError>;

    async fn rollback(self: Box<Self>) -> Result<(), TransferError>;
}
