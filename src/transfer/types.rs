//! Transfer Types
//!
//! Core data structures of the transfer engine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{TransferStatus, TransferType};
use crate::account::{AccountOwner, Currency, normalize_iban};

/// Internal storage key of a transfer record
pub type TransferId = i64;

// ============================================================================
// Requests
// ============================================================================

/// Transfer request as accepted by the engine
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: Decimal,
    /// Expected currency; `None` means "the sender account's currency"
    pub currency: Option<Currency>,
    pub description: Option<String>,
}

impl TransferRequest {
    pub fn new(sender_iban: &str, receiver_iban: &str, amount: Decimal) -> Self {
        Self {
            sender_iban: normalize_iban(sender_iban),
            receiver_iban: normalize_iban(receiver_iban),
            amount,
            currency: None,
            description: None,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sender and receiver name the same account
    pub fn is_self_transfer(&self) -> bool {
        normalize_iban(&self.sender_iban) == normalize_iban(&self.receiver_iban)
    }
}

// ============================================================================
// Records
// ============================================================================

/// Transfer row about to be inserted
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub external_id: Uuid,
    pub reference_code: String,
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub transfer_type: TransferType,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persisted, immutable transfer record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub transfer_id: TransferId,
    pub external_id: Uuid,
    pub reference_code: String,
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub transfer_type: TransferType,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn from_new(transfer_id: TransferId, new: &NewTransfer) -> Self {
        Self {
            transfer_id,
            external_id: new.external_id,
            reference_code: new.reference_code.clone(),
            sender_iban: new.sender_iban.clone(),
            receiver_iban: new.receiver_iban.clone(),
            amount: new.amount,
            currency: new.currency,
            transfer_type: new.transfer_type,
            status: new.status,
            description: new.description.clone(),
            created_at: new.created_at,
        }
    }

    /// Account is sender or receiver of this transfer
    pub fn involves(&self, iban: &str) -> bool {
        self.sender_iban == iban || self.receiver_iban == iban
    }
}

/// Transfer record joined with both parties (receipt rendering, access checks)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDetails {
    pub record: TransferRecord,
    pub sender: AccountOwner,
    pub receiver: AccountOwner,
}

/// Per-account, per-day running total of outgoing transfers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLimitRecord {
    pub iban: String,
    pub limit_date: NaiveDate,
    pub used_amount: Decimal,
    /// Ceiling snapshot taken from the account on last update
    pub daily_limit: Decimal,
}

impl DailyLimitRecord {
    /// Fresh record for the first transfer of the day
    pub fn open(iban: &str, limit_date: NaiveDate, daily_limit: Decimal) -> Self {
        Self {
            iban: iban.to_string(),
            limit_date,
            used_amount: Decimal::ZERO,
            daily_limit,
        }
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Zero-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Build a request with the size clamped to `1..=MAX_SIZE`
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let size = u64::from(request.size);
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_items.div_ceil(size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// History filter; every bound is inclusive and optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TransferFilter {
    pub fn matches(&self, record: &TransferRecord) -> bool {
        self.min_amount.is_none_or(|min| record.amount >= min)
            && self.max_amount.is_none_or(|max| record.amount <= max)
            && self.start.is_none_or(|start| record.created_at >= start)
            && self.end.is_none_or(|end| record.created_at <= end)
    }
}

/// Totals for one account across all its transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub total_sent: Decimal,
    pub total_received: Decimal,
    pub count: u64,
}

/// Outgoing total for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub total_amount: Decimal,
}

// ============================================================================
// Response View
// ============================================================================

/// Client-facing view of a transfer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferView {
    pub id: TransferId,
    pub external_id: Uuid,
    pub reference_code: String,
    pub sender_iban: String,
    pub receiver_iban: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub transfer_type: TransferType,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TransferRecord> for TransferView {
    fn from(record: TransferRecord) -> Self {
        Self {
            id: record.transfer_id,
            external_id: record.external_id,
            reference_code: record.reference_code,
            sender_iban: record.sender_iban,
            receiver_iban: record.receiver_iban,
            amount: record.amount,
            currency: record.currency,
            transfer_type: record.transfer_type,
            status: record.status,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(amount: Decimal, created_at: DateTime<Utc>) -> TransferRecord {
        TransferRecord {
            transfer_id: 1,
            external_id: Uuid::new_v4(),
            reference_code: "TX-1-ABCDE".to_string(),
            sender_iban: "A".to_string(),
            receiver_iban: "B".to_string(),
            amount,
            currency: Currency::Eur,
            transfer_type: TransferType::Transfer,
            status: TransferStatus::Completed,
            description: None,
            created_at,
        }
    }

    #[test]
    fn test_self_transfer_detection_normalizes() {
        let req = TransferRequest::new("nl91 abna 0417 1643 00", "NL91ABNA0417164300", dec!(1));
        assert!(req.is_self_transfer());
        let req = TransferRequest::new("NL91ABNA0417164300", "DE89370400440532013000", dec!(1));
        assert!(!req.is_self_transfer());
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0).size, 1);
        assert_eq!(PageRequest::new(0, 1000).size, PageRequest::MAX_SIZE);
        assert_eq!(PageRequest::new(3, 20).offset(), 60);
    }

    #[test]
    fn test_page_counts() {
        let page: Page<u8> = Page::new(vec![1, 2], PageRequest::new(0, 2), 5);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], PageRequest::new(0, 2), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let filter = TransferFilter {
            min_amount: Some(dec!(10)),
            max_amount: Some(dec!(20)),
            start: Some(t0),
            end: Some(t0),
        };
        assert!(filter.matches(&record(dec!(10), t0)));
        assert!(filter.matches(&record(dec!(20), t0)));
        assert!(!filter.matches(&record(dec!(20.01), t0)));
        assert!(!filter.matches(&record(dec!(15), t0 + chrono::Duration::seconds(1))));
        assert!(TransferFilter::default().matches(&record(dec!(999), t0)));
    }
}
