//! Shared fixtures for unit and engine tests

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use crate::account::{Account, AccountOwner, AccountStatus, Currency};
use crate::transfer::store::MemoryLedgerStore;

pub const IBAN_GB: &str = "GB82WEST12345698765432";
pub const IBAN_DE: &str = "DE89370400440532013000";
pub const IBAN_NL: &str = "NL91ABNA0417164300";
pub const IBAN_TR: &str = "TR330006100519786457841326";

/// Clock that only moves when told to
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// 2026-10-01 09:00:00 UTC
    pub fn fixed() -> Arc<Self> {
        Arc::new(Self::new(
            Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
        ))
    }

    pub fn advance(&self, delta: Duration) {
        *self.lock_clock() += chrono::Duration::from_std(delta).unwrap();
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap()
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Active account in `currency` owned by `user_id`
pub fn account(iban: &str, user_id: i64, balance: Decimal, daily_limit: Decimal) -> Account {
    Account {
        account_id: user_id,
        iban: iban.to_string(),
        balance,
        currency: Currency::Eur,
        status: AccountStatus::Active,
        daily_limit,
        is_active: true,
        owner: AccountOwner {
            user_id,
            first_name: format!("First{}", user_id),
            last_name: format!("Last{}", user_id),
            email: format!("user{}@example.com", user_id),
            is_active: true,
        },
    }
}

/// Memory store with a short lock timeout
pub fn memory_store() -> Arc<MemoryLedgerStore> {
    Arc::new(MemoryLedgerStore::new(Duration::from_secs(2)))
}
