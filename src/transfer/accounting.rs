//! Accounting updater
//!
//! Applies a validated transfer inside the caller's transaction: debit,
//! credit, and today's limit-ledger entry. Nothing here is retried; any
//! failure leaves the transaction to be rolled back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::error::TransferError;
use super::locking::LockedPair;
use super::store::LedgerTx;
use super::types::DailyLimitRecord;
use crate::account::Account;

/// New state of every row a transfer touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub sender: Account,
    pub receiver: Account,
    pub daily: DailyLimitRecord,
}

/// Compute post-transfer balances and limit usage.
///
/// `today` is the sender's limit record for `limit_date`, if one exists; a
/// missing record starts at zero usage with the sender's current ceiling.
pub fn post(
    pair: &LockedPair,
    amount: Decimal,
    limit_date: NaiveDate,
    today: Option<DailyLimitRecord>,
) -> Result<Posting, TransferError> {
    let overflow = || TransferError::SystemError("Balance arithmetic overflow".into());

    let mut sender = pair.sender.clone();
    let mut receiver = pair.receiver.clone();
    sender.balance = sender.balance.checked_sub(amount).ok_or_else(overflow)?;
    receiver.balance = receiver.balance.checked_add(amount).ok_or_else(overflow)?;

    let mut daily = today
        .unwrap_or_else(|| DailyLimitRecord::open(&sender.iban, limit_date, sender.daily_limit));
    daily.used_amount = daily.used_amount.checked_add(amount).ok_or_else(overflow)?;
    daily.daily_limit = sender.daily_limit;

    Ok(Posting {
        sender,
        receiver,
        daily,
    })
}

/// Write a posting through the transaction
pub async fn apply(tx: &mut dyn LedgerTx, posting: &Posting) -> Result<(), TransferError> {
    tx.save_daily_limit(&posting.daily).await?;
    tx.save_account(&posting.sender).await?;
    tx.save_account(&posting.receiver).await?;
    debug!(
        sender = %posting.sender.iban,
        receiver = %posting.receiver.iban,
        used_today = %posting.daily.used_amount,
        "Posting applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountOwner, AccountStatus, Currency};
    use rust_decimal_macros::dec;

    fn account(iban: &str, balance: Decimal) -> Account {
        Account {
            account_id: 1,
            iban: iban.to_string(),
            balance,
            currency: Currency::Gbp,
            status: AccountStatus::Active,
            daily_limit: dec!(1000),
            is_active: true,
            owner: AccountOwner {
                user_id: 1,
                first_name: "Sam".into(),
                last_name: "Smith".into(),
                email: "sam@example.com".into(),
                is_active: true,
            },
        }
    }

    fn pair() -> LockedPair {
        LockedPair {
            sender: account("GB82WEST12345698765432", dec!(300.25)),
            receiver: account("NL91ABNA0417164300", dec!(10)),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[test]
    fn test_debit_equals_credit() {
        let pair = pair();
        let posting = post(&pair, dec!(100.1234), day(), None).unwrap();
        assert_eq!(posting.sender.balance, dec!(200.1266));
        assert_eq!(posting.receiver.balance, dec!(110.1234));
        assert_eq!(
            posting.sender.balance + posting.receiver.balance,
            pair.sender.balance + pair.receiver.balance
        );
    }

    #[test]
    fn test_first_transfer_of_day_opens_record() {
        let posting = post(&pair(), dec!(40), day(), None).unwrap();
        assert_eq!(posting.daily.iban, "GB82WEST12345698765432");
        assert_eq!(posting.daily.limit_date, day());
        assert_eq!(posting.daily.used_amount, dec!(40));
        assert_eq!(posting.daily.daily_limit, dec!(1000));
    }

    #[test]
    fn test_existing_record_accumulates() {
        let mut existing = DailyLimitRecord::open("GB82WEST12345698765432", day(), dec!(800));
        existing.used_amount = dec!(60);
        let posting = post(&pair(), dec!(40), day(), Some(existing)).unwrap();
        assert_eq!(posting.daily.used_amount, dec!(100));
        // Ceiling snapshot follows the account
        assert_eq!(posting.daily.daily_limit, dec!(1000));
    }

    #[test]
    fn test_overflow_is_system_error() {
        let mut pair = pair();
        pair.receiver.balance = Decimal::MAX;
        let err = post(&pair, dec!(1), day(), None).unwrap_err();
        assert!(matches!(err, TransferError::SystemError(_)));
    }
}
