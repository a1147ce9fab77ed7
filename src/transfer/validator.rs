//! Business rule validation
//!
//! Pure function over already-locked account state. Rules run in a fixed
//! order and the first failure wins:
//!
//! 1. caller owns the sender account (or is admin)      → `Forbidden`
//! 2. amount is positive and fits the storage scale      → `InvalidArgument`
//! 3. sender and receiver differ                         → `InvalidArgument`
//! 4. both accounts `Active` with the active flag set     → `InvalidState`
//! 5. receiver's owning user is active                   → `InvalidState`
//! 6. currencies match (and match the requested one)     → `Unsupported`
//! 7. sender balance covers the amount                   → `InsufficientFunds`
//! 8. today's usage plus the amount stays within limit   → `LimitExceeded`

use rust_decimal::Decimal;

use super::error::TransferError;
use crate::account::{Account, Currency};
use crate::identity::CallerIdentity;
use crate::money::check_scale;

/// Everything the rules look at
#[derive(Debug, Clone, Copy)]
pub struct TransferCandidate<'a> {
    pub sender: &'a Account,
    pub receiver: &'a Account,
    pub amount: Decimal,
    /// Currency named by the request, if any
    pub currency: Option<Currency>,
    pub caller: &'a CallerIdentity,
    /// Sender's outgoing total already recorded for today
    pub used_today: Decimal,
}

/// Run every rule in order
pub fn validate(candidate: &TransferCandidate<'_>) -> Result<(), TransferError> {
    let TransferCandidate {
        sender,
        receiver,
        amount,
        currency,
        caller,
        used_today,
    } = *candidate;

    if !caller.is_owner(sender) {
        return Err(TransferError::Forbidden(
            "You are not authorized to transfer from this account".into(),
        ));
    }

    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidArgument(
            "Transfer amount must be positive".into(),
        ));
    }
    check_scale(amount)?;

    if sender.iban == receiver.iban {
        return Err(TransferError::InvalidArgument(
            "Cannot transfer to the same account".into(),
        ));
    }

    if !sender.is_operational() {
        return Err(TransferError::InvalidState(format!(
            "Sender account is not active (status: {})",
            sender.status
        )));
    }
    if !receiver.is_operational() {
        return Err(TransferError::InvalidState(format!(
            "Receiver account is not active (status: {})",
            receiver.status
        )));
    }

    if !receiver.owner.is_active {
        return Err(TransferError::InvalidState(
            "Receiver user is not active".into(),
        ));
    }

    if sender.currency != receiver.currency {
        return Err(TransferError::Unsupported(format!(
            "Currency mismatch: {} -> {}; conversion is not supported",
            sender.currency, receiver.currency
        )));
    }
    if let Some(requested) = currency
        && requested != sender.currency
    {
        return Err(TransferError::Unsupported(format!(
            "Requested currency {} does not match account currency {}",
            requested, sender.currency
        )));
    }

    if sender.balance < amount {
        return Err(TransferError::InsufficientFunds);
    }

    if used_today + amount > sender.daily_limit {
        return Err(TransferError::LimitExceeded {
            remaining: (sender.daily_limit - used_today).max(Decimal::ZERO),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountOwner, AccountStatus};
    use crate::transfer::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn account(iban: &str, user_id: i64) -> Account {
        Account {
            account_id: user_id,
            iban: iban.to_string(),
            balance: dec!(500),
            currency: Currency::Try,
            status: AccountStatus::Active,
            daily_limit: dec!(1000),
            is_active: true,
            owner: AccountOwner {
                user_id,
                first_name: "Ayse".to_string(),
                last_name: "Yilmaz".to_string(),
                email: format!("u{}@example.com", user_id),
                is_active: true,
            },
        }
    }

    struct Fixture {
        sender: Account,
        receiver: Account,
        caller: CallerIdentity,
        amount: Decimal,
        currency: Option<Currency>,
        used_today: Decimal,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sender: account("TR330006100519786457841326", 1),
                receiver: account("DE89370400440532013000", 2),
                caller: CallerIdentity::user(1, "u1@example.com"),
                amount: dec!(100),
                currency: None,
                used_today: Decimal::ZERO,
            }
        }

        fn run(&self) -> Result<(), TransferError> {
            validate(&TransferCandidate {
                sender: &self.sender,
                receiver: &self.receiver,
                amount: self.amount,
                currency: self.currency,
                caller: &self.caller,
                used_today: self.used_today,
            })
        }

        fn kind(&self) -> ErrorKind {
            self.run().unwrap_err().kind()
        }
    }

    #[test]
    fn test_valid_transfer_passes() {
        assert!(Fixture::new().run().is_ok());
    }

    #[test]
    fn test_non_owner_forbidden_admin_allowed() {
        let mut f = Fixture::new();
        f.caller = CallerIdentity::user(2, "u2@example.com");
        assert_eq!(f.kind(), ErrorKind::Forbidden);

        f.caller = CallerIdentity::admin(99, "ops@example.com");
        assert!(f.run().is_ok());
    }

    #[test]
    fn test_ownership_checked_before_amount() {
        let mut f = Fixture::new();
        f.caller = CallerIdentity::user(2, "u2@example.com");
        f.amount = dec!(-5);
        assert_eq!(f.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_amount_must_be_positive_and_in_scale() {
        let mut f = Fixture::new();
        f.amount = Decimal::ZERO;
        assert_eq!(f.kind(), ErrorKind::InvalidArgument);
        f.amount = dec!(0.00001);
        assert_eq!(f.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_same_account_rejected() {
        let mut f = Fixture::new();
        f.receiver = f.sender.clone();
        assert_eq!(
            f.run().unwrap_err(),
            TransferError::InvalidArgument("Cannot transfer to the same account".into())
        );
    }

    #[test]
    fn test_inactive_accounts() {
        let mut f = Fixture::new();
        f.sender.status = AccountStatus::Suspended;
        assert_eq!(f.kind(), ErrorKind::InvalidState);

        let mut f = Fixture::new();
        f.receiver.is_active = false;
        assert_eq!(f.kind(), ErrorKind::InvalidState);

        let mut f = Fixture::new();
        f.receiver.status = AccountStatus::Closed;
        assert_eq!(f.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_inactive_receiver_user() {
        let mut f = Fixture::new();
        f.receiver.owner.is_active = false;
        assert_eq!(
            f.run().unwrap_err(),
            TransferError::InvalidState("Receiver user is not active".into())
        );
    }

    #[test]
    fn test_currency_mismatch_unsupported() {
        let mut f = Fixture::new();
        f.receiver.currency = Currency::Eur;
        assert_eq!(f.kind(), ErrorKind::Unsupported);

        let mut f = Fixture::new();
        f.currency = Some(Currency::Usd);
        assert_eq!(f.kind(), ErrorKind::Unsupported);

        let mut f = Fixture::new();
        f.currency = Some(Currency::Try);
        assert!(f.run().is_ok());
    }

    #[test]
    fn test_insufficient_funds_before_limit() {
        let mut f = Fixture::new();
        f.amount = dec!(600);
        f.used_today = dec!(900);
        assert_eq!(f.run().unwrap_err(), TransferError::InsufficientFunds);
    }

    #[test]
    fn test_balance_equal_to_amount_passes() {
        let mut f = Fixture::new();
        f.amount = dec!(500);
        assert!(f.run().is_ok());
    }

    #[test]
    fn test_limit_reports_remaining() {
        let mut f = Fixture::new();
        f.used_today = dec!(950);
        assert_eq!(
            f.run().unwrap_err(),
            TransferError::LimitExceeded {
                remaining: dec!(50)
            }
        );

        f.amount = dec!(50);
        assert!(f.run().is_ok());
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut f = Fixture::new();
        f.sender.daily_limit = dec!(100);
        f.used_today = dec!(150);
        f.amount = dec!(1);
        assert_eq!(
            f.run().unwrap_err(),
            TransferError::LimitExceeded {
                remaining: Decimal::ZERO
            }
        );
    }
}
