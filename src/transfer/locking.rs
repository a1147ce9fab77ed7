//! Lock ordering
//!
//! Every path that locks two accounts goes through [`lock_pair`]. Accounts are
//! always locked in ascending order of their normalized IBAN, whichever side
//! is sender or receiver, so no two transfers can wait on each other in a
//! cycle.

use tracing::debug;

use super::error::TransferError;
use super::store::LedgerTx;
use crate::account::Account;

/// Both sides of a transfer, row-locked inside the caller's transaction
#[derive(Debug, Clone)]
pub struct LockedPair {
    pub sender: Account,
    pub receiver: Account,
}

/// Canonical acquisition order for two account identifiers
#[inline]
pub fn lock_order<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Lock sender and receiver in canonical order.
///
/// Fails with `NotFound` as soon as either account is missing; locks already
/// taken stay with the transaction and are released when it ends.
pub async fn lock_pair(
    tx: &mut dyn LedgerTx,
    sender_iban: &str,
    receiver_iban: &str,
) -> Result<LockedPair, TransferError> {
    if sender_iban == receiver_iban {
        return Err(TransferError::InvalidArgument(
            "Cannot transfer to the same account".into(),
        ));
    }

    let (first, second) = lock_order(sender_iban, receiver_iban);
    let describe = |iban: &str| {
        if iban == sender_iban {
            "Sender"
        } else {
            "Receiver"
        }
    };

    let first_account = tx.lock_for_update(first).await?.ok_or_else(|| {
        TransferError::NotFound(format!("{} account not found: {}", describe(first), first))
    })?;
    let second_account = tx.lock_for_update(second).await?.ok_or_else(|| {
        TransferError::NotFound(format!("{} account not found: {}", describe(second), second))
    })?;
    debug!(first = %first, second = %second, "Account pair locked");

    if first == sender_iban {
        Ok(LockedPair {
            sender: first_account,
            receiver: second_account,
        })
    } else {
        Ok(LockedPair {
            sender: second_account,
            receiver: first_account,
        })
    }
}
