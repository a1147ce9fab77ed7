//! Transfer Stage and Status Definitions
//!
//! A transfer walks `Requested → Locked → Validated → Accounted → Recorded →
//! Finalized` inside one database transaction. No intermediate stage is
//! durable: only the final [`TransferStatus`] is persisted with the record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// In-flight stage of a transfer attempt (logging and diagnostics only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferStage {
    /// Request received, nothing locked yet
    Requested,
    /// Both account rows locked in canonical order
    Locked,
    /// Business rules passed
    Validated,
    /// Balances and daily ledger updated (uncommitted)
    Accounted,
    /// Transfer record inserted (uncommitted)
    Recorded,
    /// Transaction committed; side effects dispatched
    Finalized,
}

impl TransferStage {
    /// Stage that follows this one on the happy path
    pub fn next(&self) -> Option<TransferStage> {
        match self {
            TransferStage::Requested => Some(TransferStage::Locked),
            TransferStage::Locked => Some(TransferStage::Validated),
            TransferStage::Validated => Some(TransferStage::Accounted),
            TransferStage::Accounted => Some(TransferStage::Recorded),
            TransferStage::Recorded => Some(TransferStage::Finalized),
            TransferStage::Finalized => None,
        }
    }

    /// Whether the stage survives a crash (only after commit)
    #[inline]
    pub fn is_durable(&self) -> bool {
        matches!(self, TransferStage::Finalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStage::Requested => "REQUESTED",
            TransferStage::Locked => "LOCKED",
            TransferStage::Validated => "VALIDATED",
            TransferStage::Accounted => "ACCOUNTED",
            TransferStage::Recorded => "RECORDED",
            TransferStage::Finalized => "FINALIZED",
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted transfer status
///
/// The engine only ever writes `Completed`: a transfer is all-or-nothing.
/// `Pending` and `Failed` exist so rows written by other producers decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransferStatus::Pending),
            "COMPLETED" => Ok(TransferStatus::Completed),
            "FAILED" => Ok(TransferStatus::Failed),
            other => Err(format!("Invalid transfer status: {}", other)),
        }
    }
}

/// Kind of money movement recorded in the transfer log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    Transfer,
    Deposit,
    Withdraw,
    Fee,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Transfer => "TRANSFER",
            TransferType::Deposit => "DEPOSIT",
            TransferType::Withdraw => "WITHDRAW",
            TransferType::Fee => "FEE",
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSFER" => Ok(TransferType::Transfer),
            "DEPOSIT" => Ok(TransferType::Deposit),
            "WITHDRAW" => Ok(TransferType::Withdraw),
            "FEE" => Ok(TransferType::Fee),
            other => Err(format!("Invalid transfer type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_walk_reaches_finalized() {
        let mut stage = TransferStage::Requested;
        let mut steps = 0;
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            steps += 1;
        }
        assert_eq!(stage, TransferStage::Finalized);
        assert_eq!(steps, 5);
    }

    #[test]
    fn test_only_finalized_is_durable() {
        assert!(TransferStage::Finalized.is_durable());
        assert!(!TransferStage::Recorded.is_durable());
        assert!(!TransferStage::Locked.is_durable());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "COMPLETED".parse::<TransferStatus>(),
            Ok(TransferStatus::Completed)
        );
        assert!("DONE".parse::<TransferStatus>().is_err());
        assert_eq!(TransferStatus::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_type_parse() {
        assert_eq!("TRANSFER".parse::<TransferType>(), Ok(TransferType::Transfer));
        assert!("transfer".parse::<TransferType>().is_err());
    }
}
