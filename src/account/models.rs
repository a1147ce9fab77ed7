//! Data models for accounts and their owners

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Open and usable
    Active,
    /// Temporarily frozen (security or user request)
    Suspended,
    /// Permanently closed
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AccountStatus::Active),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            "CLOSED" => Ok(AccountStatus::Closed),
            other => Err(format!("Invalid account status: {}", other)),
        }
    }
}

/// Supported account currencies (no conversion between them)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Try,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRY" => Ok(Currency::Try),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(format!("Unsupported currency: {}", other)),
        }
    }
}

/// Owning user, as resolved by the user collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOwner {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
}

impl AccountOwner {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Balance-holding account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: i64,
    pub iban: String,
    pub balance: Decimal,
    pub currency: Currency,
    pub status: AccountStatus,
    pub daily_limit: Decimal,
    pub is_active: bool,
    pub owner: AccountOwner,
}

impl Account {
    /// Open for transfers: `Active` status and active flag
    pub fn is_operational(&self) -> bool {
        self.status == AccountStatus::Active && self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(status: AccountStatus, is_active: bool) -> Account {
        Account {
            account_id: 1,
            iban: "GB82WEST12345698765432".to_string(),
            balance: dec!(100),
            currency: Currency::Gbp,
            status,
            daily_limit: dec!(1000),
            is_active,
            owner: AccountOwner {
                user_id: 7,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                is_active: true,
            },
        }
    }

    #[test]
    fn test_is_operational() {
        assert!(account(AccountStatus::Active, true).is_operational());
        assert!(!account(AccountStatus::Active, false).is_operational());
        assert!(!account(AccountStatus::Suspended, true).is_operational());
        assert!(!account(AccountStatus::Closed, true).is_operational());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!(" EUR ".parse::<Currency>(), Ok(Currency::Eur));
        assert!("JPY".parse::<Currency>().is_err());
    }

    #[test]
    fn test_status_roundtrip_strings() {
        assert_eq!("SUSPENDED".parse::<AccountStatus>(), Ok(AccountStatus::Suspended));
        assert_eq!(AccountStatus::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            account(AccountStatus::Active, true).owner.display_name(),
            "Ada Lovelace"
        );
    }
}
