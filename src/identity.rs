//! Caller identity
//!
//! Resolved by the identity collaborator and passed explicitly into every
//! engine call. There is no ambient authentication state.

use std::fmt;
use std::str::FromStr;

use crate::account::Account;

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" | "ROLE_USER" => Ok(Role::User),
            "ADMIN" | "ROLE_ADMIN" | "SCOPE_ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Authenticated principal performing an engine operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub role: Role,
    /// Human-readable principal (email or username) used as audit actor
    pub principal: String,
    /// Client address the request came from, if known
    pub origin: Option<String>,
}

impl CallerIdentity {
    pub fn user(user_id: i64, principal: impl Into<String>) -> Self {
        Self {
            user_id,
            role: Role::User,
            principal: principal.into(),
            origin: None,
        }
    }

    pub fn admin(user_id: i64, principal: impl Into<String>) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            principal: principal.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner of the account, or administrator
    pub fn is_owner(&self, account: &Account) -> bool {
        self.is_admin() || account.owner.user_id == self.user_id
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.principal, self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountOwner, AccountStatus, Currency};
    use rust_decimal::Decimal;

    fn owned_by(user_id: i64) -> Account {
        Account {
            account_id: 1,
            iban: "NL91ABNA0417164300".to_string(),
            balance: Decimal::ZERO,
            currency: Currency::Eur,
            status: AccountStatus::Active,
            daily_limit: Decimal::ZERO,
            is_active: true,
            owner: AccountOwner {
                user_id,
                first_name: "Jan".to_string(),
                last_name: "Jansen".to_string(),
                email: "jan@example.com".to_string(),
                is_active: true,
            },
        }
    }

    #[test]
    fn test_ownership() {
        let account = owned_by(5);
        assert!(CallerIdentity::user(5, "jan@example.com").is_owner(&account));
        assert!(!CallerIdentity::user(6, "eve@example.com").is_owner(&account));
        assert!(CallerIdentity::admin(99, "ops@example.com").is_owner(&account));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("ROLE_ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
    }
}
