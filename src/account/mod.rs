//! Account domain
//!
//! Account rows, their owners, and identifier validation. Accounts are only
//! mutated by the transfer engine's accounting step.

pub mod models;
pub mod validation;

// Re-export commonly used types
pub use models::{Account, AccountOwner, AccountStatus, Currency};
pub use validation::{Iban, ValidationError, normalize_iban};
