//! Banking Transfer Engine
//!
//! Moves money between accounts with row-level locking, daily limits,
//! an audit trail and post-commit notifications.
//!
//! # Modules
//!
//! - [`account`] - Account rows, owners, IBAN handling
//! - [`identity`] - Caller identity passed into every operation
//! - [`money`] - Amount parsing, scale checks, display formatting
//! - [`transfer`] - Transfer engine: locking, validation, accounting, queries
//! - [`audit`] - Audit sinks
//! - [`notification`] - Transfer events, in-process channel, email worker
//! - [`receipt`] - Receipt rendering behind retry and circuit breaker
//! - [`db`] - PostgreSQL pool and schema
//! - [`gateway`] - HTTP API
//! - [`config`] / [`logging`] - Service bootstrap

pub mod account;
pub mod audit;
pub mod config;
pub mod db;
pub mod gateway;
pub mod identity;
pub mod logging;
pub mod money;
pub mod notification;
pub mod receipt;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

// Convenient re-exports at crate root
pub use account::{Account, AccountStatus, Currency};
pub use identity::{CallerIdentity, Role};
pub use transfer::{TransferCoordinator, TransferError, TransferQueries, TransferRequest};
