//! Funds Transfer Engine
//!
//! Moves money between two accounts atomically under concurrent load.
//!
//! # Flow
//!
//! ```text
//! Requested → Locked → Validated → Accounted → Recorded → Finalized
//!     │          │          │           │           │          │
//!  self-xfer  lock_pair  validator  accounting  insert     commit, then
//!  pre-check  (ordered)   (pure)    (debit,     record     audit + notify
//!                                   credit,                (best effort)
//!                                   day ledger)
//! ```
//!
//! # Invariants
//!
//! 1. **Conservation**: debit always equals credit, inside one transaction
//! 2. **Lock ordering**: both accounts are locked in ascending IBAN order
//! 3. **All-or-nothing**: a transfer is persisted only as `Completed`; any
//!    failure rolls every write back
//! 4. **Side effects never fail a transfer**: audit and notification run
//!    after commit and only log their errors

pub mod accounting;
pub mod analysis;
pub mod coordinator;
pub mod error;
pub mod locking;
pub mod queries;
pub mod reference;
pub mod state;
pub mod store;
pub mod types;
pub mod validator;


// Re-exports for convenience
pub use analysis::{Category, CategoryShare};
pub use coordinator::TransferCoordinator;
pub use error::{ErrorKind, TransferError};
pub use queries::TransferQueries;
pub use state::{TransferStage, TransferStatus, TransferType};
pub use store::{LedgerStore, LedgerTx, MemoryLedgerStore, PgLedgerStore};
pub use types::{
    DailyLimitRecord, DailySpend, Page, PageRequest, TransferDetails, TransferFilter, TransferId,
    TransferRecord, TransferRequest, TransferSummary, TransferView,
};
