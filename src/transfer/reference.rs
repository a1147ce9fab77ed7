//! Transfer reference codes
//!
//! Format: `TX-<unix millis>-<5 uppercase hex chars>`. Uniqueness is enforced
//! by the store's unique constraint; a collision fails the transfer with
//! `Conflict` and is not retried here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of externally visible transfer references
pub trait ReferenceSource: Send + Sync {
    fn next_reference(&self, now: DateTime<Utc>) -> String;
}

/// Timestamp plus a random suffix taken from a v4 UUID
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampReference;

impl ReferenceSource for TimestampReference {
    fn next_reference(&self, now: DateTime<Utc>) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "TX-{}-{}",
            now.timestamp_millis(),
            random[..5].to_ascii_uppercase()
        )
    }
}
