//! Audit trail
//!
//! Write-once entries recorded after a transfer commits. A failed write is
//! logged by the caller and never changes the transfer's outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::identity::CallerIdentity;

/// Action name recorded for completed transfers
pub const MONEY_TRANSFER: &str = "MONEY_TRANSFER";

/// Origin recorded when the caller's address is not known
pub const UNKNOWN_ORIGIN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: String,
    pub actor: String,
    pub detail: String,
    pub origin: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for a committed transfer
    pub fn transfer(caller: &CallerIdentity, reference_code: &str, at: DateTime<Utc>) -> Self {
        Self {
            action: MONEY_TRANSFER.to_string(),
            actor: caller.principal.clone(),
            detail: format!("Reference: {}", reference_code),
            origin: caller
                .origin
                .clone()
                .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()),
            created_at: at,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError>;
}

/// Persists entries to `audit_logs_tb`
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs_tb (action, actor, detail, origin, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.action)
        .bind(&entry.actor)
        .bind(&entry.detail)
        .bind(&entry.origin)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Emits entries as structured log lines on the `audit` target
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        info!(
            target: "audit",
            action = %entry.action,
            actor = %entry.actor,
            detail = %entry.detail,
            origin = %entry.origin,
            at = %entry.created_at,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_entry_fields() {
        let at = Utc::now();
        let caller = CallerIdentity::user(3, "mia@example.com").with_origin("10.0.0.7");
        let entry = AuditEntry::transfer(&caller, "TX-1-ABCDE", at);
        assert_eq!(entry.action, "MONEY_TRANSFER");
        assert_eq!(entry.actor, "mia@example.com");
        assert_eq!(entry.detail, "Reference: TX-1-ABCDE");
        assert_eq!(entry.origin, "10.0.0.7");
        assert_eq!(entry.created_at, at);
    }

    #[test]
    fn test_missing_origin_is_unknown() {
        let caller = CallerIdentity::user(3, "mia@example.com");
        let entry = AuditEntry::transfer(&caller, "TX-1-ABCDE", Utc::now());
        assert_eq!(entry.origin, "unknown");
    }

    #[tokio::test]
    async fn test_tracing_sink_never_fails() {
        let caller = CallerIdentity::admin(1, "ops@example.com");
        let entry = AuditEntry::transfer(&caller, "TX-2-FFFFF", Utc::now());
        assert!(TracingAuditSink.record(&entry).await.is_ok());
    }
}
