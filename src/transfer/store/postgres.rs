//! PostgreSQL ledger store
//!
//! Row locks are `SELECT ... FOR UPDATE` inside a transaction that first sets
//! `lock_timeout`, so a blocked lock wait ends with SQLSTATE 55P03
//! (`ServiceUnavailable`) instead of waiting forever.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::{LedgerStore, LedgerTx};
use crate::account::{Account, AccountOwner};
use crate::transfer::error::TransferError;
use crate::transfer::types::{
    DailyLimitRecord, DailySpend, NewTransfer, Page, PageRequest, TransferDetails, TransferFilter,
    TransferId, TransferRecord, TransferSummary,
};

const ACCOUNT_COLUMNS: &str = r#"
    a.account_id, a.iban, a.balance, a.currency, a.status, a.daily_limit, a.is_active,
    u.user_id, u.first_name, u.last_name, u.email, u.is_active AS user_active
"#;

const TRANSFER_COLUMNS: &str = r#"
    t.transfer_id, t.external_id, t.reference_code, t.sender_iban, t.receiver_iban,
    t.amount, t.currency, t.transfer_type, t.status, t.description, t.created_at
"#;

// Optional filter bounds are bound as typed NULLs
const HISTORY_PREDICATE: &str = r#"
    (t.sender_iban = $1 OR t.receiver_iban = $1)
    AND ($2::numeric IS NULL OR t.amount >= $2)
    AND ($3::numeric IS NULL OR t.amount <= $3)
    AND ($4::timestamptz IS NULL OR t.created_at >= $4)
    AND ($5::timestamptz IS NULL OR t.created_at <= $5)
"#;

/// PostgreSQL [`LedgerStore`]
pub struct PgLedgerStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, TransferError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters; the value is an integer
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn find_account(&self, iban: &str) -> Result<Option<Account>, TransferError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb a
             JOIN users_tb u ON u.user_id = a.user_id
             WHERE a.iban = $1"
        ))
        .bind(iban)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_transfer(
        &self,
        id: TransferId,
    ) -> Result<Option<TransferDetails>, TransferError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {TRANSFER_COLUMNS},
                   su.user_id AS s_user_id, su.first_name AS s_first_name,
                   su.last_name AS s_last_name, su.email AS s_email, su.is_active AS s_is_active,
                   ru.user_id AS r_user_id, ru.first_name AS r_first_name,
                   ru.last_name AS r_last_name, ru.email AS r_email, ru.is_active AS r_is_active
            FROM transfers_tb t
            JOIN accounts_tb sa ON sa.iban = t.sender_iban
            JOIN users_tb su ON su.user_id = sa.user_id
            JOIN accounts_tb ra ON ra.iban = t.receiver_iban
            JOIN users_tb ru ON ru.user_id = ra.user_id
            WHERE t.transfer_id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(TransferDetails {
                record: transfer_from_row(&row)?,
                sender: owner_from_row(&row, "s_")?,
                receiver: owner_from_row(&row, "r_")?,
            })),
            None => Ok(None),
        }
    }

    async fn list_transfers(
        &self,
        iban: &str,
        filter: &TransferFilter,
        page: PageRequest,
    ) -> Result<Page<TransferRecord>, TransferError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM transfers_tb t WHERE {HISTORY_PREDICATE}"
        ))
        .bind(iban)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers_tb t
             WHERE {HISTORY_PREDICATE}
             ORDER BY t.created_at DESC, t.transfer_id DESC
             LIMIT $6 OFFSET $7"
        ))
        .bind(iban)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .bind(filter.start)
        .bind(filter.end)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(transfer_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total.max(0) as u64))
    }

    async fn summarize(&self, iban: &str) -> Result<TransferSummary, TransferError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount) FILTER (WHERE sender_iban = $1), 0) AS total_sent,
                   COALESCE(SUM(amount) FILTER (WHERE receiver_iban = $1), 0) AS total_received,
                   COUNT(*) AS transfer_count
            FROM transfers_tb
            WHERE sender_iban = $1 OR receiver_iban = $1
            "#,
        )
        .bind(iban)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("transfer_count")?;
        Ok(TransferSummary {
            total_sent: row.try_get("total_sent")?,
            total_received: row.try_get("total_received")?,
            count: count.max(0) as u64,
        })
    }

    async fn outgoing_transfers(&self, iban: &str) -> Result<Vec<TransferRecord>, TransferError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers_tb t
             WHERE t.sender_iban = $1
             ORDER BY t.created_at"
        ))
        .bind(iban)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transfer_from_row).collect()
    }

    async fn daily_outgoing_since(
        &self,
        iban: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailySpend>, TransferError> {
        let rows = sqlx::query(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, SUM(amount) AS total_amount
            FROM transfers_tb
            WHERE sender_iban = $1 AND created_at >= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(iban)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DailySpend {
                    date: row.try_get("day")?,
                    total_amount: row.try_get("total_amount")?,
                })
            })
            .collect()
    }

    async fn daily_limit(
        &self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError> {
        let row = sqlx::query(
            "SELECT iban, limit_date, used_amount, daily_limit
             FROM account_limits_tb WHERE iban = $1 AND limit_date = $2",
        )
        .bind(iban)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(limit_from_row).transpose()
    }
}

/// PostgreSQL transaction
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_for_update(&mut self, iban: &str) -> Result<Option<Account>, TransferError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb a
             JOIN users_tb u ON u.user_id = a.user_id
             WHERE a.iban = $1
             FOR UPDATE OF a"
        ))
        .bind(iban)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn daily_limit(
        &mut self,
        iban: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLimitRecord>, TransferError> {
        let row = sqlx::query(
            "SELECT iban, limit_date, used_amount, daily_limit
             FROM account_limits_tb WHERE iban = $1 AND limit_date = $2",
        )
        .bind(iban)
        .bind(date)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(limit_from_row).transpose()
    }

    async fn save_daily_limit(&mut self, record: &DailyLimitRecord) -> Result<(), TransferError> {
        sqlx::query(
            r#"
            INSERT INTO account_limits_tb (iban, limit_date, used_amount, daily_limit, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (iban, limit_date) DO UPDATE
            SET used_amount = EXCLUDED.used_amount,
                daily_limit = EXCLUDED.daily_limit,
                updated_at = NOW()
            "#,
        )
        .bind(&record.iban)
        .bind(record.limit_date)
        .bind(record.used_amount)
        .bind(record.daily_limit)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), TransferError> {
        let result = sqlx::query(
            "UPDATE accounts_tb SET balance = $1, updated_at = NOW() WHERE iban = $2",
        )
        .bind(account.balance)
        .bind(&account.iban)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TransferError::NotFound(format!(
                "Account not found: {}",
                account.iban
            )));
        }
        Ok(())
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, TransferError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transfers_tb
                (external_id, reference_code, sender_iban, receiver_iban, amount,
                 currency, transfer_type, status, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING transfer_id
            "#,
        )
        .bind(transfer.external_id)
        .bind(&transfer.reference_code)
        .bind(&transfer.sender_iban)
        .bind(&transfer.receiver_iban)
        .bind(transfer.amount)
        .bind(transfer.currency.as_str())
        .bind(transfer.transfer_type.as_str())
        .bind(transfer.status.as_str())
        .bind(&transfer.description)
        .bind(transfer.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(TransferRecord::from_new(id, transfer))
    }

    async fn commit(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), TransferError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

fn account_from_row(row: &PgRow) -> Result<Account, TransferError> {
    let currency: String = row.try_get("currency")?;
    let status: String = row.try_get("status")?;
    Ok(Account {
        account_id: row.try_get("account_id")?,
        iban: row.try_get("iban")?,
        balance: row.try_get("balance")?,
        currency: currency.parse().map_err(TransferError::SystemError)?,
        status: status.parse().map_err(TransferError::SystemError)?,
        daily_limit: row.try_get("daily_limit")?,
        is_active: row.try_get("is_active")?,
        owner: AccountOwner {
            user_id: row.try_get("user_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            is_active: row.try_get("user_active")?,
        },
    })
}

fn owner_from_row(row: &PgRow, prefix: &str) -> Result<AccountOwner, TransferError> {
    let col = |name: &str| format!("{}{}", prefix, name);
    Ok(AccountOwner {
        user_id: row.try_get(col("user_id").as_str())?,
        first_name: row.try_get(col("first_name").as_str())?,
        last_name: row.try_get(col("last_name").as_str())?,
        email: row.try_get(col("email").as_str())?,
        is_active: row.try_get(col("is_active").as_str())?,
    })
}

fn transfer_from_row(row: &PgRow) -> Result<TransferRecord, TransferError> {
    let currency: String = row.try_get("currency")?;
    let transfer_type: String = row.try_get("transfer_type")?;
    let status: String = row.try_get("status")?;
    Ok(TransferRecord {
        transfer_id: row.try_get("transfer_id")?,
        external_id: row.try_get("external_id")?,
        reference_code: row.try_get("reference_code")?,
        sender_iban: row.try_get("sender_iban")?,
        receiver_iban: row.try_get("receiver_iban")?,
        amount: row.try_get::<Decimal, _>("amount")?,
        currency: currency.parse().map_err(TransferError::SystemError)?,
        transfer_type: transfer_type.parse().map_err(TransferError::SystemError)?,
        status: status.parse().map_err(TransferError::SystemError)?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn limit_from_row(row: &PgRow) -> Result<DailyLimitRecord, TransferError> {
    Ok(DailyLimitRecord {
        iban: row.try_get("iban")?,
        limit_date: row.try_get("limit_date")?,
        used_amount: row.try_get("used_amount")?,
        daily_limit: row.try_get("daily_limit")?,
    })
}
