//! PostgreSQL schema for accounts, daily limits, transfers and the audit log
//!
//! Every statement is idempotent, so [`init_schema`] can run on each start.

use sqlx::PgPool;

/// Create all tables and indexes if they do not exist
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema...");

    for (name, statement) in STATEMENTS {
        sqlx::query(statement).execute(pool).await.inspect_err(|e| {
            tracing::error!(step = name, error = %e, "Schema statement failed");
        })?;
    }

    tracing::info!("PostgreSQL schema initialized successfully");
    Ok(())
}

const STATEMENTS: [(&str, &str); 8] = [
    ("users_tb", CREATE_USERS_TABLE),
    ("accounts_tb", CREATE_ACCOUNTS_TABLE),
    ("account_limits_tb", CREATE_ACCOUNT_LIMITS_TABLE),
    ("transfers_tb", CREATE_TRANSFERS_TABLE),
    ("idx_transfers_sender", CREATE_TRANSFERS_SENDER_INDEX),
    ("idx_transfers_receiver", CREATE_TRANSFERS_RECEIVER_INDEX),
    ("idx_transfers_created", CREATE_TRANSFERS_CREATED_INDEX),
    ("audit_logs_tb", CREATE_AUDIT_LOGS_TABLE),
];

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users_tb (
    user_id     BIGSERIAL PRIMARY KEY,
    first_name  VARCHAR(100) NOT NULL,
    last_name   VARCHAR(100) NOT NULL,
    email       VARCHAR(255) NOT NULL UNIQUE,
    is_active   BOOLEAN NOT NULL DEFAULT TRUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

// Balances and limits use the 4-digit storage scale
const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts_tb (
    account_id  BIGSERIAL PRIMARY KEY,
    iban        VARCHAR(34) NOT NULL UNIQUE,
    user_id     BIGINT NOT NULL REFERENCES users_tb(user_id),
    balance     NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    currency    VARCHAR(3) NOT NULL,
    status      VARCHAR(16) NOT NULL DEFAULT 'ACTIVE',
    daily_limit NUMERIC(19, 4) NOT NULL CHECK (daily_limit >= 0),
    is_active   BOOLEAN NOT NULL DEFAULT TRUE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_ACCOUNT_LIMITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS account_limits_tb (
    limit_id    BIGSERIAL PRIMARY KEY,
    iban        VARCHAR(34) NOT NULL REFERENCES accounts_tb(iban),
    limit_date  DATE NOT NULL,
    used_amount NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (used_amount >= 0),
    daily_limit NUMERIC(19, 4) NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (iban, limit_date)
)
"#;

const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers_tb (
    transfer_id    BIGSERIAL PRIMARY KEY,
    external_id    UUID NOT NULL UNIQUE,
    reference_code VARCHAR(40) NOT NULL UNIQUE,
    sender_iban    VARCHAR(34) NOT NULL REFERENCES accounts_tb(iban),
    receiver_iban  VARCHAR(34) NOT NULL REFERENCES accounts_tb(iban),
    amount         NUMERIC(19, 4) NOT NULL CHECK (amount > 0),
    currency       VARCHAR(3) NOT NULL,
    transfer_type  VARCHAR(16) NOT NULL,
    status         VARCHAR(16) NOT NULL,
    description    VARCHAR(255),
    created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSFERS_SENDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transfers_sender ON transfers_tb (sender_iban, created_at DESC)";

const CREATE_TRANSFERS_RECEIVER_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_transfers_receiver ON transfers_tb (receiver_iban, created_at DESC)";

const CREATE_TRANSFERS_CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_transfers_created ON transfers_tb (created_at)";

const CREATE_AUDIT_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS audit_logs_tb (
    audit_id    BIGSERIAL PRIMARY KEY,
    action      VARCHAR(64) NOT NULL,
    actor       VARCHAR(255) NOT NULL,
    detail      TEXT NOT NULL,
    origin      VARCHAR(64) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_created_before_dependents() {
        let order: Vec<&str> = STATEMENTS.iter().map(|(name, _)| *name).collect();
        let pos = |n: &str| order.iter().position(|x| *x == n).unwrap();
        assert!(pos("users_tb") < pos("accounts_tb"));
        assert!(pos("accounts_tb") < pos("account_limits_tb"));
        assert!(pos("accounts_tb") < pos("transfers_tb"));
        assert!(pos("transfers_tb") < pos("idx_transfers_sender"));
    }

    #[test]
    fn test_statements_are_idempotent() {
        for (name, statement) in STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "{name}");
        }
    }
}
