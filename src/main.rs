//! Banking transfer service
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌─────────────┐
//! │ Gateway  │───▶│ Coordinator  │───▶│ LedgerStore  │    │ Notification│
//! │  (axum)  │    │ lock→validate│    │ (Pg / memory)│    │   worker    │
//! └──────────┘    │ →post→record │    └──────────────┘    └─────────────┘
//!                 └──────┬───────┘                               ▲
//!                        └── after commit: audit + publish ──────┘
//! ```
//!
//! Usage: `banking_engine [--env <name>]` reads `config/<name>.yaml`.

use std::sync::Arc;

use anyhow::Context;
use mockable::{Clock, DefaultClock};

use banking_engine::audit::{AuditSink, PgAuditSink, TracingAuditSink};
use banking_engine::config::AppConfig;
use banking_engine::db::Database;
use banking_engine::gateway::{self, state::AppState};
use banking_engine::notification::{
    LogMailer, NotificationDispatcher, NotificationWorker, event_channel,
};
use banking_engine::receipt::{PlainTextReceiptRenderer, ReceiptService};
use banking_engine::transfer::{
    LedgerStore, MemoryLedgerStore, PgLedgerStore, TransferCoordinator, TransferQueries,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = banking_engine::logging::init_logging(&app_config);
    tracing::info!(env = %env, "Starting banking transfer service");

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let lock_timeout = app_config.transfer.lock_timeout();

    // ==========================================================================
    // Storage and audit
    // ==========================================================================
    let (store, audit, pg_db): (Arc<dyn LedgerStore>, Arc<dyn AuditSink>, Option<Arc<Database>>) =
        match &app_config.postgres_url {
            Some(url) => {
                let db = Database::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                db.ensure_schema()
                    .await
                    .context("Failed to initialize schema")?;
                let pool = db.pool().clone();
                (
                    Arc::new(PgLedgerStore::new(pool.clone(), lock_timeout)),
                    Arc::new(PgAuditSink::new(pool)),
                    Some(Arc::new(db)),
                )
            }
            None => {
                tracing::warn!("No postgres_url configured, using the in-memory store");
                (
                    Arc::new(MemoryLedgerStore::new(lock_timeout)),
                    Arc::new(TracingAuditSink),
                    None,
                )
            }
        };

    // ==========================================================================
    // Notifications
    // ==========================================================================
    let notification = &app_config.notification;
    let (publisher, receiver) = event_channel(notification.queue_size);
    let worker = NotificationWorker::new(receiver, Arc::new(LogMailer), &notification.topic);
    tokio::spawn(worker.run());
    let dispatcher = NotificationDispatcher::new(
        Arc::new(publisher),
        &notification.topic,
        notification.publish_timeout(),
    );

    // ==========================================================================
    // Engine
    // ==========================================================================
    let coordinator = TransferCoordinator::new(store.clone(), audit, dispatcher, clock.clone());
    let queries = TransferQueries::new(store.clone(), clock.clone());
    let receipts = ReceiptService::new(
        store,
        Arc::new(PlainTextReceiptRenderer),
        app_config.receipt.breaker(),
        app_config.receipt.retry_policy(),
        clock,
    );

    let mut state = AppState::new(
        Arc::new(coordinator),
        Arc::new(queries),
        Arc::new(receipts),
    );
    if let Some(db) = pg_db {
        state = state.with_database(db);
    }

    gateway::run_server(&app_config.gateway, Arc::new(state)).await
}
