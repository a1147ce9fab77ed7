use std::sync::Arc;

use crate::db::Database;
use crate::receipt::ReceiptService;
use crate::transfer::{TransferCoordinator, TransferQueries};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<TransferCoordinator>,
    pub queries: Arc<TransferQueries>,
    pub receipts: Arc<ReceiptService>,
    /// Present when the PostgreSQL store is in use
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<TransferCoordinator>,
        queries: Arc<TransferQueries>,
        receipts: Arc<ReceiptService>,
    ) -> Self {
        Self {
            coordinator,
            queries,
            receipts,
            pg_db: None,
        }
    }

    pub fn with_database(mut self, db: Arc<Database>) -> Self {
        self.pg_db = Some(db);
        self
    }

    pub fn store_name(&self) -> &'static str {
        if self.pg_db.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
