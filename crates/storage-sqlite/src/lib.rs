//! SQLite persistence for pocketledger, built on diesel with an r2d2 pool.
//!
//! [`LocalDatabase::open`] runs the migrations and hands out the repository
//! trait objects the core services consume.

pub mod db;
pub mod errors;
pub mod kv;
pub mod mapper;
pub mod migrations;
pub mod schema;
pub mod settings;
pub mod transactions;

use std::sync::Arc;

use pocketledger_core::context::LocalStores;
use pocketledger_core::Result;

use crate::db::{create_pool, DbPool, WriteHandle};
use crate::kv::KvStore;
use crate::settings::SqliteSettingsRepository;
use crate::transactions::SqliteTransactionRepository;

pub use crate::errors::StorageError;

/// Open (or create) the database, run migrations and bundle the stores.
pub struct LocalDatabase {
    pool: DbPool,
    writer: WriteHandle,
}

impl LocalDatabase {
    pub fn open(db_path: &str) -> Result<Self> {
        let pool = create_pool(db_path)?;
        migrations::run_migrations(&pool)?;
        let writer = WriteHandle::new(Arc::clone(&pool));
        Ok(Self { pool, writer })
    }

    pub fn pool(&self) -> DbPool {
        Arc::clone(&self.pool)
    }

    pub fn writer(&self) -> WriteHandle {
        self.writer.clone()
    }

    /// Repository trait objects for [`pocketledger_core::context::SyncRuntime`].
    pub fn stores(&self) -> LocalStores {
        LocalStores {
            transactions: Arc::new(SqliteTransactionRepository::new(
                self.pool(),
                self.writer(),
            )),
            settings: Arc::new(SqliteSettingsRepository::new(self.pool(), self.writer())),
            sync_state: Arc::new(KvStore::new(self.pool(), self.writer())),
        }
    }
}
