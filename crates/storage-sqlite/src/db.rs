//! Pool construction and the serialized write handle.
//!
//! SQLite allows one writer at a time; every mutation in this crate goes
//! through [`WriteHandle::exec`], which holds an async gate across a blocking
//! worker so writes never contend on the database lock.

use std::path::Path;
use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::sqlite::SqliteConnection;
use r2d2::{Pool, PooledConnection};

use pocketledger_core::{DatabaseError, Error, Result};

use crate::errors::StorageError;

pub type DbPool = Arc<Pool<ConnectionManager<SqliteConnection>>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const DB_FILE_NAME: &str = "pocketledger.db";

/// Resolve (and create if needed) the database file path under the app data
/// directory.
pub fn init(app_data_dir: &str) -> Result<String> {
    std::fs::create_dir_all(app_data_dir).map_err(|e| {
        Error::Database(DatabaseError::Internal(format!(
            "Failed creating app data directory: {e}"
        )))
    })?;
    let db_path = Path::new(app_data_dir).join(DB_FILE_NAME);
    Ok(db_path.to_string_lossy().to_string())
}

#[derive(Debug)]
struct ConnectionOptions;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Single-connection pool: the one writer and all readers share it, which
/// also keeps `:memory:` databases coherent in tests.
pub fn create_pool(db_path: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::Database(DatabaseError::Pool(e.to_string())))
}

/// Handle that serializes mutations: one transaction at a time, executed on
/// the blocking thread pool.
#[derive(Clone)]
pub struct WriteHandle {
    pool: DbPool,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl WriteHandle {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Run `job` inside an immediate transaction. The job either commits as
    /// a whole or rolls back as a whole.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = Arc::clone(&self.gate).lock_owned().await;
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let mut conn = get_connection(&pool)?;
            conn.immediate_transaction::<_, StorageError, _>(|tx| {
                job(tx).map_err(StorageError::from)
            })
            .map_err(Error::from)
        })
        .await
        .map_err(|e| Error::Database(DatabaseError::Internal(format!("write worker failed: {e}"))))?
    }
}
