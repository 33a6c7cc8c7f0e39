//! Storage-layer error type, converted into the domain error at the crate
//! boundary.

use thiserror::Error;

use pocketledger_core::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Write worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Domain(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Domain(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Query(e) => Error::Database(DatabaseError::Query(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::Pool(e.to_string())),
            StorageError::Migration(message) => Error::Database(DatabaseError::Migration(message)),
            StorageError::Worker(message) => Error::Database(DatabaseError::Internal(message)),
            StorageError::Domain(e) => e,
        }
    }
}
