//! Durable transaction store.

mod model;
mod repository;

pub use model::TransactionDB;
pub use repository::SqliteTransactionRepository;
