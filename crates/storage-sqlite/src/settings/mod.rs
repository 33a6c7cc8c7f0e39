//! Durable settings store.

mod model;
mod repository;

pub use model::SettingsDB;
pub use repository::SqliteSettingsRepository;
