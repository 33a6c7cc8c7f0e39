//! Domain core for the pocketledger offline-first expense tracker.
//!
//! Storage backends (`pocketledger-storage-sqlite`) and the cloud client
//! (`pocketledger-remote`) implement the traits defined here; everything
//! above the UI boundary goes through the services in this crate.

pub mod categories;
pub mod context;
pub mod errors;
pub mod identity;
pub mod serde_util;
pub mod settings;
pub mod sync;
pub mod time;
pub mod transactions;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{DatabaseError, Error, Result};
