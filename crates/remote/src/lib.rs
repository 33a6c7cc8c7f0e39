//! Cloud REST client for pocketledger.
//!
//! Implements [`pocketledger_core::sync::RemoteStore`] against the hosted
//! PostgREST-style API.

pub mod client;
pub mod error;
pub mod types;

pub use client::RemoteStoreClient;
pub use error::{ApiRetryClass, RemoteStoreError};
pub use types::{SettingsRow, TransactionRow};
