//! Schema initialization.
//!
//! Runs unconditionally at every startup: base tables via `CREATE TABLE IF
//! NOT EXISTS`, then the column additions that accumulated after the first
//! release as individual `ALTER TABLE` statements. A duplicate-column error
//! means the column is already there and counts as success, which is what
//! makes re-running the whole list a no-op.

use diesel::prelude::*;
use diesel::result::Error as DieselError;

use pocketledger_core::Result;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS transactions (
        id TEXT PRIMARY KEY NOT NULL,
        amount TEXT NOT NULL DEFAULT '0',
        description TEXT NOT NULL DEFAULT '',
        date BIGINT NOT NULL DEFAULT 0,
        category TEXT NOT NULL DEFAULT '',
        created_at BIGINT NOT NULL DEFAULT 0,
        updated_at BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS settings (
        user_id TEXT PRIMARY KEY NOT NULL,
        currency TEXT NOT NULL DEFAULT 'USD',
        locale TEXT NOT NULL DEFAULT 'en-US',
        name TEXT NOT NULL DEFAULT '',
        avatar TEXT,
        budget TEXT,
        max_amount TEXT,
        notifications_enabled INTEGER NOT NULL DEFAULT 0,
        reminder_time TEXT,
        app_lock_enabled INTEGER NOT NULL DEFAULT 0,
        theme TEXT NOT NULL DEFAULT 'system',
        categories TEXT NOT NULL DEFAULT '[]',
        updated_at TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS app_kv (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )",
];

/// Columns added after the initial release, in the order they shipped.
/// `type` defaulting to the empty string doubles as the legacy marker: rows
/// that predate the column keep `''` and get their kind inferred at read
/// time from the category list.
const ADD_COLUMNS: &[(&str, &str)] = &[
    ("transactions", "user_id TEXT NOT NULL DEFAULT 'offline-user'"),
    ("transactions", "type TEXT NOT NULL DEFAULT ''"),
    ("transactions", "sync_status TEXT NOT NULL DEFAULT 'pending'"),
    ("transactions", "deleted INTEGER NOT NULL DEFAULT 0"),
    ("settings", "security_pin TEXT"),
    ("settings", "biometrics_enabled INTEGER NOT NULL DEFAULT 0"),
    ("settings", "accent_color TEXT"),
    ("settings", "is_premium INTEGER NOT NULL DEFAULT 0"),
    ("settings", "automatic_cloud_sync INTEGER NOT NULL DEFAULT 1"),
    ("settings", "sync_status TEXT NOT NULL DEFAULT 'pending'"),
];

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_sync_status ON transactions(sync_status)",
];

fn is_duplicate_column(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(_, info) if info.message().contains("duplicate column")
    )
}

/// Bring the schema up to date. Safe to call on every startup and on a
/// database created by any earlier release.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = get_connection(pool)?;

    for statement in CREATE_TABLES {
        diesel::sql_query(*statement)
            .execute(&mut conn)
            .map_err(StorageError::from)?;
    }

    for (table, column) in ADD_COLUMNS {
        let statement = format!("ALTER TABLE {table} ADD COLUMN {column}");
        match diesel::sql_query(statement).execute(&mut conn) {
            Ok(_) => {}
            Err(err) if is_duplicate_column(&err) => {}
            Err(err) => {
                log::warn!("[Sync] migration step skipped ({table}): {err}");
            }
        }
    }

    for statement in CREATE_INDEXES {
        diesel::sql_query(*statement)
            .execute(&mut conn)
            .map_err(StorageError::from)?;
    }

    Ok(())
}
