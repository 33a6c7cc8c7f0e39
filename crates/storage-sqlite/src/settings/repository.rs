//! SQLite-backed settings repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use pocketledger_core::settings::{Settings, SettingsRepositoryTrait};
use pocketledger_core::sync::SyncStatus;
use pocketledger_core::time;
use pocketledger_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::settings;
use crate::settings::SettingsDB;

pub struct SqliteSettingsRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SqliteSettingsRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn upsert_row(conn: &mut SqliteConnection, row: SettingsDB) -> Result<()> {
        diesel::insert_into(settings::table)
            .values(&row)
            .on_conflict(settings::user_id)
            .do_update()
            .set(&row)
            .execute(conn)
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SqliteSettingsRepository {
    async fn get(&self, user_id: &str) -> Result<Option<Settings>> {
        let mut conn = get_connection(&self.pool)?;
        let row = settings::table
            .find(user_id)
            .first::<SettingsDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(SettingsDB::into_domain))
    }

    async fn upsert_pending(&self, mut settings: Settings) -> Result<()> {
        settings.sync_status = SyncStatus::Pending;
        settings.updated_at = time::now_rfc3339();
        self.writer
            .exec(move |conn| Self::upsert_row(conn, SettingsDB::from_domain(&settings)))
            .await
    }

    async fn upsert_synced(&self, mut settings: Settings) -> Result<()> {
        settings.sync_status = SyncStatus::Synced;
        self.writer
            .exec(move |conn| Self::upsert_row(conn, SettingsDB::from_domain(&settings)))
            .await
    }
}
