//! Small key-value table for sync state that lives outside the relational
//! schema: the pull cursor and the pre-migration settings blob.

use async_trait::async_trait;
use diesel::prelude::*;

use pocketledger_core::sync::{SyncStateRepositoryTrait, LEGACY_SETTINGS_KEY, SYNC_CURSOR_KEY};
use pocketledger_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_kv;

pub struct KvStore {
    pool: DbPool,
    writer: WriteHandle,
}

impl KvStore {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let value = app_kv::table
            .find(key)
            .select(app_kv::value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    pub async fn put(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                diesel::insert_into(app_kv::table)
                    .values((app_kv::key.eq(&key), app_kv::value.eq(&value)))
                    .on_conflict(app_kv::key)
                    .do_update()
                    .set(app_kv::value.eq(&value))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl SyncStateRepositoryTrait for KvStore {
    async fn get_cursor(&self) -> Result<Option<i64>> {
        Ok(self
            .read(SYNC_CURSOR_KEY)?
            .and_then(|raw| raw.trim().parse().ok()))
    }

    async fn set_cursor(&self, cursor_millis: i64) -> Result<()> {
        self.put(SYNC_CURSOR_KEY, cursor_millis.to_string()).await
    }

    async fn get_legacy_settings(&self) -> Result<Option<String>> {
        self.read(LEGACY_SETTINGS_KEY)
    }
}
