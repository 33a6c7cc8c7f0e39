//! SQLite-backed transaction repository.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use pocketledger_core::categories::{decode_categories_blob, default_categories, Category};
use pocketledger_core::sync::SyncStatus;
use pocketledger_core::time;
use pocketledger_core::transactions::{Transaction, TransactionRepositoryTrait};
use pocketledger_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::mapper::timestamp_to_db;
use crate::schema::{settings, transactions};
use crate::transactions::TransactionDB;

pub struct SqliteTransactionRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SqliteTransactionRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Category list for legacy kind resolution, read from the owner's
    /// settings row. Falls back to the default set when no row exists.
    fn load_categories(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<Category>> {
        let blob = settings::table
            .find(user_id)
            .select(settings::categories)
            .first::<String>(conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(blob
            .map(|blob| decode_categories_blob(&blob))
            .unwrap_or_else(default_categories))
    }

    fn upsert_row(conn: &mut SqliteConnection, row: TransactionDB) -> Result<()> {
        diesel::insert_into(transactions::table)
            .values(&row)
            .on_conflict(transactions::id)
            .do_update()
            .set(&row)
            .execute(conn)
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepositoryTrait for SqliteTransactionRepository {
    async fn load(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let categories = Self::load_categories(&mut conn, user_id)?;
        let rows = transactions::table
            .filter(transactions::user_id.eq(user_id))
            .filter(transactions::deleted.eq(0))
            .order(transactions::date.desc())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_domain(&categories))
            .collect())
    }

    async fn insert(&self, mut tx: Transaction) -> Result<()> {
        tx.sync_status = SyncStatus::Pending;
        tx.updated_at = time::now_rfc3339();
        self.writer
            .exec(move |conn| Self::upsert_row(conn, TransactionDB::from_domain(&tx)))
            .await
    }

    async fn update(&self, mut tx: Transaction) -> Result<()> {
        tx.sync_status = SyncStatus::Pending;
        tx.updated_at = time::now_rfc3339();
        self.writer
            .exec(move |conn| Self::upsert_row(conn, TransactionDB::from_domain(&tx)))
            .await
    }

    async fn soft_delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.writer
            .exec(move |conn| {
                diesel::update(transactions::table.find(&id))
                    .set((
                        transactions::deleted.eq(1),
                        transactions::sync_status.eq(SyncStatus::Pending.as_str()),
                        transactions::updated_at.eq(timestamp_to_db(&time::now_rfc3339())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn upsert_synced(&self, mut tx: Transaction) -> Result<()> {
        tx.sync_status = SyncStatus::Synced;
        self.writer
            .exec(move |conn| Self::upsert_row(conn, TransactionDB::from_domain(&tx)))
            .await
    }

    async fn list_pending(&self) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::sync_status.eq(SyncStatus::Pending.as_str()))
            .order(transactions::updated_at.asc())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        // rows may span owners; resolve legacy kinds against each owner's list
        let mut categories_by_owner: HashMap<String, Vec<Category>> = HashMap::new();
        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            if !categories_by_owner.contains_key(&row.user_id) {
                let categories = Self::load_categories(&mut conn, &row.user_id)?;
                categories_by_owner.insert(row.user_id.clone(), categories);
            }
            let categories = &categories_by_owner[&row.user_id];
            pending.push(row.into_domain(categories));
        }
        Ok(pending)
    }

    async fn mark_all_pending_synced(&self) -> Result<usize> {
        self.writer
            .exec(move |conn| {
                let flipped = diesel::update(
                    transactions::table
                        .filter(transactions::sync_status.eq(SyncStatus::Pending.as_str())),
                )
                .set(transactions::sync_status.eq(SyncStatus::Synced.as_str()))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(flipped)
            })
            .await
    }

    async fn get_any(&self, id: &str) -> Result<Option<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .find(id)
            .first::<TransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        match row {
            Some(row) => {
                let categories = Self::load_categories(&mut conn, &row.user_id)?;
                Ok(Some(row.into_domain(&categories)))
            }
            None => Ok(None),
        }
    }
}
