//! Database row for the transactions table.

use diesel::prelude::*;

use pocketledger_core::categories::{infer_transaction_kind, Category, TransactionKind};
use pocketledger_core::sync::SyncStatus;
use pocketledger_core::transactions::Transaction;

use crate::mapper::{
    amount_from_db, amount_to_db, bool_from_db, bool_to_db, timestamp_from_db, timestamp_to_db,
};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub amount: String,
    pub description: String,
    pub date: i64,
    pub category: String,
    /// Empty string marks a row written before the kind column existed.
    pub kind: String,
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub sync_status: String,
    pub deleted: i32,
}

impl TransactionDB {
    pub fn from_domain(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            amount: amount_to_db(tx.amount),
            description: tx.description.clone(),
            date: timestamp_to_db(&tx.date),
            category: tx.category.clone(),
            kind: tx.kind.as_str().to_string(),
            user_id: tx.user_id.clone(),
            created_at: timestamp_to_db(&tx.created_at),
            updated_at: timestamp_to_db(&tx.updated_at),
            sync_status: tx.sync_status.as_str().to_string(),
            deleted: bool_to_db(tx.deleted),
        }
    }

    /// Decode into the domain record, resolving a legacy kind through the
    /// caller's category list.
    pub fn into_domain(self, categories: &[Category]) -> Transaction {
        let kind = TransactionKind::parse(&self.kind)
            .unwrap_or_else(|| infer_transaction_kind(&self.category, categories));
        Transaction {
            id: self.id,
            amount: amount_from_db(&self.amount),
            description: self.description,
            date: timestamp_from_db(self.date),
            category: self.category,
            kind,
            user_id: self.user_id,
            created_at: timestamp_from_db(self.created_at),
            updated_at: timestamp_from_db(self.updated_at),
            sync_status: SyncStatus::parse(&self.sync_status).unwrap_or(SyncStatus::Pending),
            deleted: bool_from_db(self.deleted),
        }
    }
}
