//! Transaction domain model.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::categories::TransactionKind;
use crate::errors::{Error, Result};
use crate::sync::SyncStatus;
use crate::time;

/// Upper bound for the free-text description.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// One income or expense entry.
///
/// Dates are RFC 3339 strings in the domain model; the storage layer holds
/// them as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Client-generated, immutable once assigned.
    pub id: String,
    pub amount: Decimal,
    pub description: String,
    /// Occurrence timestamp, timezone-naive semantics.
    pub date: String,
    /// Category reference by name, not by id.
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default = "SyncStatus::default_pending")]
    pub sync_status: SyncStatus,
    #[serde(default, deserialize_with = "crate::serde_util::tolerant_bool")]
    pub deleted: bool,
}

/// User-submitted fields for a new transaction; the facade fills in identity,
/// timestamps and sync metadata.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: String,
    pub date: String,
    pub category: String,
    pub kind: TransactionKind,
}

/// Client-assigned id, stable across offline creation and later sync:
/// creation epoch millis plus a random suffix.
pub fn generate_transaction_id() -> String {
    format!(
        "{}-{:08x}",
        time::now_epoch_millis(),
        rand::thread_rng().gen::<u32>()
    )
}

impl NewTransaction {
    /// Validate user input against the domain invariants.
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_sign_negative() {
            return Err(Error::validation("amount must be non-negative"));
        }
        if self.amount.normalize().scale() > 2 {
            return Err(Error::validation(
                "amount must have at most two fraction digits",
            ));
        }
        if self.description.len() > MAX_DESCRIPTION_LEN {
            return Err(Error::validation(format!(
                "description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        if time::rfc3339_to_epoch_millis(&self.date).is_none() {
            return Err(Error::validation("date is not a valid timestamp"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> NewTransaction {
        NewTransaction {
            amount: dec!(49.99),
            description: "Coffee".to_string(),
            date: "2024-03-01T08:00:00Z".to_string(),
            category: "Food".to_string(),
            kind: TransactionKind::Expense,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut tx = input();
        tx.amount = dec!(-1.00);
        assert!(tx.validate().is_err());
    }

    #[test]
    fn three_fraction_digits_are_rejected() {
        let mut tx = input();
        tx.amount = dec!(1.999);
        assert!(tx.validate().is_err());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_extra_digits() {
        let mut tx = input();
        tx.amount = dec!(1.990);
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let mut tx = input();
        tx.date = "yesterday".to_string();
        assert!(tx.validate().is_err());
    }

    #[test]
    fn generated_ids_are_unique_enough() {
        let a = generate_transaction_id();
        let b = generate_transaction_id();
        assert_ne!(a, b);
        assert!(a.contains('-'));
    }

    #[test]
    fn wire_decode_tolerates_numeric_deleted_flag() {
        let tx: Transaction = serde_json::from_str(
            r#"{
                "id": "t1",
                "amount": 12.5,
                "description": "Lunch",
                "date": "2024-03-01T12:00:00.000Z",
                "category": "Food",
                "userId": "u1",
                "createdAt": "2024-03-01T12:00:00.000Z",
                "updatedAt": "2024-03-01T12:00:00.000Z",
                "syncStatus": "synced",
                "deleted": 1
            }"#,
        )
        .unwrap();
        assert!(tx.deleted);
        assert_eq!(tx.kind, TransactionKind::Expense);
    }
}
