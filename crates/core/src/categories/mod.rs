//! Category model, default seed set and the legacy kind-inference rules.
//!
//! Categories are persisted as a single JSON blob inside the settings record,
//! not as their own table. Editing the list is therefore a whole-list rewrite
//! through the settings service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, Result};

/// Whether a transaction (and the categories attachable to it) moves money
/// out or in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl Default for TransactionKind {
    fn default() -> Self {
        TransactionKind::Expense
    }
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "expense" => Some(TransactionKind::Expense),
            "income" => Some(TransactionKind::Income),
            _ => None,
        }
    }
}

/// A user-defined tag grouping transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub color: String,
    pub icon: String,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
        kind: TransactionKind,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
            kind,
        }
    }
}

/// Category names that predate the income/expense distinction and are known
/// to be income. Anything else without a recorded kind defaults to expense.
pub const KNOWN_INCOME_CATEGORY_NAMES: [&str; 6] = [
    "Salary",
    "Income",
    "Freelance",
    "Investments",
    "Bonus",
    "Refunds",
];

/// Seed set written on first run and used as the recovery fallback when the
/// stored blob is malformed.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("Food", "#FF6B6B", "restaurant", TransactionKind::Expense),
        Category::new("Transport", "#4ECDC4", "directions-car", TransactionKind::Expense),
        Category::new("Shopping", "#FFD166", "shopping-bag", TransactionKind::Expense),
        Category::new("Bills", "#118AB2", "receipt", TransactionKind::Expense),
        Category::new("Entertainment", "#9B5DE5", "movie", TransactionKind::Expense),
        Category::new("Health", "#06D6A0", "favorite", TransactionKind::Expense),
        Category::new("Other", "#8D99AE", "more-horiz", TransactionKind::Expense),
        Category::new("Salary", "#2EC4B6", "payments", TransactionKind::Income),
    ]
}

/// Kind for a category that predates the `type` field.
pub fn infer_category_kind(name: &str) -> TransactionKind {
    if KNOWN_INCOME_CATEGORY_NAMES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name.trim()))
    {
        TransactionKind::Income
    } else {
        TransactionKind::Expense
    }
}

/// Kind for a legacy transaction row, resolved through the category list.
pub fn infer_transaction_kind(category_name: &str, categories: &[Category]) -> TransactionKind {
    categories
        .iter()
        .find(|category| category.name == category_name)
        .map(|category| category.kind)
        .unwrap_or(TransactionKind::Expense)
}

/// Decode one category object, tolerating a missing `type` field.
///
/// Returns `None` when the item has no usable name; callers skip such items.
fn decode_category_item(item: &Value) -> Option<Category> {
    let object = item.as_object()?;
    let name = object.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(TransactionKind::parse)
        .unwrap_or_else(|| infer_category_kind(name));
    Some(Category {
        name: name.to_string(),
        color: text("color"),
        icon: text("icon"),
        kind,
    })
}

/// Decode a category list from a JSON value (array or JSON-encoded string).
///
/// Recovery is per-item; a list that yields nothing usable falls back to the
/// default set rather than failing the load.
pub fn decode_categories_value(value: &Value) -> Vec<Category> {
    let items = match value {
        Value::Array(items) => items.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            _ => return default_categories(),
        },
        _ => return default_categories(),
    };

    let decoded: Vec<Category> = items.iter().filter_map(decode_category_item).collect();
    if decoded.is_empty() {
        default_categories()
    } else {
        decoded
    }
}

/// Decode the JSON-encoded blob stored in the settings record.
pub fn decode_categories_blob(raw: &str) -> Vec<Category> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => decode_categories_value(&value),
        Err(_) => default_categories(),
    }
}

/// Encode a category list into the storage/wire blob representation.
pub fn encode_categories_blob(categories: &[Category]) -> String {
    serde_json::to_string(categories).unwrap_or_else(|_| String::from("[]"))
}

/// Remove a category by name. Deleting the last remaining category is
/// refused so the list never reaches zero.
pub fn remove_category(categories: &mut Vec<Category>, name: &str) -> Result<()> {
    if categories.len() <= 1 {
        return Err(Error::validation(
            "the last remaining category cannot be deleted",
        ));
    }
    let before = categories.len();
    categories.retain(|category| category.name != name);
    if categories.len() == before {
        return Err(Error::validation(format!("unknown category '{name}'")));
    }
    Ok(())
}
