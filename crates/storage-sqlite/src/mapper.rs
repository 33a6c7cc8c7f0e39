//! Value conversions between domain records and their SQLite column
//! representations.

use rust_decimal::Decimal;

use pocketledger_core::time;

/// Amounts are stored as decimal strings; SQLite's float affinity would
/// silently lose cents.
pub fn amount_to_db(amount: Decimal) -> String {
    amount.to_string()
}

/// Unparseable stored amounts decode to zero rather than failing the whole
/// list load.
pub fn amount_from_db(raw: &str) -> Decimal {
    match raw.trim().parse() {
        Ok(amount) => amount,
        Err(_) => {
            log::warn!("[Sync] unparseable stored amount {raw:?}, decoding as 0");
            Decimal::ZERO
        }
    }
}

pub fn bool_to_db(value: bool) -> i32 {
    i32::from(value)
}

pub fn bool_from_db(value: i32) -> bool {
    value != 0
}

/// RFC 3339 timestamps are stored as epoch milliseconds so range filters and
/// ordering stay index-friendly.
pub fn timestamp_to_db(raw: &str) -> i64 {
    match time::rfc3339_to_epoch_millis(raw) {
        Some(millis) => millis,
        None => {
            log::warn!("[Sync] unparseable timestamp {raw:?}, storing as epoch 0");
            0
        }
    }
}

pub fn timestamp_from_db(millis: i64) -> String {
    time::epoch_millis_to_rfc3339(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_round_trip_without_precision_loss() {
        let amount = dec!(1234567.89);
        assert_eq!(amount_from_db(&amount_to_db(amount)), amount);
        assert_eq!(amount_to_db(dec!(0.10)), "0.10");
    }

    #[test]
    fn garbage_amount_decodes_to_zero() {
        assert_eq!(amount_from_db("not a number"), Decimal::ZERO);
        assert_eq!(amount_from_db(""), Decimal::ZERO);
    }

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let raw = "2024-03-01T08:00:00.250Z";
        let millis = timestamp_to_db(raw);
        assert_eq!(timestamp_from_db(millis), raw);
    }

    #[test]
    fn unparseable_timestamp_maps_to_epoch_zero() {
        assert_eq!(timestamp_to_db("yesterday"), 0);
    }
}
