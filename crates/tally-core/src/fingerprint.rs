//! Content-derived transaction ids
//!
//! A `tx_id` is the SHA-1 of `SOURCE|YYYY-MM-DD|amount|description|rank`,
//! where `rank` counts earlier rows in the same batch with an identical base
//! key. Re-ingesting a file yields the same ids only if its rows arrive in the
//! same order; reordered exports shift ranks and produce new ids.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use sha1::{Digest, Sha1};

use crate::models::{CanonicalRow, Transaction};

/// Key shared by rows that describe the same purchase
pub fn base_key(row: &CanonicalRow) -> String {
    let date = row
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let amount = row.amount.map(format_amount).unwrap_or_default();
    let description = row
        .description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let source = row.source.trim().to_uppercase();

    format!("{}|{}|{}|{}", source, date, amount, description)
}

/// Fixed two-decimal rendering ("4.5" -> "4.50")
fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded.to_string()
}

fn hash_key(key: &str) -> String {
    hex::encode(Sha1::digest(key.as_bytes()))
}

/// Assign ids to a batch, keeping the batch order
///
/// Rows must be in source-file order: the occurrence rank that separates two
/// identical purchases on the same day is taken from their position.
pub fn assign_tx_ids(rows: Vec<CanonicalRow>) -> Vec<Transaction> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    rows.into_iter()
        .map(|row| {
            let key = base_key(&row);
            let seen = occurrences.entry(key.clone()).or_insert(0);
            let rank = *seen;
            *seen += 1;

            let tx_id = hash_key(&format!("{}|{}", key, rank));
            Transaction::from_canonical(tx_id, row)
        })
        .collect()
}
