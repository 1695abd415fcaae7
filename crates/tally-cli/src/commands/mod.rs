//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `import` - Statement import into the ledger
//! - `ledger` - Ledger inspection and maintenance (list, status, reset)
//! - `reports` - Spend summaries (summary, monthly)

pub mod import;
pub mod ledger;
pub mod reports;

// Re-export command functions for main.rs
pub use import::*;
pub use ledger::*;
pub use reports::*;

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tally_core::LedgerStore;

/// Open the ledger store, creating its directory if needed
pub fn open_store(ledger_path: &Path) -> Result<LedgerStore> {
    LedgerStore::open(ledger_path)
        .with_context(|| format!("Failed to open ledger: {}", ledger_path.display()))
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render an amount as dollars with two decimals ("-$20.00")
pub fn money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${}", rounded.abs())
    } else {
        format!("${}", rounded.abs())
    }
}
