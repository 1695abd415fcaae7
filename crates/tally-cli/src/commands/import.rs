//! Import command implementation

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{add_transactions, Source};

use super::open_store;

pub fn cmd_import(ledger_path: &Path, file: &Path, source_str: &str, json: bool) -> Result<()> {
    let source: Source = source_str.parse().map_err(|_| {
        anyhow::anyhow!(
            "Unknown source: {}\nSpecify --source with one of: {}",
            source_str,
            supported_sources()
        )
    })?;

    let store = open_store(ledger_path)?;

    if !json {
        println!("📥 Importing {} from {}...", source, file.display());
    }

    let stats = add_transactions(&store, file, source)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("✅ Import complete!");
    println!("   Incoming rows: {}", stats.incoming_rows);
    println!("   Inserted: {}", stats.inserted_estimate);
    println!("   Skipped (duplicates): {}", stats.skipped_estimate);
    println!(
        "   Ledger: {} → {} rows ({})",
        stats.existing_rows,
        stats.final_rows,
        store.path().display()
    );

    Ok(())
}

/// Comma-separated source names accepted by `--source` ("amex, discover")
pub fn supported_sources() -> String {
    Source::ALL
        .iter()
        .map(|s| s.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}
