//! Ledger command implementations (list, status, reset)

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{load_ledger, summary::date_bounds, AmountMetrics, DataQuality};

use super::{money, open_store, truncate};

pub fn cmd_list(ledger_path: &Path, limit: usize) -> Result<()> {
    let store = open_store(ledger_path)?;
    let ledger = load_ledger(&store).context("Failed to load ledger")?;

    if ledger.is_empty() {
        println!("No transactions found. Import a statement with 'tally import'.");
        return Ok(());
    }

    println!(
        "{:<10}  {:<32}  {:>12}  {:<22}  {:<8}",
        "Date", "Description", "Amount", "Category", "Source"
    );
    println!("{}", "-".repeat(92));

    // Ledger is stored oldest first
    for tx in ledger.iter().rev().take(limit) {
        let date = tx
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        let amount = tx.amount.map(money).unwrap_or_else(|| "?".to_string());
        println!(
            "{:<10}  {:<32}  {:>12}  {:<22}  {:<8}",
            date,
            truncate(&tx.description, 32),
            amount,
            truncate(&tx.category, 22),
            tx.source
        );
    }

    if ledger.len() > limit {
        println!("\n   ... {} more", ledger.len() - limit);
    }

    Ok(())
}

pub fn cmd_status(ledger_path: &Path) -> Result<()> {
    let store = open_store(ledger_path)?;

    println!("📒 Ledger: {}", store.path().display());
    if !store.path().exists() {
        println!("   Not created yet. Import a statement with 'tally import'.");
        return Ok(());
    }

    let ledger = load_ledger(&store).context("Failed to load ledger")?;
    println!("   Transactions: {}", ledger.len());

    if let Some((first, last)) = date_bounds(&ledger) {
        println!("   Date range: {} to {}", first, last);
    }

    let metrics = AmountMetrics::from_transactions(&ledger);
    println!("   Gross spend: {}", money(metrics.gross_spend));
    println!("   Credits/refunds: {}", money(metrics.credits));
    println!("   Net: {}", money(metrics.net));

    let quality = DataQuality::from_transactions(&ledger);
    if quality.has_gaps() {
        println!(
            "   ⚠️  Missing dates: {}, missing amounts: {}",
            quality.missing_dates, quality.missing_amounts
        );
    }

    Ok(())
}

pub fn cmd_reset(ledger_path: &Path, yes: bool) -> Result<()> {
    let stdin = io::stdin();
    reset_with_confirmation(ledger_path, yes, stdin.lock(), io::stdout())
}

/// Reset after a `[y/N]` confirmation read from `input`, unless `yes`
pub fn reset_with_confirmation<R: BufRead, W: Write>(
    ledger_path: &Path,
    yes: bool,
    mut input: R,
    mut output: W,
) -> Result<()> {
    if !yes {
        write!(
            output,
            "⚠️  This will DELETE every transaction in {}.\n\n",
            ledger_path.display()
        )?;
        write!(output, "Are you sure? [y/N] ")?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            writeln!(output, "Cancelled.")?;
            return Ok(());
        }
    }

    let store = open_store(ledger_path)?;
    store.reset().context("Failed to reset ledger")?;

    writeln!(output, "✅ Ledger reset complete.")?;
    Ok(())
}
