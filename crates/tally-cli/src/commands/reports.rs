//! Report command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tally_core::{
    load_ledger,
    summary::{date_bounds, monthly_spend_by_category, spend_summary},
};

use super::{money, open_store, truncate};

fn parse_day(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD): {}", flag, s))
}

pub fn cmd_summary(
    ledger_path: &Path,
    from: Option<&str>,
    to: Option<&str>,
    fill_missing_days: bool,
    json: bool,
) -> Result<()> {
    let store = open_store(ledger_path)?;
    let ledger = load_ledger(&store).context("Failed to load ledger")?;

    let Some((first, last)) = date_bounds(&ledger) else {
        println!("No dated transactions found. Import a statement with 'tally import'.");
        return Ok(());
    };

    let from = from.map(|s| parse_day(s, "--from")).transpose()?.unwrap_or(first);
    let to = to.map(|s| parse_day(s, "--to")).transpose()?.unwrap_or(last);
    if from > to {
        anyhow::bail!("--from ({}) is after --to ({})", from, to);
    }

    let summary = spend_summary(&ledger, from, to, fill_missing_days);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Spend from {} to {}", from, to);
    println!();
    println!("By category:");
    for row in &summary.by_category {
        println!("   {:<28} {:>12}", truncate(&row.category, 28), money(row.spend));
    }

    println!();
    println!("By day:");
    for row in &summary.by_day {
        println!("   {}  {:>12}", row.day, money(row.spend));
    }

    Ok(())
}

pub fn cmd_monthly(ledger_path: &Path) -> Result<()> {
    let store = open_store(ledger_path)?;
    let ledger = load_ledger(&store).context("Failed to load ledger")?;

    let monthly = monthly_spend_by_category(&ledger);
    if monthly.is_empty() {
        println!("No dated transactions found. Import a statement with 'tally import'.");
        return Ok(());
    }

    let mut current_month = "";
    for row in &monthly {
        if row.month != current_month {
            println!();
            println!("📅 {}", row.month);
            current_month = &row.month;
        }
        println!("   {:<28} {:>12}", truncate(&row.category, 28), money(row.spend));
    }

    Ok(())
}
