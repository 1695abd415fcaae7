//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - One deduplicated ledger for all your card statements
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Merge card statement exports into one deduplicated ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Ledger file path
    ///
    /// Defaults to $TALLY_LEDGER, then ~/.local/share/tally/transactions.csv
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a statement export into the ledger
    Import {
        /// Statement file (.csv, or .xlsx for AMEX)
        #[arg(short, long)]
        file: PathBuf,

        /// Issuing institution: amex, discover
        #[arg(short, long)]
        source: String,

        /// Print ingestion statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ledger transactions (most recent first)
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Spend summary by category and day
    Summary {
        /// Start date (YYYY-MM-DD), defaults to the earliest transaction
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to the latest transaction
        #[arg(long)]
        to: Option<String>,

        /// Only list days that have spend
        #[arg(long)]
        no_fill: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Net amount per month and category
    Monthly,

    /// Show ledger location, size and data quality
    Status,

    /// Delete every transaction in the ledger
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
