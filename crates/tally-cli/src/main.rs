//! Tally CLI - Card statement ledger
//!
//! Usage:
//!   tally import --file F --source S   Import a statement (amex, discover)
//!   tally list                         Show recent transactions
//!   tally summary --from D --to D      Spend by category and day
//!   tally reset                        Empty the ledger

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tally_core::config::resolve_ledger_path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let ledger = resolve_ledger_path(cli.ledger);

    match cli.command {
        Commands::Import { file, source, json } => {
            commands::cmd_import(&ledger, &file, &source, json)
        }
        Commands::List { limit } => commands::cmd_list(&ledger, limit),
        Commands::Summary {
            from,
            to,
            no_fill,
            json,
        } => commands::cmd_summary(&ledger, from.as_deref(), to.as_deref(), !no_fill, json),
        Commands::Monthly => commands::cmd_monthly(&ledger),
        Commands::Status => commands::cmd_status(&ledger),
        Commands::Reset { yes } => commands::cmd_reset(&ledger, yes),
    }
}
