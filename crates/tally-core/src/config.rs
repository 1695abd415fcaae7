//! Ledger location resolution

use std::path::PathBuf;

/// Environment variable overriding the default ledger path
pub const LEDGER_ENV: &str = "TALLY_LEDGER";

pub const LEDGER_FILE_NAME: &str = "transactions.csv";

/// Default ledger path (~/.local/share/tally/transactions.csv on Linux)
pub fn default_ledger_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tally"))
        .unwrap_or_else(|| PathBuf::from("tally-data"))
        .join(LEDGER_FILE_NAME)
}

/// Resolve the ledger path: explicit flag, then `TALLY_LEDGER`, then the default
pub fn resolve_ledger_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var_os(LEDGER_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(default_ledger_path)
}
