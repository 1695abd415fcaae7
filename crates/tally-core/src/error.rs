//! Error types for Tally

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Raw statement does not match the layout expected for its source
    #[error("Format error: {0}")]
    Format(String),

    /// Ledger file is present but unreadable or corrupt
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Ledger is locked by another writer: {}", .0.display())]
    LedgerBusy(PathBuf),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
