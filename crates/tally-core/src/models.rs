//! Domain models for Tally

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Column order of the persisted ledger table
pub const LEDGER_COLUMNS: [&str; 9] = [
    "tx_id",
    "Date",
    "Day",
    "Month",
    "Year",
    "Amount",
    "Category",
    "Description",
    "Source",
];

/// Supported institutions for statement import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Amex,
    Discover,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Amex, Source::Discover];

    /// Tag written to the `Source` column of the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amex => "AMEX",
            Self::Discover => "DISCOVER",
        }
    }
}

impl std::str::FromStr for Source {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amex" | "americanexpress" | "american_express" => Ok(Self::Amex),
            "discover" => Ok(Self::Discover),
            _ => Err(crate::error::Error::UnsupportedSource(s.to_string())),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A statement row as produced by a format adapter, before any type coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub source: Source,
}

/// A row with typed fields and derived calendar columns, not yet fingerprinted
///
/// `date` and `amount` are `None` when the raw value could not be parsed; the
/// row is kept so gaps show up in reports instead of disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
    pub date: Option<NaiveDate>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub amount: Option<Decimal>,
    pub category: String,
    pub description: String,
    pub source: String,
}

/// A ledger row
///
/// Sign convention: positive `amount` is spend, negative is a credit or refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: String,
    pub date: Option<NaiveDate>,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub amount: Option<Decimal>,
    pub category: String,
    pub description: String,
    pub source: String,
}

impl Transaction {
    pub fn from_canonical(tx_id: String, row: CanonicalRow) -> Self {
        Self {
            tx_id,
            date: row.date,
            day: row.day,
            month: row.month,
            year: row.year,
            amount: row.amount,
            category: row.category,
            description: row.description,
            source: row.source,
        }
    }
}

/// The full ordered set of ledger rows, unique by `tx_id`
pub type Ledger = Vec<Transaction>;

/// Outcome of merging an ingested batch into the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub existing_rows: usize,
    pub incoming_rows: usize,
    pub final_rows: usize,
    pub inserted_estimate: i64,
    pub skipped_estimate: i64,
}

impl IngestStats {
    pub fn new(existing_rows: usize, incoming_rows: usize, final_rows: usize) -> Self {
        let inserted_estimate = final_rows as i64 - existing_rows as i64;
        let skipped_estimate = incoming_rows as i64 - inserted_estimate.max(0);
        Self {
            existing_rows,
            incoming_rows,
            final_rows,
            inserted_estimate,
            skipped_estimate,
        }
    }
}
