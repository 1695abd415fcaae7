//! Tally Core Library
//!
//! Ingestion and storage for a single ledger of card transactions:
//! - Statement parsers for each supported institution
//! - Canonicalization into one row shape
//! - Content-derived transaction ids for deduplication
//! - Atomic, single-writer CSV ledger store
//! - Spend summaries over the ledger

pub mod canonicalize;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod import;
pub mod ingest;
pub mod models;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
pub use ingest::{add_transactions, ingest_file, load_ledger};
pub use models::{IngestStats, Ledger, Source, Transaction};
pub use store::LedgerStore;
pub use summary::{AmountMetrics, DataQuality, SpendSummary};
