//! Ingestion pipeline: parse → canonicalize → fingerprint → merge

use std::path::Path;

use tracing::{info, warn};

use crate::canonicalize::canonicalize;
use crate::error::Result;
use crate::fingerprint::assign_tx_ids;
use crate::import::parse_statement;
use crate::models::{IngestStats, Ledger, Source, Transaction};
use crate::store::LedgerStore;
use crate::summary::DataQuality;

/// Turn a statement file into fingerprinted ledger rows
///
/// Any adapter error aborts the whole file; nothing is partially ingested.
pub fn ingest_file(path: &Path, source: Source) -> Result<Vec<Transaction>> {
    let rows = parse_statement(path, source)?;
    let transactions = assign_tx_ids(canonicalize(rows));

    let quality = DataQuality::from_transactions(&transactions);
    if quality.has_gaps() {
        warn!(
            "{}: {} rows with unparsable date, {} with unparsable amount",
            path.display(),
            quality.missing_dates,
            quality.missing_amounts
        );
    }

    Ok(transactions)
}

/// Ingest a statement file and merge it into the ledger
pub fn add_transactions(store: &LedgerStore, path: &Path, source: Source) -> Result<IngestStats> {
    let transactions = ingest_file(path, source)?;
    info!(
        "Ingested {} {} rows from {}",
        transactions.len(),
        source,
        path.display()
    );
    store.merge_and_save(transactions)
}

/// Full canonical snapshot for reporting
pub fn load_ledger(store: &LedgerStore) -> Result<Ledger> {
    store.load()
}
