//! CSV-backed ledger storage
//!
//! The store owns the on-disk table. Every write goes through a temp file in
//! the ledger's directory that is fsynced and then renamed over the ledger, so
//! readers only ever see complete snapshots. Mutating operations also hold an
//! exclusive advisory lock on `<ledger>.lock` for their whole span; a second
//! writer gets [`Error::LedgerBusy`] instead of silently losing its rows.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use fs2::FileExt;
use tracing::{debug, info};

use crate::canonicalize::{parse_amount, parse_date};
use crate::error::{Error, Result};
use crate::models::{IngestStats, Ledger, Transaction, LEDGER_COLUMNS};

/// Handle to a ledger file
///
/// Holds no open file between calls; dropping the store closes it.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LedgerStore {
    /// Open (or prepare to create) the ledger at `path`
    ///
    /// Creates the parent directory if it doesn't exist. The ledger file itself
    /// is only written by the first save, merge or reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let dir = parent_dir(&path);

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create ledger directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            info!("Created ledger directory: {}", dir.display());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        let lock_path = dir.join(format!("{}.lock", file_name));

        Ok(Self { path, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file used for the single-writer lock
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Load the current ledger
    ///
    /// A missing file is an empty ledger. Columns missing from the file are
    /// filled with nulls. A file that exists but cannot be read or parsed is a
    /// [`Error::Storage`], never an empty ledger.
    pub fn load(&self) -> Result<Ledger> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to open ledger {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        read_ledger(file).map_err(|e| match e {
            Error::Storage(msg) => {
                Error::Storage(format!("Ledger {}: {}", self.path.display(), msg))
            }
            other => Error::Storage(format!("Ledger {}: {}", self.path.display(), other)),
        })
    }

    /// Replace the ledger with `ledger` as one complete snapshot
    pub fn save(&self, ledger: &[Transaction]) -> Result<()> {
        let _lock = self.lock()?;
        self.write_snapshot(ledger)
    }

    /// Merge an ingested batch into the ledger and persist it
    ///
    /// Existing rows win over incoming rows with the same `tx_id`. The result
    /// is ordered by date ascending, then amount descending.
    pub fn merge_and_save(&self, new_rows: Vec<Transaction>) -> Result<IngestStats> {
        let _lock = self.lock()?;

        let existing = self.load()?;
        let existing_rows = existing.len();
        let incoming_rows = new_rows.len();

        let merged = merge(existing, new_rows);
        let stats = IngestStats::new(existing_rows, incoming_rows, merged.len());

        self.write_snapshot(&merged)?;

        info!(
            "Merged {} incoming rows into {} ({} inserted, {} skipped, {} total)",
            stats.incoming_rows,
            self.path.display(),
            stats.inserted_estimate,
            stats.skipped_estimate,
            stats.final_rows
        );
        Ok(stats)
    }

    /// Replace the ledger with an empty table
    ///
    /// Irreversible. Callers are expected to have confirmed with the user.
    pub fn reset(&self) -> Result<()> {
        let _lock = self.lock()?;
        self.write_snapshot(&[])?;
        info!("Reset ledger {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<WriterLock> {
        WriterLock::acquire(&self.lock_path, &self.path)
    }

    fn write_snapshot(&self, ledger: &[Transaction]) -> Result<()> {
        let mut ids = HashSet::with_capacity(ledger.len());
        if let Some(dup) = ledger.iter().find(|tx| !ids.insert(tx.tx_id.as_str())) {
            return Err(Error::InvalidData(format!(
                "Duplicate tx_id in ledger: {}",
                dup.tx_id
            )));
        }

        self.write_atomic(|file| write_ledger(file, ledger))?;
        debug!("Wrote {} rows to {}", ledger.len(), self.path.display());
        Ok(())
    }

    /// Write through a temp file and rename it over the ledger
    ///
    /// If `write` fails the temp file is removed and the ledger is untouched.
    fn write_atomic(&self, write: impl FnOnce(&mut File) -> Result<()>) -> Result<()> {
        let dir = parent_dir(&self.path);
        let prefix = format!(
            ".{}.",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );

        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)?;

        write(tmp.as_file_mut())?;

        // Temp files are created owner-only; keep whatever mode the ledger had
        match fs::metadata(&self.path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        sync_dir(&dir)
    }
}

/// Concatenate, keep the first row per `tx_id`, and order deterministically
pub fn merge(existing: Ledger, incoming: Ledger) -> Ledger {
    let mut seen = HashSet::new();
    let mut merged: Ledger = existing
        .into_iter()
        .chain(incoming)
        .filter(|tx| seen.insert(tx.tx_id.clone()))
        .collect();

    merged.sort_by(ledger_order);
    merged
}

/// Date ascending, amount descending, nulls last; stable for ties
fn ledger_order(a: &Transaction, b: &Transaction) -> Ordering {
    nulls_last(a.date.as_ref(), b.date.as_ref(), |x, y| x.cmp(y))
        .then_with(|| nulls_last(a.amount.as_ref(), b.amount.as_ref(), |x, y| y.cmp(x)))
}

fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Flush the directory entry so a completed rename survives power loss
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Exclusive advisory lock, released on drop
struct WriterLock {
    file: File,
}

impl WriterLock {
    fn acquire(lock_path: &Path, ledger_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(Error::LedgerBusy(ledger_path.to_path_buf()));
            }
            return Err(Error::Io(e));
        }

        Ok(Self { file })
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn read_ledger<R: Read>(reader: R) -> Result<Ledger> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::Storage("file has no header row".into()));
    }

    let columns: Vec<Option<usize>> = LEDGER_COLUMNS
        .iter()
        .map(|name| headers.iter().position(|h| h.trim() == *name))
        .collect();

    let mut ledger = Vec::new();
    for result in rdr.records() {
        let record = result?;
        ledger.push(record_to_transaction(&record, &columns));
    }
    Ok(ledger)
}

/// `columns` is indexed like [`LEDGER_COLUMNS`]
fn record_to_transaction(record: &StringRecord, columns: &[Option<usize>]) -> Transaction {
    let field = |i: usize| column_value(record, columns, i);

    Transaction {
        tx_id: field(0).to_string(),
        date: parse_date(field(1)),
        day: parse_whole(field(2)).and_then(|n| u32::try_from(n).ok()),
        month: parse_whole(field(3)).and_then(|n| u32::try_from(n).ok()),
        year: parse_whole(field(4)).and_then(|n| i32::try_from(n).ok()),
        amount: parse_amount(field(5)),
        category: field(6).to_string(),
        description: field(7).to_string(),
        source: field(8).to_string(),
    }
}

/// Raw cell text; text columns round-trip byte for byte
fn column_value<'a>(record: &'a StringRecord, columns: &[Option<usize>], i: usize) -> &'a str {
    columns[i].and_then(|idx| record.get(idx)).unwrap_or("")
}

/// Integer column that may have been written as float text ("5.0")
fn parse_whole(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn write_ledger<W: Write>(writer: W, ledger: &[Transaction]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(LEDGER_COLUMNS)?;

    for tx in ledger {
        wtr.write_record([
            tx.tx_id.clone(),
            tx.date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            opt_to_string(tx.day),
            opt_to_string(tx.month),
            opt_to_string(tx.year),
            opt_to_string(tx.amount),
            tx.category.clone(),
            tx.description.clone(),
            tx.source.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
