//! Integration tests for tally-core
//!
//! These tests exercise the full parse → fingerprint → merge → load workflow
//! against real files in a scratch directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_core::{
    add_transactions, ingest_file, load_ledger, summary::AmountMetrics, Error, LedgerStore, Source,
};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn discover_statement() -> &'static str {
    r#"Trans. Date,Post Date,Description,Amount,Category
01/05/2024,01/06/2024,COFFEE SHOP,4.50,Restaurants
01/05/2024,01/06/2024,COFFEE SHOP,4.50,Restaurants
01/07/2024,01/08/2024,SHELL OIL 12345,38.20,Gasoline
01/09/2024,01/09/2024,INTERNET PAYMENT - THANK YOU,-250.00,Payments and Credits
01/10/2024,01/11/2024,AMAZON MKTPLACE REFUND,-19.99,Merchandise"#
}

fn amex_statement() -> &'static str {
    r#"Prepared for,,,
JANE DOE,,,
Date,Description,Amount,Category
01/04/2024,BLUE BOTTLE COFFEE,6.25,Restaurant-Bar & Café
01/06/2024,AUTOPAY PAYMENT - THANK YOU,-900.00,Payments-Payment
01/08/2024,SAFEWAY #1234,72.10,Merchandise & Supplies-Groceries"#
}

fn setup() -> (TempDir, LedgerStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LedgerStore::open(dir.path().join("data").join("transactions.csv"))
        .expect("Failed to open ledger");
    (dir, store)
}

#[test]
fn test_full_ingest_workflow() {
    let (dir, store) = setup();
    let file = write_file(dir.path(), "discover.csv", discover_statement());

    let stats = add_transactions(&store, &file, Source::Discover).unwrap();
    // Payment row never reaches the ledger
    assert_eq!(stats.incoming_rows, 4);
    assert_eq!(stats.existing_rows, 0);
    assert_eq!(stats.final_rows, 4);
    assert_eq!(stats.inserted_estimate, 4);
    assert_eq!(stats.skipped_estimate, 0);

    let ledger = load_ledger(&store).unwrap();
    assert_eq!(ledger.len(), 4);
    assert!(ledger.iter().all(|t| !t.description.contains("PAYMENT")));
    assert!(ledger.iter().all(|t| t.source == "DISCOVER"));
}

#[test]
fn test_reingestion_is_idempotent() {
    let (dir, store) = setup();
    let file = write_file(dir.path(), "discover.csv", discover_statement());

    let first = add_transactions(&store, &file, Source::Discover).unwrap();
    let second = add_transactions(&store, &file, Source::Discover).unwrap();

    assert_eq!(second.existing_rows, first.final_rows);
    assert_eq!(second.final_rows, first.final_rows);
    assert_eq!(second.inserted_estimate, 0);
    assert_eq!(second.skipped_estimate, 4);
}

#[test]
fn test_identical_purchases_are_both_kept() {
    let (dir, store) = setup();
    let file = write_file(
        dir.path(),
        "x.csv",
        "Date,Description,Amount,Category\n\
         2024-01-05,COFFEE SHOP,4.50,Restaurant-Coffee\n\
         2024-01-05,COFFEE SHOP,4.50,Restaurant-Coffee\n",
    );

    let first = add_transactions(&store, &file, Source::Amex).unwrap();
    assert_eq!(first.final_rows, 2);

    let ledger = load_ledger(&store).unwrap();
    assert_ne!(ledger[0].tx_id, ledger[1].tx_id);

    let again = add_transactions(&store, &file, Source::Amex).unwrap();
    assert_eq!(again.inserted_estimate, 0);
    assert_eq!(again.skipped_estimate, 2);
    assert_eq!(again.final_rows, 2);
}

#[test]
fn test_overlapping_statements_merge() {
    let (dir, store) = setup();
    let january = write_file(
        dir.path(),
        "jan.csv",
        "Trans. Date,Post Date,Description,Amount,Category\n\
         01/05/2024,01/06/2024,COFFEE SHOP,4.50,Restaurants\n\
         01/20/2024,01/21/2024,BOOKSTORE,12.00,Merchandise\n",
    );
    let overlap = write_file(
        dir.path(),
        "jan-feb.csv",
        "Trans. Date,Post Date,Description,Amount,Category\n\
         01/20/2024,01/21/2024,BOOKSTORE,12.00,Merchandise\n\
         02/02/2024,02/03/2024,CINEMA,15.00,Travel/ Entertainment\n",
    );

    add_transactions(&store, &january, Source::Discover).unwrap();
    let stats = add_transactions(&store, &overlap, Source::Discover).unwrap();
    assert_eq!(stats.inserted_estimate, 1);
    assert_eq!(stats.skipped_estimate, 1);

    let ledger = load_ledger(&store).unwrap();
    let descriptions: Vec<&str> = ledger.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["COFFEE SHOP", "BOOKSTORE", "CINEMA"]);
}

#[test]
fn test_sources_share_one_ledger() {
    let (dir, store) = setup();
    let discover = write_file(dir.path(), "discover.csv", discover_statement());
    let amex = write_file(dir.path(), "amex.csv", amex_statement());

    add_transactions(&store, &discover, Source::Discover).unwrap();
    let stats = add_transactions(&store, &amex, Source::Amex).unwrap();
    assert_eq!(stats.incoming_rows, 2);
    assert_eq!(stats.final_rows, 6);

    let ledger = load_ledger(&store).unwrap();
    let ids: HashSet<&str> = ledger.iter().map(|t| t.tx_id.as_str()).collect();
    assert_eq!(ids.len(), ledger.len());

    // Dates ascending across sources
    let dates: Vec<_> = ledger.iter().map(|t| t.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let safeway = ledger
        .iter()
        .find(|t| t.description == "SAFEWAY #1234")
        .unwrap();
    assert_eq!(safeway.category, "Supermarkets");
    assert_eq!(safeway.source, "AMEX");
}

#[test]
fn test_sign_convention_on_loaded_ledger() {
    let (dir, store) = setup();
    let file = write_file(dir.path(), "discover.csv", discover_statement());
    add_transactions(&store, &file, Source::Discover).unwrap();

    let ledger = load_ledger(&store).unwrap();
    let metrics = AmountMetrics::from_transactions(&ledger);

    let positives: Decimal = ledger
        .iter()
        .filter_map(|t| t.amount)
        .filter(|a| *a > Decimal::ZERO)
        .sum();
    let negatives: Decimal = ledger
        .iter()
        .filter_map(|t| t.amount)
        .filter(|a| *a < Decimal::ZERO)
        .sum();

    assert_eq!(metrics.gross_spend, positives);
    assert_eq!(metrics.credits, -negatives);
    assert_eq!(metrics.gross_spend, Decimal::new(4720, 2));
    assert_eq!(metrics.credits, Decimal::new(1999, 2));
}

#[test]
fn test_malformed_file_aborts_without_writing() {
    let (dir, store) = setup();
    let good = write_file(dir.path(), "discover.csv", discover_statement());
    add_transactions(&store, &good, Source::Discover).unwrap();
    let before = fs::read(store.path()).unwrap();

    // Declared as Discover but has no recognizable header
    let bad = write_file(dir.path(), "bad.csv", amex_statement());
    let err = add_transactions(&store, &bad, Source::Discover).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
    assert!(err.to_string().contains("Trans. Date"));

    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn test_unparsable_fields_are_kept_as_nulls() {
    let (dir, _store) = setup();
    let file = write_file(
        dir.path(),
        "discover.csv",
        "Trans. Date,Post Date,Description,Amount,Category\n\
         someday,01/06/2024,MYSTERY,4.50,Restaurants\n\
         01/07/2024,01/08/2024,PENDING,TBD,Restaurants\n",
    );

    let rows = ingest_file(&file, Source::Discover).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, None);
    assert_eq!(rows[0].year, None);
    assert_eq!(rows[1].amount, None);
    assert_ne!(rows[0].tx_id, rows[1].tx_id);
}

#[test]
fn test_missing_file_is_io_error() {
    let (dir, store) = setup();
    let err = add_transactions(&store, &dir.path().join("nope.csv"), Source::Discover)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!store.path().exists());
}

#[test]
fn test_reset_empties_ledger() {
    let (dir, store) = setup();
    let file = write_file(dir.path(), "discover.csv", discover_statement());
    add_transactions(&store, &file, Source::Discover).unwrap();

    store.reset().unwrap();
    assert!(load_ledger(&store).unwrap().is_empty());

    // Ingesting after a reset starts from scratch
    let stats = add_transactions(&store, &file, Source::Discover).unwrap();
    assert_eq!(stats.existing_rows, 0);
    assert_eq!(stats.inserted_estimate, 4);
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_amex_spreadsheet_ingest() {
    let (_dir, store) = setup();
    let file = fixture("amex_statement.xlsx");

    // Preamble rows above the header, Excel date cells, numeric amounts
    let rows = ingest_file(&file, Source::Amex).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|t| !t.description.contains("AUTOPAY")));

    let coffee = &rows[0];
    assert_eq!(coffee.date, NaiveDate::from_ymd_opt(2024, 1, 5));
    assert_eq!(coffee.day, Some(5));
    assert_eq!(coffee.amount, Some(Decimal::new(450, 2)));
    assert_eq!(coffee.category, "Restaurants");
    assert_eq!(coffee.source, "AMEX");
    assert_eq!(coffee.tx_id, "e62c1a6c6ef8cb2a38491f96e91ada523e52be20");
    assert_eq!(rows[1].tx_id, "3313bc089ac784b4c8f80034f93e4cb67fd01a22");

    let safeway = &rows[2];
    assert_eq!(safeway.date, NaiveDate::from_ymd_opt(2024, 1, 7));
    assert_eq!(safeway.amount, Some(Decimal::new(7210, 2)));
    assert_eq!(safeway.category, "Supermarkets");
    assert_eq!(safeway.tx_id, "7cb5b832c7b2357884bef686ba8b6d559d34e718");

    let first = add_transactions(&store, &file, Source::Amex).unwrap();
    assert_eq!(first.inserted_estimate, 3);
    assert_eq!(first.skipped_estimate, 0);

    let again = add_transactions(&store, &file, Source::Amex).unwrap();
    assert_eq!(again.inserted_estimate, 0);
    assert_eq!(again.skipped_estimate, 3);
    assert_eq!(load_ledger(&store).unwrap().len(), 3);
}

#[test]
fn test_stats_serialize_to_json() {
    let (dir, store) = setup();
    let file = write_file(dir.path(), "discover.csv", discover_statement());
    let stats = add_transactions(&store, &file, Source::Discover).unwrap();

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["inserted_estimate"], 4);
    assert_eq!(json["final_rows"], 4);
}
