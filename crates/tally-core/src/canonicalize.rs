//! Type coercion and calendar columns for adapter output
//!
//! Unparsable dates and amounts become `None` rather than errors. Rows are
//! never dropped here.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::models::{CanonicalRow, SourceRow};

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%y", // 01/15/24 (before %Y, which would read "24" as year 24)
    "%m/%d/%Y", // 01/15/2024
    "%m-%d-%Y", // 01-15-2024
    "%Y/%m/%d", // 2024/01/15
    "%d/%m/%Y", // 15/01/2024 (European)
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

pub fn canonicalize(rows: Vec<SourceRow>) -> Vec<CanonicalRow> {
    rows.into_iter().map(canonicalize_row).collect()
}

pub fn canonicalize_row(row: SourceRow) -> CanonicalRow {
    let date = parse_date(&row.date);
    CanonicalRow {
        date,
        day: date.map(|d| d.day()),
        month: date.map(|d| d.month()),
        year: date.map(|d| d.year()),
        amount: parse_amount(&row.amount),
        category: row.category,
        description: row.description,
        source: row.source.as_str().to_string(),
    }
}

/// Parse a calendar date, discarding any time of day
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse an amount, handling currency symbols, thousands separators and
/// accounting-style negatives
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
