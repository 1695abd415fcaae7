//! Statement parsers for each supported institution
//!
//! Every parser turns a raw export into [`SourceRow`]s in the same order the
//! rows appear in the file. Fingerprints depend on that order, so parsers must
//! never sort or regroup rows.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Source, SourceRow};

/// Raw statement cells, row-major, header row included
type Grid = Vec<Vec<String>>;

fn amex_payment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(autopay|payment|mobile\s+payment|online\s+payment|directpay|bill\s+pay|thank\s+you)\b",
        )
        .expect("valid regex")
    })
}

fn discover_payment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(autopay|payment|online\s+payment|directpay|bill\s+pay|thank\s+you)\b")
            .expect("valid regex")
    })
}

fn promo_credit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(statement\s+credit|refer\s+a\s+friend\s+credit)\b")
            .expect("valid regex")
    })
}

const DISCOVER_DATE_HEADERS: [&str; 3] = ["transdate", "transactiondate", "transactdate"];

/// Discover category bucket holding payments and bookkeeping credits
const DISCOVER_DROP_CATEGORY: &str = "payments and credits";

/// Parse a statement file from the given institution
///
/// Spreadsheet files (`.xlsx`, `.xls`, `.xlsm`, `.ods`) are read from their
/// first worksheet; anything else is read as CSV.
pub fn parse_statement(path: &Path, source: Source) -> Result<Vec<SourceRow>> {
    let grid = if is_spreadsheet(path) {
        read_spreadsheet(path)?
    } else {
        let file = File::open(path)?;
        read_csv_grid(file)?
    };
    debug!("Read {} raw rows from {}", grid.len(), path.display());
    parse_grid(grid, source)
}

/// Parse CSV statement data from the given institution
pub fn parse_csv<R: Read>(reader: R, source: Source) -> Result<Vec<SourceRow>> {
    parse_grid(read_csv_grid(reader)?, source)
}

fn parse_grid(grid: Grid, source: Source) -> Result<Vec<SourceRow>> {
    match source {
        Source::Amex => parse_amex(grid),
        Source::Discover => parse_discover(grid),
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "xlsx" | "xls" | "xlsm" | "xlsb" | "ods"
            )
        })
        .unwrap_or(false)
}

/// Read CSV without assuming where the header is; exports often carry
/// account summary lines above it.
fn read_csv_grid<R: Read>(reader: R) -> Result<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

fn read_spreadsheet(path: &Path) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook.sheet_names().first().cloned().ok_or_else(|| {
        Error::Format(format!("Workbook has no worksheets: {}", path.display()))
    })?;
    let range = workbook.worksheet_range(&sheet)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Index of the first row whose first cell satisfies `is_header`
fn find_header_row(grid: &Grid, is_header: impl Fn(&str) -> bool) -> Option<usize> {
    grid.iter()
        .position(|row| row.first().is_some_and(|cell| is_header(cell)))
}

/// Lowercase and drop everything but ASCII letters and digits
/// ("Trans. Date" -> "transdate")
fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Locate required columns; a `None` in `lookup` means the column is missing
fn require_columns(
    institution: &str,
    header: &[String],
    lookup: [(&str, Option<usize>); 4],
) -> Result<[usize; 4]> {
    let missing: Vec<&str> = lookup
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        let available: Vec<&str> = header.iter().map(|h| h.trim()).collect();
        return Err(Error::Format(format!(
            "{} statement missing required columns: {:?}. Available columns: {:?}",
            institution, missing, available
        )));
    }

    Ok(lookup.map(|(_, idx)| idx.unwrap_or_default()))
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Parse an American Express export
/// Header row starts with "Date"; required columns: Date, Description, Amount, Category.
/// Category is hierarchical ("Restaurant-Bar & Café") and gets remapped to the
/// shared vocabulary.
fn parse_amex(grid: Grid) -> Result<Vec<SourceRow>> {
    let header_idx = find_header_row(&grid, |c| c.trim().eq_ignore_ascii_case("date"))
        .ok_or_else(|| {
            Error::Format(
                "Could not find AMEX header row. Expected first column header 'Date'".into(),
            )
        })?;

    let header = &grid[header_idx];
    let position = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let [date_col, desc_col, amount_col, category_col] = require_columns(
        "AMEX",
        header,
        [
            ("Date", position("date")),
            ("Description", position("description")),
            ("Amount", position("amount")),
            ("Category", position("category")),
        ],
    )?;

    let mut rows = Vec::new();
    let mut filtered = 0;

    for record in grid.iter().skip(header_idx + 1) {
        if is_blank(record) {
            continue;
        }

        let description = cell(record, desc_col);
        if amex_payment_re().is_match(description) {
            filtered += 1;
            continue;
        }

        let Some(category) = map_amex_category(cell(record, category_col)) else {
            filtered += 1;
            continue;
        };

        rows.push(SourceRow {
            date: cell(record, date_col).to_string(),
            description: description.to_string(),
            amount: cell(record, amount_col).to_string(),
            category: category.to_string(),
            source: Source::Amex,
        });
    }

    debug!("Parsed {} AMEX rows ({} non-spend rows dropped)", rows.len(), filtered);
    Ok(rows)
}

/// Map an AMEX "Main-Sub" category onto the shared vocabulary
///
/// Returns `None` for payment and bookkeeping buckets, which are not spend.
/// Rules are checked in order; the first hit wins.
pub fn map_amex_category(raw: &str) -> Option<&'static str> {
    let (main, sub) = raw.split_once('-').unwrap_or((raw, ""));
    let main = main.trim().to_lowercase();
    let sub = sub.trim().to_lowercase();

    // Rebates are credits we still want to see labeled
    if main.contains("award") || main.contains("rebate") {
        return Some("Awards and Rebate Credits");
    }
    if main.contains("payment") || main.contains("credit") || main.contains("fees & adjustments")
    {
        return None;
    }

    let category = if main.contains("restaurant") || main.contains("dining") {
        "Restaurants"
    } else if (main.contains("merchandise & supplies")
        && (sub.contains("grocer") || sub.contains("supermarket")))
        || main.contains("supermarket")
        || main.contains("grocery")
    {
        "Supermarkets"
    } else if (main.contains("transportation") && sub.contains("fuel"))
        || main.contains("gas")
    {
        "Gasoline"
    } else if main.contains("travel")
        || main.contains("entertainment")
        || sub.contains("lodging")
        || sub.contains("air")
        || sub.contains("hotel")
    {
        "Travel/ Entertainment"
    } else if main.contains("education") || sub.contains("school") || sub.contains("tuition") {
        "Education"
    } else if main.contains("government") || sub.contains("tax") || sub.contains("dmv") {
        "Government Services"
    } else if main.contains("interest") {
        "Interest"
    } else if main.contains("department") || sub.contains("department store") {
        "Department Stores"
    } else if main.contains("warehouse") || sub.contains("warehouse club") {
        "Warehouse Clubs"
    } else if main.contains("merchandise & supplies") {
        "Merchandise"
    } else {
        "Unknown Source"
    };
    Some(category)
}

/// Parse a Discover export
/// Format: Trans. Date,Post Date,Description,Amount,Category
fn parse_discover(grid: Grid) -> Result<Vec<SourceRow>> {
    let header_idx = find_header_row(&grid, |c| {
        DISCOVER_DATE_HEADERS.contains(&normalize_header(c).as_str())
    })
    .ok_or_else(|| {
        Error::Format(
            "Could not find Discover header row. Expected first column header like 'Trans. Date'"
                .into(),
        )
    })?;

    let header = &grid[header_idx];
    let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
    let position =
        |targets: &[&str]| normalized.iter().position(|h| targets.contains(&h.as_str()));
    let [date_col, desc_col, amount_col, category_col] = require_columns(
        "Discover",
        header,
        [
            ("Date", position(&DISCOVER_DATE_HEADERS)),
            ("Description", position(&["description"])),
            ("Amount", position(&["amount"])),
            ("Category", position(&["category"])),
        ],
    )?;

    let mut rows = Vec::new();
    let mut filtered = 0;

    for record in grid.iter().skip(header_idx + 1) {
        if is_blank(record) {
            continue;
        }

        let category = cell(record, category_col);
        let description = cell(record, desc_col);

        if category.to_lowercase().contains(DISCOVER_DROP_CATEGORY)
            || discover_payment_re().is_match(description)
            || promo_credit_re().is_match(description)
        {
            filtered += 1;
            continue;
        }

        rows.push(SourceRow {
            date: cell(record, date_col).to_string(),
            description: description.to_string(),
            amount: cell(record, amount_col).to_string(),
            category: category.to_string(),
            source: Source::Discover,
        });
    }

    debug!(
        "Parsed {} Discover rows ({} non-spend rows dropped)",
        rows.len(),
        filtered
    );
    Ok(rows)
}
