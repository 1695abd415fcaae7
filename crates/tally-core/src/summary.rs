//! Spend summaries over a loaded ledger
//!
//! Amount contract: positive = spend, negative = credit/refund. Nothing here
//! infers sign from the data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Transaction;

/// Label for rows without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Gross spend, credits and net over a set of rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AmountMetrics {
    /// Sum of positive amounts
    pub gross_spend: Decimal,
    /// Absolute sum of negative amounts
    pub credits: Decimal,
    /// Sum of all amounts
    pub net: Decimal,
}

impl AmountMetrics {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .filter_map(|t| t.amount)
            .fold(Self::default(), |mut m, amount| {
                if amount > Decimal::ZERO {
                    m.gross_spend += amount;
                } else {
                    m.credits += amount.abs();
                }
                m.net += amount;
                m
            })
    }
}

/// Rows whose date or amount could not be parsed at ingestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub total_rows: usize,
    pub missing_dates: usize,
    pub missing_amounts: usize,
}

impl DataQuality {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        Self {
            total_rows: transactions.len(),
            missing_dates: transactions.iter().filter(|t| t.date.is_none()).count(),
            missing_amounts: transactions.iter().filter(|t| t.amount.is_none()).count(),
        }
    }

    pub fn has_gaps(&self) -> bool {
        self.missing_dates > 0 || self.missing_amounts > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub spend: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySpend {
    pub day: NaiveDate,
    pub spend: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCategorySpend {
    /// `YYYY-MM`
    pub month: String,
    pub category: String,
    pub spend: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpendSummary {
    /// Ordered by category name
    pub by_category: Vec<CategorySpend>,
    /// Ordered by day
    pub by_day: Vec<DailySpend>,
}

fn category_label(category: &str) -> String {
    let category = category.trim();
    if category.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        category.to_string()
    }
}

/// Spend (positive amounts only) within `[start, end]`, by category and by day
///
/// With `fill_missing_days`, every day of the range appears in `by_day`,
/// zero where nothing was spent.
pub fn spend_summary(
    transactions: &[Transaction],
    start: NaiveDate,
    end: NaiveDate,
    fill_missing_days: bool,
) -> SpendSummary {
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for tx in transactions {
        let (Some(date), Some(amount)) = (tx.date, tx.amount) else {
            continue;
        };
        if date < start || date > end || amount <= Decimal::ZERO {
            continue;
        }

        *by_category.entry(category_label(&tx.category)).or_default() += amount;
        *by_day.entry(date).or_default() += amount;
    }

    if fill_missing_days && start <= end {
        for day in start.iter_days().take_while(|d| *d <= end) {
            by_day.entry(day).or_default();
        }
    }

    SpendSummary {
        by_category: by_category
            .into_iter()
            .map(|(category, spend)| CategorySpend { category, spend })
            .collect(),
        by_day: by_day
            .into_iter()
            .map(|(day, spend)| DailySpend { day, spend })
            .collect(),
    }
}

/// Net amount per month and category, months ascending, largest spend first
/// within a month
///
/// Refunds are included, so a category can net out negative.
pub fn monthly_spend_by_category(transactions: &[Transaction]) -> Vec<MonthlyCategorySpend> {
    let mut totals: BTreeMap<(String, String), Decimal> = BTreeMap::new();

    for tx in transactions {
        let (Some(date), Some(amount)) = (tx.date, tx.amount) else {
            continue;
        };
        let month = date.format("%Y-%m").to_string();
        *totals
            .entry((month, category_label(&tx.category)))
            .or_default() += amount;
    }

    let mut monthly: Vec<MonthlyCategorySpend> = totals
        .into_iter()
        .map(|((month, category), spend)| MonthlyCategorySpend {
            month,
            category,
            spend,
        })
        .collect();

    monthly.sort_by(|a, b| a.month.cmp(&b.month).then_with(|| b.spend.cmp(&a.spend)));
    monthly
}

/// Earliest and latest known dates in the ledger
pub fn date_bounds(transactions: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = transactions.iter().filter_map(|t| t.date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}
