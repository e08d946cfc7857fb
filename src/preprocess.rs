//! Type normalization applied before any aggregation.
//!
//! Date and time columns are parsed strictly (a bad value aborts the run);
//! numeric columns are coerced leniently, unparseable text becoming missing.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info};

use crate::dataset::{Column, Dataset, DatasetError, Result};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Which columns to normalize and how.
#[derive(Debug, Clone)]
pub struct NormalizePlan {
    pub date_column: Option<String>,
    pub time_column: Option<String>,
    pub numeric_columns: Vec<String>,
    /// Rows missing in this numeric column are dropped after coercion.
    pub drop_missing_in: Option<String>,
}

/// What normalization changed, for logging.
#[derive(Debug, Default, Serialize)]
pub struct NormalizeSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    /// Non-empty cells per numeric column that failed to coerce.
    pub coerced_to_missing: Vec<(String, usize)>,
}

/// Converts text to a number; unparseable input yields `None`.
///
/// A decimal comma is accepted. Applying this to the textual form of an
/// already numeric value returns that value.
pub fn coerce_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()?;

    parsed.is_finite().then_some(parsed)
}

/// Parses a date or date-time, keeping the calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(trimmed, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(trimmed, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a time of day in strict `HH:MM:SS` form.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M:%S").ok()
}

fn text_cells<'a>(dataset: &'a Dataset, name: &str) -> Result<Option<&'a [Option<String>]>> {
    match dataset.column(name)? {
        Column::Text(cells) => Ok(Some(cells)),
        _ => Ok(None),
    }
}

fn normalize_dates(dataset: &mut Dataset, name: &str) -> Result<()> {
    let Some(cells) = text_cells(dataset, name)? else {
        return Ok(());
    };

    let mut parsed = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let value = match cell {
            None => None,
            Some(text) => Some(parse_date(text).ok_or_else(|| DatasetError::DateParse {
                column: name.to_string(),
                row: row + 1,
                value: text.clone(),
            })?),
        };
        parsed.push(value);
    }

    dataset.replace_column(name, Column::Date(parsed))
}

fn normalize_times(dataset: &mut Dataset, name: &str) -> Result<()> {
    let Some(cells) = text_cells(dataset, name)? else {
        return Ok(());
    };

    let mut parsed = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let value = match cell {
            None => None,
            Some(text) => Some(parse_time(text).ok_or_else(|| DatasetError::TimeParse {
                column: name.to_string(),
                row: row + 1,
                value: text.clone(),
            })?),
        };
        parsed.push(value);
    }

    dataset.replace_column(name, Column::Time(parsed))
}

/// Coerces one column to numbers, returning how many present cells failed.
fn normalize_numeric(dataset: &mut Dataset, name: &str) -> Result<usize> {
    let Some(cells) = text_cells(dataset, name)? else {
        return Ok(0);
    };

    let mut failed = 0;
    let coerced: Vec<Option<f64>> = cells
        .iter()
        .map(|cell| {
            let text = cell.as_deref()?;
            let value = coerce_numeric(text);
            if value.is_none() {
                failed += 1;
            }
            value
        })
        .collect();

    dataset.replace_column(name, Column::Number(coerced))?;
    Ok(failed)
}

/// Normalizes the dataset in place according to `plan`.
///
/// # Errors
///
/// Fails on the first referenced column that is absent and on any date or
/// time value that does not parse.
#[tracing::instrument(skip_all, fields(rows = dataset.len()))]
pub fn normalize(dataset: &mut Dataset, plan: &NormalizePlan) -> Result<NormalizeSummary> {
    let mut summary = NormalizeSummary {
        rows_before: dataset.len(),
        ..Default::default()
    };

    if let Some(name) = &plan.date_column {
        normalize_dates(dataset, name)?;
    }

    if let Some(name) = &plan.time_column {
        normalize_times(dataset, name)?;
    }

    for name in &plan.numeric_columns {
        let failed = normalize_numeric(dataset, name)?;
        if failed > 0 {
            debug!(column = %name, failed, "Values coerced to missing");
        }
        summary.coerced_to_missing.push((name.clone(), failed));
    }

    if let Some(name) = &plan.drop_missing_in {
        if !plan.numeric_columns.contains(name) {
            normalize_numeric(dataset, name)?;
        }
        let mask: Vec<bool> = dataset.numeric(name)?.iter().map(Option::is_some).collect();
        dataset.retain_rows(&mask);
    }

    summary.rows_after = dataset.len();
    info!(
        rows_before = summary.rows_before,
        rows_after = summary.rows_after,
        "Dataset normalized"
    );

    Ok(summary)
}
