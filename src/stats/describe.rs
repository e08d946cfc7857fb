//! Seven-number descriptive summaries of numeric columns.

use serde::Serialize;

use super::utility::{mean, quantile_sorted, sample_stddev, sorted};
use crate::dataset::{Dataset, Result};

/// Row labels of a summary, in output order.
pub const SUMMARY_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// count, mean, std, min, quartiles and max of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Values in [`SUMMARY_ROWS`] order.
    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

/// Summarizes the given values; empty input yields count 0 and NaN elsewhere.
pub fn describe(values: &[f64]) -> NumericSummary {
    let s = sorted(values);
    let m = mean(&s);

    NumericSummary {
        count: s.len(),
        mean: m,
        std: sample_stddev(&s, m),
        min: s.first().copied().unwrap_or(f64::NAN),
        q25: quantile_sorted(&s, 0.25),
        median: quantile_sorted(&s, 0.5),
        q75: quantile_sorted(&s, 0.75),
        max: s.last().copied().unwrap_or(f64::NAN),
    }
}

/// Summaries of several columns, one per column in the given order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<(String, NumericSummary)>,
}

/// Describes each listed numeric column of the dataset.
pub fn describe_columns(dataset: &Dataset, columns: &[String]) -> Result<SummaryTable> {
    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        out.push((name.clone(), describe(&dataset.present_numbers(name)?)));
    }
    Ok(SummaryTable { columns: out })
}
