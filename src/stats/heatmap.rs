//! Day-of-week by hour-of-day violation counts.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use std::collections::BTreeSet;

use super::frequency::natural_cmp;

pub const HOURS: usize = 24;

/// Counts per (row label, column label); cells without observations are 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountGrid {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<Vec<usize>>,
}

impl CountGrid {
    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    pub fn as_f64(&self) -> Vec<Vec<f64>> {
        self.cells
            .iter()
            .map(|r| r.iter().map(|c| *c as f64).collect())
            .collect()
    }
}

/// Counts rows with a present `key` by day (natural order) and hour 0..23.
///
/// Rows missing the day, the time or the key are not counted.
pub fn day_hour_grid(
    days: &[Option<String>],
    times: &[Option<NaiveTime>],
    keys: &[Option<String>],
) -> CountGrid {
    let mut labels: Vec<String> = days
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    labels.sort_by(|a, b| natural_cmp(a, b));

    let mut cells = vec![vec![0usize; HOURS]; labels.len()];

    for ((day, time), key) in days.iter().zip(times).zip(keys) {
        let (Some(day), Some(time), Some(_)) = (day, time, key) else {
            continue;
        };
        if let Some(row) = labels.iter().position(|l| l == day) {
            cells[row][time.hour() as usize] += 1;
        }
    }

    CountGrid {
        rows: labels,
        cols: (0..HOURS).map(|h| h.to_string()).collect(),
        cells,
    }
}
