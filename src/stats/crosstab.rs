//! Two-way frequency tables restricted to the most frequent values.

use serde::Serialize;
use std::collections::HashMap;

use super::frequency::{Order, value_counts};

/// Counts and row-normalized proportions of one categorical pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub row_column: String,
    pub col_column: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub counts: Vec<Vec<usize>>,
    /// Each row sums to 1, or is all zero when its total is 0.
    pub proportions: Vec<Vec<f64>>,
}

impl CrossTab {
    pub fn row_total(&self, row: usize) -> usize {
        self.counts[row].iter().sum()
    }
}

/// Divides each row by its total; zero-total rows stay zero.
pub fn normalize_rows(counts: &[Vec<usize>]) -> Vec<Vec<f64>> {
    counts
        .iter()
        .map(|row| {
            let total: usize = row.iter().sum();
            if total == 0 {
                vec![0.0; row.len()]
            } else {
                row.iter().map(|c| *c as f64 / total as f64).collect()
            }
        })
        .collect()
}

/// Cross-tabulates `row_values` against `col_values`, keeping only the
/// `row_k` and `col_k` most frequent values of each axis.
pub fn crosstab(
    row_column: &str,
    row_values: &[Option<String>],
    col_column: &str,
    col_values: &[Option<String>],
    row_k: usize,
    col_k: usize,
) -> CrossTab {
    let rows = value_counts(row_column, row_values.iter().map(Option::as_deref), Order::Descending)
        .top(row_k)
        .keys();
    let cols = value_counts(col_column, col_values.iter().map(Option::as_deref), Order::Descending)
        .top(col_k)
        .keys();

    let row_index: HashMap<&str, usize> =
        rows.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();
    let col_index: HashMap<&str, usize> =
        cols.iter().enumerate().map(|(i, k)| (k.as_str(), i)).collect();

    let mut counts = vec![vec![0usize; cols.len()]; rows.len()];
    for (r, c) in row_values.iter().zip(col_values) {
        let (Some(r), Some(c)) = (r.as_deref(), c.as_deref()) else {
            continue;
        };
        if let (Some(&i), Some(&j)) = (row_index.get(r), col_index.get(c)) {
            counts[i][j] += 1;
        }
    }

    let proportions = normalize_rows(&counts);

    CrossTab {
        row_column: row_column.to_string(),
        col_column: col_column.to_string(),
        rows,
        cols,
        counts,
        proportions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_rows_handles_zero_total() {
        let p = normalize_rows(&[vec![1, 3], vec![0, 0]]);
        assert_eq!(p, vec![vec![0.25, 0.75], vec![0.0, 0.0]]);
    }

    #[test]
    fn test_crosstab_rows_sum_to_one() {
        let makes = col(&["LADA", "KIA", "LADA", "BMW", "LADA", "KIA", ""]);
        let types = col(&["speed", "speed", "parking", "speed", "red", "red", "speed"]);
        let ct = crosstab("auto_mark", &makes, "offenceshortstatement", &types, 10, 5);

        assert_eq!(ct.rows, vec!["LADA", "KIA", "BMW"]);
        assert_eq!(ct.cols, vec!["speed", "red", "parking"]);
        for (i, row) in ct.proportions.iter().enumerate() {
            if ct.row_total(i) > 0 {
                assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            }
        }
        assert_eq!(ct.counts[0], vec![1, 1, 1]);
    }

    #[test]
    fn test_crosstab_top_k_can_leave_empty_rows() {
        let rows = col(&["a", "a", "b"]);
        let cols = col(&["x", "x", "y"]);
        let ct = crosstab("r", &rows, "c", &cols, 2, 1);

        assert_eq!(ct.cols, vec!["x"]);
        assert_eq!(ct.counts, vec![vec![2], vec![0]]);
        assert_eq!(ct.proportions, vec![vec![1.0], vec![0.0]]);
    }
}
