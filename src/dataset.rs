//! Columnar in-memory store for violation records.
//!
//! Loaders produce an all-text [`Dataset`]; preprocessing then replaces the
//! columns it normalizes with typed ones. Every cell is optional, `None`
//! being the "missing" marker.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading or addressing a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    #[error("Column '{column}' is not a {expected} column")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Row {row}: cannot parse '{value}' in column '{column}' as a date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Row {row}: '{value}' in column '{column}' does not match HH:MM:SS")]
    TimeParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = core::result::Result<T, DatasetError>;

/// A single column; all cells share one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Column {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
    Time(Vec<Option<NaiveTime>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Number(v) => v.len(),
            Column::Date(v) => v.len(),
            Column::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            Column::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Number(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Date(v) => v.iter().filter(|c| c.is_none()).count(),
            Column::Time(v) => v.iter().filter(|c| c.is_none()).count(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Number(_) => "number",
            Column::Date(_) => "date",
            Column::Time(_) => "time",
        }
    }

    fn retain(&mut self, mask: &[bool]) {
        fn keep<T>(cells: &mut Vec<T>, mask: &[bool]) {
            let mut idx = 0;
            cells.retain(|_| {
                let k = mask.get(idx).copied().unwrap_or(false);
                idx += 1;
                k
            });
        }

        match self {
            Column::Text(v) => keep(v, mask),
            Column::Number(v) => keep(v, mask),
            Column::Date(v) => keep(v, mask),
            Column::Time(v) => keep(v, mask),
        }
    }

    /// Display form of one cell, used for categorical grouping.
    fn display(&self, row: usize) -> Option<String> {
        match self {
            Column::Text(v) => v[row].clone(),
            Column::Number(v) => v[row].map(format_number),
            Column::Date(v) => v[row].map(|d| d.format("%Y-%m-%d").to_string()),
            Column::Time(v) => v[row].map(|t| t.format("%H:%M:%S").to_string()),
        }
    }
}

/// Formats a number the way categorical keys are shown: integral values
/// without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Ordered rows sharing a uniform schema, stored column by column.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Builds an all-text dataset. Empty cells and absent trailing fields
    /// become missing; extra fields beyond the header are ignored.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let rows = records.len();
        let mut columns: Vec<Vec<Option<String>>> =
            headers.iter().map(|_| Vec::with_capacity(rows)).collect();

        for record in &records {
            for (idx, cells) in columns.iter_mut().enumerate() {
                let cell = record
                    .get(idx)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                cells.push(cell);
            }
        }

        Self {
            names: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            columns: columns.into_iter().map(Column::Text).collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        Ok(&self.columns[self.index_of(name)?])
    }

    /// Replaces a column in place. The new column must have one cell per row.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<()> {
        let idx = self.index_of(name)?;
        debug_assert_eq!(column.len(), self.rows);
        self.columns[idx] = column;
        Ok(())
    }

    /// Keeps only the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        for column in &mut self.columns {
            column.retain(mask);
        }
        self.rows = mask.iter().take(self.rows).filter(|k| **k).count();
    }

    /// Returns a copy holding only the rows whose mask entry is `true`.
    pub fn filtered(&self, mask: &[bool]) -> Self {
        let mut copy = self.clone();
        copy.retain_rows(mask);
        copy
    }

    /// Display strings of any column, `None` for missing cells.
    pub fn categorical(&self, name: &str) -> Result<Vec<Option<String>>> {
        let column = self.column(name)?;
        Ok((0..self.rows).map(|row| column.display(row)).collect())
    }

    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            Column::Number(v) => Ok(v),
            _ => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "number",
            }),
        }
    }

    pub fn times(&self, name: &str) -> Result<&[Option<NaiveTime>]> {
        match self.column(name)? {
            Column::Time(v) => Ok(v),
            _ => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "time",
            }),
        }
    }

    pub fn dates(&self, name: &str) -> Result<&[Option<NaiveDate>]> {
        match self.column(name)? {
            Column::Date(v) => Ok(v),
            _ => Err(DatasetError::ColumnType {
                column: name.to_string(),
                expected: "date",
            }),
        }
    }

    /// Non-missing values of a numeric column.
    pub fn present_numbers(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric(name)?.iter().flatten().copied().collect())
    }

    /// Per-column missing counts in schema order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| (name.clone(), column.missing_count()))
            .collect()
    }

    /// Column names paired with their current type.
    pub fn schema(&self) -> Vec<(String, &'static str)> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(name, column)| (name.clone(), column.type_name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_records(
            vec!["gender_cd".into(), "engine_power".into()],
            vec![
                vec!["M".into(), "100".into()],
                vec!["F".into(), "".into()],
                vec!["M".into()],
            ],
        )
    }

    #[test]
    fn test_from_records_marks_empty_and_short_rows_missing() {
        let ds = sample();
        assert_eq!(ds.len(), 3);
        assert_eq!(
            ds.column("engine_power").unwrap(),
            &Column::Text(vec![Some("100".into()), None, None])
        );
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let ds = sample();
        let err = ds.column("region").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "region"));
    }

    #[test]
    fn test_numeric_view_requires_normalized_column() {
        let ds = sample();
        assert!(matches!(
            ds.numeric("engine_power"),
            Err(DatasetError::ColumnType { .. })
        ));
    }

    #[test]
    fn test_retain_rows_filters_every_column() {
        let mut ds = sample();
        ds.replace_column(
            "engine_power",
            Column::Number(vec![Some(100.0), None, Some(7.0)]),
        )
        .unwrap();
        ds.retain_rows(&[true, false, true]);

        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.categorical("gender_cd").unwrap(),
            vec![Some("M".into()), Some("M".into())]
        );
        assert_eq!(ds.numeric("engine_power").unwrap(), &[Some(100.0), Some(7.0)]);
    }

    #[test]
    fn test_categorical_formats_integral_numbers() {
        let mut ds = sample();
        ds.replace_column(
            "engine_power",
            Column::Number(vec![Some(2.0), Some(2.5), None]),
        )
        .unwrap();
        assert_eq!(
            ds.categorical("engine_power").unwrap(),
            vec![Some("2".into()), Some("2.5".into()), None]
        );
    }

    #[test]
    fn test_missing_counts() {
        let ds = sample();
        assert_eq!(
            ds.missing_counts(),
            vec![("gender_cd".into(), 0), ("engine_power".into(), 2)]
        );
    }
}
