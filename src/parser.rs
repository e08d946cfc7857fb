//! Loading of violation datasets from delimited text or spreadsheet workbooks.
//!
//! Both formats produce the same all-text logical schema; typing happens in
//! [`crate::preprocess`].

use calamine::{Data, Reader, open_workbook_auto};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::dataset::{Dataset, DatasetError, Result};

/// Loads a dataset, choosing the reader from the file extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV or
/// spreadsheet content, or has an unsupported extension.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let dataset = match extension.as_str() {
        "csv" | "txt" => parse_csv(File::open(path)?)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => parse_workbook(path)?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };

    info!(
        rows = dataset.len(),
        columns = dataset.column_names().len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Parses comma-delimited text with a header row.
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!(records = records.len(), "CSV parsed");
    Ok(Dataset::from_records(headers, records))
}

/// Reads the first worksheet of a workbook.
fn parse_workbook(path: &Path) -> Result<Dataset> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| DatasetError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DatasetError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| DatasetError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Ok(Dataset::default()),
    };

    let records: Vec<Vec<String>> = rows.map(|row| row.iter().map(cell_text).collect()).collect();

    debug!(records = records.len(), "Worksheet parsed");
    Ok(Dataset::from_records(headers, records))
}

/// Renders a spreadsheet cell to the textual form the CSV reader would see.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => crate::dataset::format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serial values below one day carry only a time of day.
            Some(value) if dt.as_f64() < 1.0 => value.format("%H:%M:%S").to_string(),
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    #[test]
    fn test_parse_csv_reads_header_and_rows() {
        let input = "gender_cd,age\nM,30\nF,\n";
        let ds = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(ds.column_names(), &["gender_cd".to_string(), "age".to_string()]);
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.column("age").unwrap(),
            &Column::Text(vec![Some("30".into()), None])
        );
    }

    #[test]
    fn test_parse_csv_strips_byte_order_mark() {
        let input = "\u{feff}region\nA\n";
        let ds = parse_csv(input.as_bytes()).unwrap();
        assert!(ds.has_column("region"));
    }

    #[test]
    fn test_parse_csv_empty_input() {
        let ds = parse_csv("".as_bytes()).unwrap();
        assert!(ds.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_dataset(Path::new("violations.parquet"));
        assert!(matches!(result, Err(DatasetError::UnsupportedFormat(ref e)) if e == "parquet"));
    }

    #[test]
    fn test_cell_text_formats_numbers() {
        assert_eq!(cell_text(&Data::Float(150.0)), "150");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
