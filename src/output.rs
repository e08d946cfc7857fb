//! Output formatting and persistence for aggregate reports.
//!
//! Supports pretty-printing, JSON logging, CSV tables and the combined text
//! summary. Every writer overwrites its target.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::report::AggregateReport;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &AggregateReport) {
    debug!("{:#?}", report);
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(report: &AggregateReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes a header row and data rows to a CSV file.
pub fn write_table_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");

    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Serializes records as CSV rows, with a header derived from the type.
pub fn write_records_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = records.len(), "Writing CSV records");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Text sections collected in run order and written as one file.
#[derive(Debug, Default)]
pub struct TextSummary {
    sections: Vec<String>,
}

impl TextSummary {
    pub fn push(&mut self, section: String) {
        self.sections.push(section);
    }

    /// Writes each section followed by a blank line.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        for section in &self.sections {
            write!(file, "{}\n\n", section)?;
        }
        file.flush()?;

        info!(path = %path.display(), sections = self.sections.len(), "Text summary written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportEntry, ReportValue};
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[derive(Serialize)]
    struct Row {
        group: String,
        count: usize,
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&AggregateReport::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let mut report = AggregateReport::new("overview");
        report.push(ReportEntry::new(
            "mean",
            "Mean",
            ReportValue::Scalars {
                values: vec![("mean".into(), f64::NAN)],
            },
        ));
        print_json(&report).unwrap();
    }

    #[test]
    fn test_write_table_csv_overwrites() {
        let path = temp_path("violation_report_test_table.csv");
        let header = vec!["gender_cd".to_string(), "count".to_string()];

        write_table_csv(&path, &header, &[vec!["M".into(), "3".into()]]).unwrap();
        write_table_csv(&path, &header, &[vec!["F".into(), "1".into()]]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "gender_cd,count\nF,1\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_records_csv_has_header_once() {
        let path = temp_path("violation_report_test_records.csv");
        let rows = vec![
            Row {
                group: "a".into(),
                count: 1,
            },
            Row {
                group: "b".into(),
                count: 2,
            },
        ];
        write_records_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["group,count", "a,1", "b,2"]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_text_summary_separates_sections() {
        let path = temp_path("violation_report_test_summary.txt");
        let mut summary = TextSummary::default();
        summary.push("first".into());
        summary.push("second".into());
        summary.write(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n\nsecond\n\n");
        fs::remove_file(&path).unwrap();
    }
}
