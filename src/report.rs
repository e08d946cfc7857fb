//! The aggregate report: named values computed in one run.
//!
//! Values render to text tables for the combined summary file and to plain
//! header/row tables for standalone CSV output.

use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

use crate::stats::correlation::CorrelationMatrix;
use crate::stats::crosstab::CrossTab;
use crate::stats::describe::{SUMMARY_ROWS, SummaryTable};
use crate::stats::frequency::FrequencyTable;
use crate::stats::groups::{GroupMean, GroupSplit, ThresholdSplit};
use crate::stats::heatmap::CountGrid;
use crate::stats::hypothesis::TestOutcome;

/// Header plus rows, all cells already formatted.
pub type PlainTable = (Vec<String>, Vec<Vec<String>>);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportValue {
    Frequency(FrequencyTable),
    Summary(SummaryTable),
    Scalars {
        values: Vec<(String, f64)>,
    },
    Correlation(CorrelationMatrix),
    CrossTab(CrossTab),
    Grid(CountGrid),
    GroupMeans {
        metric: String,
        groups: Vec<GroupMean>,
    },
    Split {
        subject: String,
        split: ThresholdSplit,
    },
    GroupSplits {
        metric: String,
        groups: Vec<GroupSplit>,
    },
    Test {
        name: String,
        outcome: Option<TestOutcome>,
    },
    Note {
        text: String,
    },
}

/// One titled report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub key: String,
    pub title: String,
    pub value: ReportValue,
}

impl ReportEntry {
    pub fn new(key: &str, title: &str, value: ReportValue) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            value,
        }
    }

    /// Title line followed by the rendered value.
    pub fn render_text(&self) -> String {
        format!("{}:\n{}", self.title, self.value.render_text())
    }
}

/// Ordered mapping from report key to value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub variant: String,
    pub entries: Vec<ReportEntry>,
}

impl AggregateReport {
    pub fn new(variant: &str) -> Self {
        Self {
            variant: variant.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }
}

#[derive(Tabled)]
struct FrequencyRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Percentage")]
    percentage: String,
}

/// Fixed-precision float, `NaN` spelled out.
pub fn format_float(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.*}", decimals, value)
    }
}

fn build_table(header: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().to_string()
}

fn test_lines(name: &str, outcome: &Option<TestOutcome>) -> String {
    match outcome {
        None => format!("{}: insufficient data", name),
        Some(o) => {
            let df = match o.df.1 {
                Some(d2) => format!("{}, {}", o.df.0, d2),
                None => format!("{}", o.df.0),
            };
            format!(
                "{}\nstatistic: {}\ndf: {}\np-value: {}",
                name,
                format_float(o.statistic, 4),
                df,
                format_float(o.p_value, 6)
            )
        }
    }
}

impl ReportValue {
    /// Human-readable rendering for the text summary.
    pub fn render_text(&self) -> String {
        match self {
            ReportValue::Frequency(table) => {
                if table.is_empty() {
                    return "No data".to_string();
                }
                let rows: Vec<FrequencyRow> = table
                    .entries
                    .iter()
                    .zip(table.percentages())
                    .map(|((value, count), (_, share))| FrequencyRow {
                        value: value.clone(),
                        count: *count,
                        percentage: format!("{:.2}%", share),
                    })
                    .collect();
                Table::new(rows).to_string()
            }
            ReportValue::Scalars { values } => values
                .iter()
                .map(|(label, v)| format!("{}: {}", label, format_float(*v, 2)))
                .collect::<Vec<_>>()
                .join("\n"),
            ReportValue::Split { subject, split } => format!(
                "Threshold: {}\n{} above: {} ({:.2}%)\n{} at or below: {} ({:.2}%)",
                format_float(split.threshold, 2),
                subject,
                split.above,
                split.above_pct(),
                subject,
                split.below_or_equal,
                split.below_pct()
            ),
            ReportValue::Test { name, outcome } => test_lines(name, outcome),
            ReportValue::Note { text } => text.clone(),
            _ => match self.to_table() {
                Some((header, rows)) => build_table(header, rows),
                None => String::new(),
            },
        }
    }

    /// Tabular form for CSV output, where the value is a table.
    pub fn to_table(&self) -> Option<PlainTable> {
        match self {
            ReportValue::Frequency(table) => Some((
                vec![table.column.clone(), "count".to_string()],
                table
                    .entries
                    .iter()
                    .map(|(k, c)| vec![k.clone(), c.to_string()])
                    .collect(),
            )),
            ReportValue::Summary(table) => {
                let mut header = vec![String::new()];
                header.extend(table.columns.iter().map(|(name, _)| name.clone()));
                let rows = SUMMARY_ROWS
                    .iter()
                    .enumerate()
                    .map(|(i, label)| {
                        let mut row = vec![label.to_string()];
                        row.extend(
                            table
                                .columns
                                .iter()
                                .map(|(_, s)| format_float(s.values()[i], 6)),
                        );
                        row
                    })
                    .collect();
                Some((header, rows))
            }
            ReportValue::Correlation(m) => {
                let mut header = vec![String::new()];
                header.extend(m.columns.iter().cloned());
                let rows = m
                    .columns
                    .iter()
                    .zip(&m.values)
                    .map(|(name, values)| {
                        let mut row = vec![name.clone()];
                        row.extend(values.iter().map(|v| format_float(*v, 4)));
                        row
                    })
                    .collect();
                Some((header, rows))
            }
            ReportValue::CrossTab(ct) => {
                let mut header = vec![format!("{} / {}", ct.row_column, ct.col_column)];
                header.extend(ct.cols.iter().cloned());
                let rows = ct
                    .rows
                    .iter()
                    .zip(&ct.proportions)
                    .map(|(name, values)| {
                        let mut row = vec![name.clone()];
                        row.extend(values.iter().map(|v| format_float(*v, 4)));
                        row
                    })
                    .collect();
                Some((header, rows))
            }
            ReportValue::Grid(grid) => {
                let mut header = vec![String::new()];
                header.extend(grid.cols.iter().cloned());
                let rows = grid
                    .rows
                    .iter()
                    .zip(&grid.cells)
                    .map(|(name, cells)| {
                        let mut row = vec![name.clone()];
                        row.extend(cells.iter().map(|c| c.to_string()));
                        row
                    })
                    .collect();
                Some((header, rows))
            }
            ReportValue::GroupMeans { metric, groups } => Some((
                vec![
                    "group".to_string(),
                    "count".to_string(),
                    format!("mean_{}", metric),
                ],
                groups
                    .iter()
                    .map(|g| vec![g.group.clone(), g.count.to_string(), format_float(g.mean, 2)])
                    .collect(),
            )),
            ReportValue::GroupSplits { groups, .. } => Some((
                vec![
                    "group".to_string(),
                    "above".to_string(),
                    "below_or_equal".to_string(),
                ],
                groups
                    .iter()
                    .map(|g| {
                        vec![
                            g.group.clone(),
                            g.split.above.to_string(),
                            g.split.below_or_equal.to_string(),
                        ]
                    })
                    .collect(),
            )),
            ReportValue::Scalars { values } => Some((
                vec!["metric".to_string(), "value".to_string()],
                values
                    .iter()
                    .map(|(k, v)| vec![k.clone(), format_float(*v, 6)])
                    .collect(),
            )),
            ReportValue::Split { .. } | ReportValue::Test { .. } | ReportValue::Note { .. } => None,
        }
    }
}
