//! Report pipeline: load, normalize, compute one variant's artifacts, then
//! write its tables, charts and combined text summary.
//!
//! Each variant builder only computes. Writing happens here in artifact
//! order, so a chart or table failure aborts the run with everything
//! before it already on disk.

pub mod crosstabs;
pub mod inference;
pub mod overview;
pub mod regions;

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::charts::{
    ChartText, PlotError, bar_chart, heatmap_chart, histogram_chart, pie_chart, stacked_bar_chart,
};
use crate::config::{PipelineConfig, Variant, columns};
use crate::dataset::{Dataset, DatasetError};
use crate::output::{TextSummary, write_table_csv};
use crate::parser::load_dataset;
use crate::preprocess::{NormalizePlan, normalize};
use crate::report::{AggregateReport, ReportEntry, ReportValue};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics error in {report}: {reason}")]
    Statistics { report: String, reason: String },

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

pub type Result<T> = core::result::Result<T, PipelineError>;

/// How an artifact is drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Pie,
    Bar,
    StackedBar,
    Histogram { values: Vec<f64>, bins: usize },
    Heatmap,
}

#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub file: String,
    pub text: ChartText,
}

/// One report with its optional chart, CSV table and text override.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub entry: ReportEntry,
    /// Replaces the rendered value in the text summary.
    pub text: Option<String>,
    pub chart: Option<ChartRequest>,
    pub table_file: Option<String>,
}

impl Artifact {
    pub fn new(entry: ReportEntry) -> Self {
        Self {
            entry,
            text: None,
            chart: None,
            table_file: None,
        }
    }

    pub fn chart(mut self, kind: ChartKind, file: &str, text: ChartText) -> Self {
        self.chart = Some(ChartRequest {
            kind,
            file: file.to_string(),
            text,
        });
        self
    }

    /// Writes the value's table as `<key>.csv`.
    pub fn table(mut self) -> Self {
        self.table_file = Some(format!("{}.csv", self.entry.key));
        self
    }

    pub fn text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    /// Section for the combined text file.
    pub fn section(&self) -> String {
        match &self.text {
            Some(text) => format!("{}:\n{}", self.entry.title, text),
            None => self.entry.render_text(),
        }
    }
}

/// Normalization every variant applies before computing.
pub fn normalize_plan(config: &PipelineConfig) -> NormalizePlan {
    let mut numeric_columns = config.numeric_columns.clone();
    let extra = extra_numeric(config.variant);
    for column in config.correlation_columns.iter().chain(&extra) {
        if !numeric_columns.contains(column) {
            numeric_columns.push(column.clone());
        }
    }

    NormalizePlan {
        date_column: Some(columns::OFFENCE_DATE.to_string()),
        time_column: Some(columns::OFFENCE_TIME.to_string()),
        numeric_columns,
        drop_missing_in: config.drop_column(),
    }
}

fn extra_numeric(variant: Variant) -> Vec<String> {
    let extra: &[&str] = match variant {
        Variant::Crosstabs => &[columns::AUTO_YEAR],
        _ => &[],
    };
    extra.iter().map(|c| c.to_string()).collect()
}

/// Computes the variant's artifacts from an already normalized dataset.
pub fn compute(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<Artifact>> {
    match config.variant {
        Variant::Overview => overview::build(dataset, config, false),
        Variant::Summary => overview::build(dataset, config, true),
        Variant::Regions => regions::build(dataset, config),
        Variant::Crosstabs => crosstabs::build(dataset, config),
        Variant::Inference => inference::build(dataset, config),
    }
}

/// Runs one variant end to end.
#[tracing::instrument(skip_all, fields(variant = %config.variant, input = %config.input.display()))]
pub fn run(config: &PipelineConfig) -> Result<AggregateReport> {
    let mut dataset = load_dataset(&config.input)?;
    info!(rows = dataset.len(), columns = dataset.column_names().len(), "Dataset loaded");

    normalize(&mut dataset, &normalize_plan(config))?;

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)?;

    let artifacts = compute(&dataset, config)?;
    write_artifacts(&artifacts, config, &output_dir)
}

/// Writes tables, charts and the text summary in artifact order.
pub fn write_artifacts(
    artifacts: &[Artifact],
    config: &PipelineConfig,
    output_dir: &Path,
) -> Result<AggregateReport> {
    let mut report = AggregateReport::new(&config.variant.to_string());
    let mut text = TextSummary::default();

    for artifact in artifacts {
        if let Some(file) = &artifact.table_file
            && let Some((header, rows)) = artifact.entry.value.to_table()
        {
            write_table_csv(&output_dir.join(file), &header, &rows)?;
        }

        if config.render_charts
            && let Some(chart) = &artifact.chart
        {
            if has_chart_data(&chart.kind, &artifact.entry.value) {
                render_chart(chart, &artifact.entry.value, &output_dir.join(&chart.file))?;
                debug!(file = %chart.file, "Chart rendered");
            } else {
                warn!(file = %chart.file, key = %artifact.entry.key, "No data to chart, skipped");
            }
        }

        text.push(artifact.section());
        report.push(artifact.entry.clone());
    }

    text.write(&output_dir.join(config.variant.text_file()))?;
    info!(
        reports = report.entries.len(),
        output_dir = %output_dir.display(),
        "Reports written"
    );

    Ok(report)
}

/// Whether `value` holds anything `kind` can draw.
pub fn has_chart_data(kind: &ChartKind, value: &ReportValue) -> bool {
    match (kind, value) {
        (ChartKind::Histogram { values, .. }, _) => values.iter().any(|v| v.is_finite()),
        (_, ReportValue::Frequency(table)) => table.total() > 0,
        (_, ReportValue::Split { split, .. }) => split.total() > 0,
        (_, ReportValue::GroupMeans { groups, .. }) => !groups.is_empty(),
        (_, ReportValue::GroupSplits { groups, .. }) => !groups.is_empty(),
        (_, ReportValue::Correlation(m)) => !m.columns.is_empty(),
        (_, ReportValue::CrossTab(ct)) => !ct.rows.is_empty() && !ct.cols.is_empty(),
        (_, ReportValue::Grid(grid)) => !grid.rows.is_empty() && !grid.cols.is_empty(),
        _ => true,
    }
}

/// Labelled slice values for a pie drawn from `value`.
pub fn pie_values(value: &ReportValue) -> Option<Vec<(String, f64)>> {
    match value {
        ReportValue::Frequency(table) => Some(
            table
                .entries
                .iter()
                .map(|(k, c)| (k.clone(), *c as f64))
                .collect(),
        ),
        ReportValue::Split { split, .. } => Some(vec![
            ("Above mean".to_string(), split.above as f64),
            ("At or below mean".to_string(), split.below_or_equal as f64),
        ]),
        _ => None,
    }
}

fn mismatch(request: &ChartRequest) -> PlotError {
    PlotError::InvalidData(format!("{} cannot be drawn from this report", request.file))
}

/// Draws `value` the way `request` asks.
pub fn render_chart(
    request: &ChartRequest,
    value: &ReportValue,
    path: &Path,
) -> core::result::Result<(), PlotError> {
    match (&request.kind, value) {
        (ChartKind::Pie, _) => match pie_values(value) {
            Some(slices) => pie_chart(&slices, &request.text.title, path),
            None => Err(mismatch(request)),
        },
        (ChartKind::Bar, ReportValue::Frequency(table)) => {
            bar_chart(&table.keys(), &table.counts(), &request.text, path)
        }
        (ChartKind::Bar, ReportValue::GroupMeans { groups, .. }) => {
            let labels: Vec<String> = groups.iter().map(|g| g.group.clone()).collect();
            let means: Vec<f64> = groups.iter().map(|g| g.mean).collect();
            bar_chart(&labels, &means, &request.text, path)
        }
        (ChartKind::StackedBar, ReportValue::GroupSplits { groups, .. }) => {
            let labels: Vec<String> = groups.iter().map(|g| g.group.clone()).collect();
            let below: Vec<f64> = groups.iter().map(|g| g.split.below_or_equal as f64).collect();
            let above: Vec<f64> = groups.iter().map(|g| g.split.above as f64).collect();
            stacked_bar_chart(
                &labels,
                &[("At or below mean", below.as_slice()), ("Above mean", above.as_slice())],
                &request.text,
                path,
            )
        }
        (ChartKind::Histogram { values, bins }, _) => {
            histogram_chart(values, *bins, &request.text, path)
        }
        (ChartKind::Heatmap, ReportValue::Correlation(m)) => heatmap_chart(
            &m.columns,
            &m.columns,
            &m.values,
            2,
            Some((-1.0, 1.0)),
            &request.text,
            path,
        ),
        (ChartKind::Heatmap, ReportValue::CrossTab(ct)) => heatmap_chart(
            &ct.rows,
            &ct.cols,
            &ct.proportions,
            2,
            Some((0.0, 1.0)),
            &request.text,
            path,
        ),
        (ChartKind::Heatmap, ReportValue::Grid(grid)) => {
            heatmap_chart(&grid.rows, &grid.cols, &grid.as_f64(), 0, None, &request.text, path)
        }
        _ => Err(mismatch(request)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::pie_slices;
    use crate::parser::parse_csv;
    use crate::stats::frequency::{Order, value_counts};
    use crate::stats::groups::ThresholdSplit;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sample_violations.csv");

    /// Header plus `genders.len()` copies of the fixture's first row, one gender each.
    fn gender_csv(genders: &[&str]) -> String {
        let fixture = fs::read_to_string(FIXTURE).unwrap();
        let mut lines = fixture.lines();
        let header = lines.next().unwrap();
        let template: Vec<&str> = lines.next().unwrap().split(',').collect();
        let gender_idx = header.split(',').position(|h| h == columns::GENDER).unwrap();

        let mut csv = format!("{}\n", header);
        for gender in genders {
            let mut row = template.clone();
            row[gender_idx] = *gender;
            csv.push_str(&row.join(","));
            csv.push('\n');
        }
        csv
    }

    #[test]
    fn test_plan_merges_numeric_columns() {
        let mut config = PipelineConfig::for_variant(Variant::Crosstabs);
        config.correlation_columns.push("extra".to_string());
        let plan = normalize_plan(&config);

        assert!(plan.numeric_columns.contains(&"extra".to_string()));
        assert!(plan.numeric_columns.contains(&columns::AUTO_YEAR.to_string()));
        let ages = plan
            .numeric_columns
            .iter()
            .filter(|c| *c == columns::AGE)
            .count();
        assert_eq!(ages, 1);
        assert_eq!(plan.drop_missing_in.as_deref(), Some(columns::ENGINE_POWER));
    }

    #[test]
    fn test_plan_for_overview() {
        let config = PipelineConfig::for_variant(Variant::Overview);
        let plan = normalize_plan(&config);

        assert_eq!(plan.numeric_columns, config.numeric_columns);
        assert!(!plan.numeric_columns.contains(&columns::AUTO_YEAR.to_string()));
        assert_eq!(plan.date_column.as_deref(), Some(columns::OFFENCE_DATE));
        assert_eq!(plan.time_column.as_deref(), Some(columns::OFFENCE_TIME));
    }

    #[test]
    fn test_plan_keeps_invalid_power_when_asked() {
        let mut config = PipelineConfig::for_variant(Variant::Overview);
        config.drop_invalid_engine_power = false;
        assert!(normalize_plan(&config).drop_missing_in.is_none());
    }

    #[test]
    fn test_artifact_section_prefers_override() {
        let entry = ReportEntry::new(
            "offence_heatmap",
            "Violations by day and hour",
            ReportValue::Note { text: "grid".into() },
        );
        let plain = Artifact::new(entry.clone());
        assert_eq!(plain.section(), "Violations by day and hour:\ngrid");

        let terse = Artifact::new(entry).text("See the chart.".into());
        assert_eq!(terse.section(), "Violations by day and hour:\nSee the chart.");
    }

    #[test]
    fn test_render_rejects_mismatched_kind() {
        let request = ChartRequest {
            kind: ChartKind::Heatmap,
            file: "x.png".into(),
            text: ChartText::titled("x"),
        };
        let value = ReportValue::Frequency(value_counts("c", [Some("a")], Order::Descending));
        let path = std::env::temp_dir().join("violation_report_mismatch.png");

        assert!(matches!(
            render_chart(&request, &value, &path),
            Err(PlotError::InvalidData(_))
        ));
    }

    #[test]
    fn test_write_artifacts_without_charts() {
        let dir = std::env::temp_dir().join("violation_report_write_artifacts");
        fs::create_dir_all(&dir).unwrap();
        let mut config = PipelineConfig::for_variant(Variant::Summary);
        config.render_charts = false;

        let table = value_counts("gender_cd", [Some("M"), Some("F"), Some("M")], Order::Descending);
        let artifacts = vec![
            Artifact::new(ReportEntry::new(
                "gender_distribution",
                "Gender",
                ReportValue::Frequency(table),
            ))
            .chart(ChartKind::Pie, "gender_distribution.png", ChartText::titled("Gender"))
            .table(),
        ];

        let report = write_artifacts(&artifacts, &config, &dir).unwrap();
        assert_eq!(report.keys(), vec!["gender_distribution"]);
        assert_eq!(
            fs::read_to_string(dir.join("gender_distribution.csv")).unwrap(),
            "gender_cd,count\nM,2\nF,1\n"
        );
        assert!(!dir.join("gender_distribution.png").exists());
        let text = fs::read_to_string(dir.join("text_summary.txt")).unwrap();
        assert!(text.starts_with("Gender:\n"));
        assert!(text.ends_with("\n\n"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_artifacts_skips_empty_charts() {
        let dir = std::env::temp_dir().join("violation_report_empty_charts");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let mut config = PipelineConfig::for_variant(Variant::Regions);
        config.render_charts = true;

        let empty_split = ThresholdSplit {
            threshold: 175.0,
            above: 0,
            below_or_equal: 0,
        };
        let no_genders: Vec<Option<&str>> = Vec::new();
        let artifacts = vec![
            Artifact::new(ReportEntry::new(
                "above_below_mean_other_regions",
                "Engine power against the overall mean",
                ReportValue::Split {
                    subject: "Vehicles".into(),
                    split: empty_split,
                },
            ))
            .chart(ChartKind::Pie, "split.png", ChartText::titled("Split")),
            Artifact::new(ReportEntry::new(
                "gender_distribution",
                "Gender",
                ReportValue::Frequency(value_counts("gender_cd", no_genders, Order::Descending)),
            ))
            .chart(ChartKind::Pie, "gender.png", ChartText::titled("Gender"))
            .table(),
            Artifact::new(ReportEntry::new(
                "above_below_mean_by_region",
                "By region",
                ReportValue::GroupSplits {
                    metric: "engine_power".into(),
                    groups: Vec::new(),
                },
            ))
            .chart(ChartKind::StackedBar, "regions.png", ChartText::titled("By region")),
            Artifact::new(ReportEntry::new(
                "income_distribution",
                "Monthly income",
                ReportValue::Scalars {
                    values: vec![("Mean".into(), f64::NAN)],
                },
            ))
            .chart(
                ChartKind::Histogram {
                    values: Vec::new(),
                    bins: 20,
                },
                "income.png",
                ChartText::titled("Income"),
            )
            .table(),
        ];

        let report = write_artifacts(&artifacts, &config, &dir).unwrap();
        assert_eq!(report.entries.len(), 4);
        for png in ["split.png", "gender.png", "regions.png", "income.png"] {
            assert!(!dir.join(png).exists(), "{} should be skipped", png);
        }
        assert!(dir.join("gender_distribution.csv").exists());
        assert!(dir.join("income_distribution.csv").exists());
        assert!(dir.join("text_summary.txt").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_gender_pie_sixty_forty() {
        let mut genders = vec!["M"; 60];
        genders.extend(vec!["F"; 40]);
        let mut dataset = parse_csv(gender_csv(&genders).as_bytes()).unwrap();
        assert_eq!(dataset.len(), 100);

        let config = PipelineConfig::for_variant(Variant::Overview);
        normalize(&mut dataset, &normalize_plan(&config)).unwrap();
        let artifacts = compute(&dataset, &config).unwrap();

        let gender = artifacts
            .iter()
            .find(|a| a.entry.key == "gender_distribution")
            .unwrap();
        match &gender.entry.value {
            ReportValue::Frequency(table) => assert_eq!(
                table.entries,
                vec![("M".to_string(), 60), ("F".to_string(), 40)]
            ),
            other => panic!("unexpected gender report: {:?}", other),
        }

        let chart = gender.chart.as_ref().unwrap();
        assert_eq!(chart.kind, ChartKind::Pie);
        assert!(has_chart_data(&chart.kind, &gender.entry.value));

        let slices = pie_slices(&pie_values(&gender.entry.value).unwrap()).unwrap();
        assert_eq!(slices[0].label, "M");
        assert!((slices[0].percent - 60.0).abs() < 1e-9);
        assert_eq!(slices[1].label, "F");
        assert!((slices[1].percent - 40.0).abs() < 1e-9);
    }
}
