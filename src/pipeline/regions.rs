//! Engine power outside the most frequent regions.
//!
//! The leading regions by row count are excluded; the remaining rows are
//! split against the overall mean engine power rounded to two decimals.

use tracing::info;

use crate::charts::ChartText;
use crate::config::{PipelineConfig, columns};
use crate::dataset::Dataset;
use crate::report::{ReportEntry, ReportValue};
use crate::stats::correlation::correlation_matrix;
use crate::stats::describe::describe_columns;
use crate::stats::groups::{
    exclusion_mask, group_means, group_threshold_split, threshold_split, top_values,
};
use crate::stats::utility::{mean, round2};

use super::{Artifact, ChartKind, PipelineError, Result};

pub fn build(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "numerical_statistics",
            "Descriptive statistics of numeric columns",
            ReportValue::Summary(describe_columns(dataset, &config.numeric_columns)?),
        ))
        .table(),
    );

    let regions = dataset.categorical(columns::REGION)?;
    let excluded = top_values(&regions, config.excluded_top_regions);
    info!(excluded = ?excluded, "Excluding leading regions");
    artifacts.push(Artifact::new(ReportEntry::new(
        "excluded_regions",
        "Excluded regions",
        ReportValue::Note {
            text: excluded.join(", "),
        },
    )));

    let others = dataset.filtered(&exclusion_mask(&regions, &excluded));
    let other_power = others.numeric(columns::ENGINE_POWER)?;

    let threshold = round2(mean(&dataset.present_numbers(columns::ENGINE_POWER)?));
    if threshold.is_nan() {
        return Err(PipelineError::Statistics {
            report: "above_below_mean".to_string(),
            reason: "no engine power values".to_string(),
        });
    }

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "other_regions_mean_power",
            "Engine power outside the leading regions",
            ReportValue::Scalars {
                values: vec![
                    (
                        "Mean engine power (other regions)".to_string(),
                        round2(mean(&others.present_numbers(columns::ENGINE_POWER)?)),
                    ),
                    ("Mean engine power (all regions)".to_string(), threshold),
                ],
            },
        ))
        .table(),
    );

    let split = threshold_split(other_power, threshold);
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "above_below_mean_other_regions",
            "Vehicles above and below the mean engine power (other regions)",
            ReportValue::Split {
                subject: "Vehicles".to_string(),
                split,
            },
        ))
        .chart(
            ChartKind::Pie,
            "above_below_mean_pie_other_regions.png",
            ChartText::titled("Engine power against the mean (other regions)"),
        ),
    );

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "offences_above_below_mean",
            "Violations by vehicles above and below the mean engine power",
            ReportValue::Split {
                subject: "Violations".to_string(),
                split,
            },
        ))
        .chart(
            ChartKind::Pie,
            "offences_above_below_mean_pie.png",
            ChartText::titled("Violations by engine power against the mean"),
        ),
    );

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "other_regions_mean_age",
            "Driver age outside the leading regions",
            ReportValue::Scalars {
                values: vec![(
                    "Mean age (other regions)".to_string(),
                    round2(mean(&others.present_numbers(columns::AGE)?)),
                )],
            },
        ))
        .table(),
    );

    let other_regions = others.categorical(columns::REGION)?;
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "above_below_mean_by_region",
            "Vehicles above and below the mean engine power by region",
            ReportValue::GroupSplits {
                metric: columns::ENGINE_POWER.to_string(),
                groups: group_threshold_split(&other_regions, other_power, threshold),
            },
        ))
        .chart(
            ChartKind::StackedBar,
            "above_below_mean_by_region.png",
            ChartText::new("Engine power against the mean by region", "Region", "Vehicles"),
        )
        .table(),
    );

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "region_mean_engine_power",
            "Mean engine power by region",
            ReportValue::GroupMeans {
                metric: columns::ENGINE_POWER.to_string(),
                groups: group_means(&regions, dataset.numeric(columns::ENGINE_POWER)?),
            },
        ))
        .chart(
            ChartKind::Bar,
            "region_mean_engine_power.png",
            ChartText::new("Mean engine power by region", "Region", "Engine power"),
        )
        .table(),
    );

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "correlation_matrix_other_regions",
            "Correlation matrix outside the leading regions",
            ReportValue::Correlation(correlation_matrix(&others, &config.correlation_columns)?),
        ))
        .chart(
            ChartKind::Heatmap,
            "correlation_matrix_heatmap_other_regions.png",
            ChartText::titled("Correlation matrix (other regions)"),
        )
        .table(),
    );

    Ok(artifacts)
}
