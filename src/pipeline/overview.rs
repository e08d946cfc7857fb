//! Descriptive battery shared by the overview and summary variants.
//!
//! The summary variant runs the same reports with terser text and without
//! the vehicle equipment reports.

use chrono::Timelike;

use crate::charts::ChartText;
use crate::config::{PipelineConfig, columns};
use crate::dataset::Dataset;
use crate::report::{ReportEntry, ReportValue};
use crate::stats::buckets::{AGE_LABELS, age_group, bucket_column, bucket_counts};
use crate::stats::correlation::correlation_matrix;
use crate::stats::describe::{SummaryTable, describe, describe_columns};
use crate::stats::frequency::{FrequencyTable, Order, value_counts};
use crate::stats::heatmap::day_hour_grid;
use crate::stats::utility::{mean, median};

use super::{Artifact, ChartKind, Result};

const HEATMAP_NOTE: &str =
    "The heatmap shows how violations spread over the hours of each weekday.";

fn frequency(dataset: &Dataset, column: &str, order: Order) -> Result<FrequencyTable> {
    let values = dataset.categorical(column)?;
    Ok(value_counts(column, values.iter().map(Option::as_deref), order))
}

fn frequency_artifact(key: &str, title: &str, table: FrequencyTable) -> Artifact {
    Artifact::new(ReportEntry::new(key, title, ReportValue::Frequency(table))).table()
}

/// Builds the descriptive artifacts; `terse` selects the summary variant.
pub fn build(dataset: &Dataset, config: &PipelineConfig, terse: bool) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();

    let summary = describe_columns(dataset, &config.numeric_columns)?;
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "numerical_statistics",
            "Descriptive statistics of numeric columns",
            ReportValue::Summary(summary),
        ))
        .table(),
    );

    artifacts.push(
        frequency_artifact(
            "gender_distribution",
            "Gender distribution",
            frequency(dataset, columns::GENDER, Order::Descending)?,
        )
        .chart(
            ChartKind::Pie,
            "gender_distribution.png",
            ChartText::titled("Gender distribution"),
        ),
    );

    let ages = bucket_column(dataset.numeric(columns::AGE)?, age_group);
    artifacts.push(
        frequency_artifact(
            "age_group_distribution",
            "Age group distribution",
            bucket_counts("age_group", &ages, &AGE_LABELS),
        )
        .chart(
            ChartKind::Bar,
            "age_group_distribution.png",
            ChartText::new("Age group distribution", "Age group", "Count"),
        ),
    );

    artifacts.push(
        frequency_artifact(
            "body_type_distribution",
            "Body type distribution",
            frequency(dataset, columns::BODY_TYPE, Order::Descending)?,
        )
        .chart(
            ChartKind::Bar,
            "body_type_distribution.png",
            ChartText::new("Body type distribution", "Body type", "Count"),
        ),
    );

    artifacts.push(
        frequency_artifact(
            "day_of_week_distribution",
            "Violations by day of week",
            frequency(dataset, columns::DAY_OF_WEEK, Order::Natural)?,
        )
        .chart(
            ChartKind::Bar,
            "day_of_week_distribution.png",
            ChartText::new("Violations by day of week", "Day of week", "Count"),
        ),
    );

    let hours: Vec<Option<String>> = dataset
        .times(columns::OFFENCE_TIME)?
        .iter()
        .map(|t| t.map(|t| t.hour().to_string()))
        .collect();
    artifacts.push(
        frequency_artifact(
            "hour_distribution",
            "Violations by hour of day",
            value_counts("hour", hours.iter().map(Option::as_deref), Order::Natural),
        )
        .chart(
            ChartKind::Bar,
            "hour_distribution.png",
            ChartText::new("Violations by hour of day", "Hour", "Count"),
        ),
    );

    let grid = day_hour_grid(
        &dataset.categorical(columns::DAY_OF_WEEK)?,
        dataset.times(columns::OFFENCE_TIME)?,
        &dataset.categorical(columns::PARTY)?,
    );
    let mut heatmap = Artifact::new(ReportEntry::new(
        "offence_heatmap",
        "Violations by day of week and hour",
        ReportValue::Grid(grid),
    ))
    .chart(
        ChartKind::Heatmap,
        "offence_heatmap.png",
        ChartText::new("Violations by day of week and hour", "Hour", "Day of week"),
    )
    .table();
    if terse {
        heatmap = heatmap.text(HEATMAP_NOTE.to_string());
    }
    artifacts.push(heatmap);

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "correlation_matrix",
            "Correlation matrix of numeric columns",
            ReportValue::Correlation(correlation_matrix(dataset, &config.correlation_columns)?),
        ))
        .chart(
            ChartKind::Heatmap,
            "correlation_matrix.png",
            ChartText::titled("Correlation matrix"),
        )
        .table(),
    );

    let income = dataset.present_numbers(columns::INCOME)?;
    let income_value = if terse {
        ReportValue::Scalars {
            values: vec![
                ("Mean".to_string(), mean(&income)),
                ("Median".to_string(), median(&income)),
            ],
        }
    } else {
        ReportValue::Summary(SummaryTable {
            columns: vec![(columns::INCOME.to_string(), describe(&income))],
        })
    };
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "income_distribution",
            "Monthly income",
            income_value,
        ))
        .chart(
            ChartKind::Histogram {
                values: income,
                bins: config.histogram_bins,
            },
            "income_distribution.png",
            ChartText::new("Monthly income distribution", "Income", "Count"),
        )
        .table(),
    );

    artifacts.push(
        frequency_artifact(
            "marital_status_distribution",
            "Marital status distribution",
            frequency(dataset, columns::MARITAL_STATUS, Order::Descending)?,
        )
        .chart(
            ChartKind::Pie,
            "marital_status_distribution.png",
            ChartText::titled("Marital status distribution"),
        ),
    );

    let marks = frequency(dataset, columns::AUTO_MARK, Order::Descending)?.top(config.top_marks);
    let marks_title = format!("Top {} vehicle makes", config.top_marks);
    artifacts.push(
        frequency_artifact("top10_auto_marks", &marks_title, marks).chart(
            ChartKind::Bar,
            "top10_auto_marks.png",
            ChartText::new(&marks_title, "Make", "Count"),
        ),
    );

    artifacts.push(
        frequency_artifact(
            "children_count_distribution",
            "Number of children",
            frequency(dataset, columns::CHILDREN, Order::Natural)?,
        )
        .chart(
            ChartKind::Bar,
            "children_count_distribution.png",
            ChartText::new("Number of children", "Children", "Count"),
        ),
    );

    artifacts.push(
        frequency_artifact(
            "offence_type_distribution",
            "Violation types",
            frequency(dataset, columns::OFFENCE_TYPE, Order::Descending)?,
        )
        .chart(
            ChartKind::Bar,
            "offence_type_distribution.png",
            ChartText::new("Violation types", "Violation", "Count"),
        ),
    );

    if terse {
        return Ok(artifacts);
    }

    let power = dataset.present_numbers(columns::ENGINE_POWER)?;
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "engine_power_distribution",
            "Engine power",
            ReportValue::Summary(SummaryTable {
                columns: vec![(columns::ENGINE_POWER.to_string(), describe(&power))],
            }),
        ))
        .chart(
            ChartKind::Histogram {
                values: power,
                bins: config.histogram_bins,
            },
            "engine_power_distribution.png",
            ChartText::new("Engine power distribution", "Engine power", "Count"),
        )
        .table(),
    );

    artifacts.push(
        frequency_artifact(
            "gear_type_distribution",
            "Gear type distribution",
            frequency(dataset, columns::GEAR_TYPE, Order::Descending)?,
        )
        .chart(
            ChartKind::Pie,
            "gear_type_distribution.png",
            ChartText::titled("Gear type distribution"),
        ),
    );

    artifacts.push(
        frequency_artifact(
            "color_distribution",
            "Vehicle colour distribution",
            frequency(dataset, columns::COLOR, Order::Descending)?,
        )
        .chart(
            ChartKind::Bar,
            "color_distribution.png",
            ChartText::new("Vehicle colour distribution", "Colour", "Count"),
        ),
    );

    Ok(artifacts)
}
