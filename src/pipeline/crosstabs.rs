//! Row-normalized cross-tabulations and group means.

use crate::charts::ChartText;
use crate::config::{PipelineConfig, columns};
use crate::dataset::Dataset;
use crate::report::{ReportEntry, ReportValue};
use crate::stats::buckets::{POWER_LABELS, bucket_column, bucket_counts, label_rank, power_bucket};
use crate::stats::crosstab::crosstab;
use crate::stats::groups::{GroupMean, exclusion_mask, group_means, top_values};

use super::{Artifact, ChartKind, Result};

fn crosstab_artifact(
    dataset: &Dataset,
    row_column: &str,
    col_column: &str,
    row_k: usize,
    col_k: usize,
    title: &str,
) -> Result<Artifact> {
    let table = crosstab(
        row_column,
        &dataset.categorical(row_column)?,
        col_column,
        &dataset.categorical(col_column)?,
        row_k,
        col_k,
    );
    let key = format!("{}_{}_crosstab", row_column, col_column);

    Ok(Artifact::new(ReportEntry::new(&key, title, ReportValue::CrossTab(table)))
        .chart(
            ChartKind::Heatmap,
            &format!("{}.png", key),
            ChartText::new(title, col_column, row_column),
        )
        .table())
}

pub fn build(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<Artifact>> {
    let mut artifacts = vec![
        crosstab_artifact(
            dataset,
            columns::AUTO_MARK,
            columns::OFFENCE_TYPE,
            config.crosstab_row_k,
            config.crosstab_col_k,
            "Violation types by vehicle make",
        )?,
        crosstab_artifact(
            dataset,
            columns::EDUCATION,
            columns::OFFENCE_TYPE,
            config.crosstab_row_k,
            config.crosstab_col_k,
            "Violation types by education level",
        )?,
        crosstab_artifact(
            dataset,
            columns::HOLIDAY,
            columns::OFFENCE_TYPE,
            config.crosstab_row_k,
            config.crosstab_col_k,
            "Violation types on holidays and working days",
        )?,
    ];

    let classes: Vec<Option<&str>> =
        bucket_column(dataset.numeric(columns::ENGINE_POWER)?, power_bucket);
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "engine_power_class_distribution",
            "Engine power classes",
            ReportValue::Frequency(bucket_counts("engine_power_class", &classes, &POWER_LABELS)),
        ))
        .chart(
            ChartKind::Bar,
            "engine_power_class_distribution.png",
            ChartText::new("Engine power classes", "Engine power", "Count"),
        )
        .table(),
    );

    let class_keys: Vec<Option<String>> = classes.iter().map(|c| c.map(str::to_string)).collect();
    let mut age_by_class: Vec<GroupMean> =
        group_means(&class_keys, dataset.numeric(columns::AGE)?);
    age_by_class.sort_by_key(|g| label_rank(&g.group, &POWER_LABELS));
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "age_by_engine_power_class",
            "Mean driver age by engine power class",
            ReportValue::GroupMeans {
                metric: columns::AGE.to_string(),
                groups: age_by_class,
            },
        ))
        .chart(
            ChartKind::Bar,
            "age_by_engine_power_class.png",
            ChartText::new("Mean driver age by engine power class", "Engine power", "Age"),
        )
        .table(),
    );

    artifacts.push(
        Artifact::new(ReportEntry::new(
            "engine_power_by_gender",
            "Mean engine power by gender",
            ReportValue::GroupMeans {
                metric: columns::ENGINE_POWER.to_string(),
                groups: group_means(
                    &dataset.categorical(columns::GENDER)?,
                    dataset.numeric(columns::ENGINE_POWER)?,
                ),
            },
        ))
        .chart(
            ChartKind::Bar,
            "engine_power_by_gender.png",
            ChartText::new("Mean engine power by gender", "Gender", "Engine power"),
        )
        .table(),
    );

    // Restrict to the most frequent makes before averaging.
    let marks = dataset.categorical(columns::AUTO_MARK)?;
    let leading = top_values(&marks, config.top_marks);
    let outside = exclusion_mask(&marks, &leading);
    let inside: Vec<bool> = marks
        .iter()
        .zip(outside)
        .map(|(mark, out)| mark.is_some() && !out)
        .collect();
    let leading_rows = dataset.filtered(&inside);
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "auto_year_by_mark",
            "Mean manufacture year by vehicle make",
            ReportValue::GroupMeans {
                metric: columns::AUTO_YEAR.to_string(),
                groups: group_means(
                    &leading_rows.categorical(columns::AUTO_MARK)?,
                    leading_rows.numeric(columns::AUTO_YEAR)?,
                ),
            },
        ))
        .chart(
            ChartKind::Bar,
            "auto_year_by_mark.png",
            ChartText::new("Mean manufacture year by make", "Make", "Year"),
        )
        .table(),
    );

    Ok(artifacts)
}
