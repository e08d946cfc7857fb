//! Group comparisons with significance tests.
//!
//! Each test follows the group means or cross-tabulation it is computed
//! from. A test without enough data reports "insufficient data" rather
//! than failing the run.

use tracing::debug;

use crate::charts::ChartText;
use crate::config::{PipelineConfig, columns};
use crate::dataset::Dataset;
use crate::report::{ReportEntry, ReportValue};
use crate::stats::buckets::{AGE_LABELS, age_group, bucket_column, label_rank};
use crate::stats::crosstab::crosstab;
use crate::stats::groups::{GroupMean, group_means, top_values};
use crate::stats::hypothesis::{
    TestOutcome, chi_square_independence, one_way_anova, two_sample_t_test,
};

use super::{Artifact, ChartKind, Result};

/// Present values of `values` per group, in the order of `groups`.
fn samples(keys: &[Option<String>], values: &[Option<f64>], groups: &[String]) -> Vec<Vec<f64>> {
    groups
        .iter()
        .map(|group| {
            keys.iter()
                .zip(values)
                .filter(|(k, _)| k.as_deref() == Some(group.as_str()))
                .filter_map(|(_, v)| *v)
                .collect()
        })
        .collect()
}

fn test_artifact(key: &str, title: &str, name: String, outcome: Option<TestOutcome>) -> Artifact {
    Artifact::new(ReportEntry::new(key, title, ReportValue::Test { name, outcome }))
}

pub fn build(dataset: &Dataset, config: &PipelineConfig) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    let power = dataset.numeric(columns::ENGINE_POWER)?;

    let genders = dataset.categorical(columns::GENDER)?;
    let compared = top_values(&genders, 2);
    let by_gender: Vec<GroupMean> = group_means(&genders, power)
        .into_iter()
        .filter(|g| compared.contains(&g.group))
        .collect();
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "engine_power_by_gender",
            "Mean engine power by gender",
            ReportValue::GroupMeans {
                metric: columns::ENGINE_POWER.to_string(),
                groups: by_gender,
            },
        ))
        .chart(
            ChartKind::Bar,
            "engine_power_by_gender.png",
            ChartText::new("Mean engine power by gender", "Gender", "Engine power"),
        )
        .table(),
    );

    let gender_samples = samples(&genders, power, &compared);
    let t_test = match gender_samples.as_slice() {
        [a, b] => two_sample_t_test(a, b),
        _ => None,
    };
    debug!(groups = ?compared, computed = t_test.is_some(), "Two-sample t-test");
    artifacts.push(test_artifact(
        "t_test_engine_power_gender",
        "Engine power difference between genders",
        format!("Two-sample t-test ({})", compared.join(" vs ")),
        t_test,
    ));

    let age_keys: Vec<Option<String>> = bucket_column(dataset.numeric(columns::AGE)?, age_group)
        .into_iter()
        .map(|g| g.map(str::to_string))
        .collect();
    let mut by_age: Vec<GroupMean> = group_means(&age_keys, power);
    by_age.sort_by_key(|g| label_rank(&g.group, &AGE_LABELS));
    let age_groups: Vec<String> = by_age.iter().map(|g| g.group.clone()).collect();
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "engine_power_by_age_group",
            "Mean engine power by age group",
            ReportValue::GroupMeans {
                metric: columns::ENGINE_POWER.to_string(),
                groups: by_age,
            },
        ))
        .chart(
            ChartKind::Bar,
            "engine_power_by_age_group.png",
            ChartText::new("Mean engine power by age group", "Age group", "Engine power"),
        )
        .table(),
    );

    artifacts.push(test_artifact(
        "anova_engine_power_age_group",
        "Engine power difference between age groups",
        "One-way ANOVA".to_string(),
        one_way_anova(&samples(&age_keys, power, &age_groups)),
    ));

    let table = crosstab(
        columns::GENDER,
        &genders,
        columns::OFFENCE_TYPE,
        &dataset.categorical(columns::OFFENCE_TYPE)?,
        config.crosstab_row_k,
        config.crosstab_col_k,
    );
    let chi_square = chi_square_independence(&table.counts);
    artifacts.push(
        Artifact::new(ReportEntry::new(
            "gender_offence_crosstab",
            "Violation types by gender",
            ReportValue::CrossTab(table),
        ))
        .chart(
            ChartKind::Heatmap,
            "gender_offence_crosstab.png",
            ChartText::new("Violation types by gender", "Violation", "Gender"),
        )
        .table(),
    );
    artifacts.push(test_artifact(
        "chi_square_gender_offence",
        "Independence of gender and violation type",
        "Chi-square test of independence".to_string(),
        chi_square,
    ));

    Ok(artifacts)
}
