//! Run configuration: which report variant to produce, from which file,
//! into which directory, and the fixed analysis constants.

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "hakaton_nn_1month.xlsx";

/// Source column names.
pub mod columns {
    pub const OFFENCE_DATE: &str = "offencedate";
    pub const OFFENCE_TIME: &str = "offencetime";
    pub const GENDER: &str = "gender_cd";
    pub const AGE: &str = "age";
    pub const MARITAL_STATUS: &str = "marital_status_cd";
    pub const EDUCATION: &str = "education_level_cd";
    pub const INCOME: &str = "person_monthly_income_amt";
    pub const CHILDREN: &str = "children_cnt";
    pub const BODY_TYPE: &str = "body_type";
    pub const COLOR: &str = "color";
    pub const GEAR_TYPE: &str = "gear_type";
    pub const ENGINE_POWER: &str = "engine_power";
    pub const CAR_PRICE: &str = "car_price";
    pub const AUTO_MARK: &str = "auto_mark";
    pub const AUTO_YEAR: &str = "auto_year";
    pub const REGION: &str = "region";
    pub const DAY_OF_WEEK: &str = "day_of_week";
    pub const HOLIDAY: &str = "holiday_flg";
    pub const OFFENCE_TYPE: &str = "offenceshortstatement";
    pub const PARTY: &str = "party_rk";
}

/// The report battery to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Full descriptive battery with detailed text
    Overview,
    /// Same battery with terse text
    Summary,
    /// Engine power comparison outside the leading regions
    Regions,
    /// Row-normalized cross-tabulations and group means
    Crosstabs,
    /// Significance tests between groups
    Inference,
}

impl Variant {
    pub fn default_output_dir(self) -> &'static str {
        match self {
            Variant::Overview => "output_charts",
            Variant::Summary => "output_charts_two",
            Variant::Regions => "output_charts_excluding_top3_avg",
            Variant::Crosstabs => "output_charts_crosstabs",
            Variant::Inference => "output_charts_tests",
        }
    }

    pub fn text_file(self) -> &'static str {
        match self {
            Variant::Overview => "text_output.txt",
            _ => "text_summary.txt",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Overview => "overview",
            Variant::Summary => "summary",
            Variant::Regions => "regions",
            Variant::Crosstabs => "crosstabs",
            Variant::Inference => "inference",
        };
        f.write_str(name)
    }
}

/// Everything one run needs. Missing fields in a JSON file take the
/// defaults of [`PipelineConfig::for_variant`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub variant: Variant,
    pub input: PathBuf,
    /// Defaults to the variant's own directory when unset.
    pub output_dir: Option<PathBuf>,
    pub render_charts: bool,
    /// Drop rows whose engine power does not coerce to a number.
    pub drop_invalid_engine_power: bool,
    /// Columns coerced to numbers and described.
    pub numeric_columns: Vec<String>,
    /// Columns of the correlation matrix.
    pub correlation_columns: Vec<String>,
    pub histogram_bins: usize,
    pub top_marks: usize,
    pub excluded_top_regions: usize,
    pub crosstab_row_k: usize,
    pub crosstab_col_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Overview)
    }
}

impl PipelineConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let numeric = [
            columns::AGE,
            columns::ENGINE_POWER,
            columns::CAR_PRICE,
            columns::CHILDREN,
            columns::INCOME,
        ];

        Self {
            variant,
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: None,
            render_charts: true,
            drop_invalid_engine_power: true,
            numeric_columns: numeric.iter().map(|c| c.to_string()).collect(),
            correlation_columns: numeric.iter().map(|c| c.to_string()).collect(),
            histogram_bins: 20,
            top_marks: 10,
            excluded_top_regions: 3,
            crosstab_row_k: 10,
            crosstab_col_k: 5,
        }
    }

    /// Loads a config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.variant.default_output_dir()))
    }

    /// Name of the engine power column when the drop policy is on.
    pub fn drop_column(&self) -> Option<String> {
        self.drop_invalid_engine_power
            .then(|| columns::ENGINE_POWER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_variant_defaults() {
        let config = PipelineConfig::for_variant(Variant::Regions);
        assert_eq!(
            config.output_dir(),
            PathBuf::from("output_charts_excluding_top3_avg")
        );
        assert_eq!(config.excluded_top_regions, 3);
        assert!(config.drop_invalid_engine_power);
        assert_eq!(Variant::Overview.text_file(), "text_output.txt");
        assert_eq!(Variant::Inference.text_file(), "text_summary.txt");
    }

    #[test]
    fn test_load_partial_json_keeps_defaults() {
        let path = std::env::temp_dir().join("violation_report_config.json");
        fs::write(
            &path,
            r#"{ "variant": "crosstabs", "input": "data.csv", "crosstab_row_k": 7 }"#,
        )
        .unwrap();

        let config = PipelineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.variant, Variant::Crosstabs);
        assert_eq!(config.input, PathBuf::from("data.csv"));
        assert_eq!(config.crosstab_row_k, 7);
        assert_eq!(config.crosstab_col_k, 5);
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.output_dir(), PathBuf::from("output_charts_crosstabs"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_variant_display_matches_serde() {
        let json = serde_json::to_string(&Variant::Inference).unwrap();
        assert_eq!(json, format!("\"{}\"", Variant::Inference));
    }
}
