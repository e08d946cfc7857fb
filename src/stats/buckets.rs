//! Fixed interval bucketing of continuous values.
//!
//! Intervals are left-inclusive and right-exclusive; values outside the
//! outer edges fall into no bucket.

use super::frequency::FrequencyTable;

/// Age edges; `AGE_LABELS[i]` covers `[AGE_EDGES[i], AGE_EDGES[i + 1])`.
pub const AGE_EDGES: [f64; 8] = [18.0, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 85.0];
pub const AGE_LABELS: [&str; 7] = ["18-24", "25-34", "35-44", "45-54", "55-64", "65-74", "75+"];

pub const POWER_EDGES: [f64; 6] = [0.0, 100.0, 150.0, 200.0, 250.0, f64::INFINITY];
pub const POWER_LABELS: [&str; 5] = ["<100", "100-149", "150-199", "200-249", "250+"];

/// Index of the bucket holding `value`, if any.
pub fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    if value.is_nan() {
        return None;
    }
    edges
        .windows(2)
        .position(|w| value >= w[0] && value < w[1])
}

/// Label of the bucket holding `value`, if any.
pub fn bucket<'a>(value: f64, edges: &[f64], labels: &[&'a str]) -> Option<&'a str> {
    bucket_index(value, edges).and_then(|i| labels.get(i).copied())
}

/// Age group label: 24 is "18-24", 25 is "25-34", 17 and 85 have none.
pub fn age_group(age: f64) -> Option<&'static str> {
    bucket(age, &AGE_EDGES, &AGE_LABELS)
}

/// Engine power class in horsepower.
pub fn power_bucket(power: f64) -> Option<&'static str> {
    bucket(power, &POWER_EDGES, &POWER_LABELS)
}

/// Buckets a whole column, keeping missing and out-of-range values missing.
pub fn bucket_column(
    values: &[Option<f64>],
    classify: fn(f64) -> Option<&'static str>,
) -> Vec<Option<&'static str>> {
    values.iter().map(|v| v.and_then(classify)).collect()
}

/// Counts per bucket in label order, empty buckets included.
pub fn bucket_counts(column: &str, buckets: &[Option<&str>], labels: &[&str]) -> FrequencyTable {
    let entries = labels
        .iter()
        .map(|label| {
            let count = buckets.iter().filter(|b| **b == Some(*label)).count();
            (label.to_string(), count)
        })
        .collect();

    FrequencyTable {
        column: column.to_string(),
        entries,
    }
}

/// Position of `label` in `labels`, unknown labels last.
pub fn label_rank(label: &str, labels: &[&str]) -> usize {
    labels.iter().position(|l| *l == label).unwrap_or(labels.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(age_group(18.0), Some("18-24"));
        assert_eq!(age_group(24.0), Some("18-24"));
        assert_eq!(age_group(25.0), Some("25-34"));
        assert_eq!(age_group(74.9), Some("65-74"));
        assert_eq!(age_group(75.0), Some("75+"));
        assert_eq!(age_group(84.0), Some("75+"));
        assert_eq!(age_group(85.0), None);
        assert_eq!(age_group(17.0), None);
        assert_eq!(age_group(f64::NAN), None);
    }

    #[test]
    fn test_power_bucket() {
        assert_eq!(power_bucket(0.0), Some("<100"));
        assert_eq!(power_bucket(99.9), Some("<100"));
        assert_eq!(power_bucket(100.0), Some("100-149"));
        assert_eq!(power_bucket(249.0), Some("200-249"));
        assert_eq!(power_bucket(600.0), Some("250+"));
        assert_eq!(power_bucket(-1.0), None);
    }

    #[test]
    fn test_bucket_counts_in_label_order() {
        let ages = [Some(70.0), Some(20.0), Some(24.0), None, Some(90.0)];
        let groups = bucket_column(&ages, age_group);
        let table = bucket_counts("age_group", &groups, &AGE_LABELS);

        assert_eq!(table.keys(), AGE_LABELS.to_vec());
        assert_eq!(table.get("18-24"), Some(2));
        assert_eq!(table.get("65-74"), Some(1));
        assert_eq!(table.get("25-34"), Some(0));
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn test_label_rank() {
        assert_eq!(label_rank("<100", &POWER_LABELS), 0);
        assert_eq!(label_rank("250+", &POWER_LABELS), 4);
        assert_eq!(label_rank("other", &POWER_LABELS), 5);
    }

    #[test]
    fn test_bucket_column_keeps_missing() {
        let values = [Some(30.0), None, Some(90.0)];
        assert_eq!(
            bucket_column(&values, age_group),
            vec![Some("25-34"), None, None]
        );
    }
}
