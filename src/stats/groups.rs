//! Per-group means and above/below-threshold comparisons.

use serde::Serialize;
use std::collections::HashSet;

use super::frequency::{Order, value_counts};
use super::utility::{mean, pct};

/// Mean of a metric inside one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub group: String,
    pub count: usize,
    pub mean: f64,
}

/// How many values lie strictly above a threshold and how many at or below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdSplit {
    pub threshold: f64,
    pub above: usize,
    pub below_or_equal: usize,
}

impl ThresholdSplit {
    pub fn total(&self) -> usize {
        self.above + self.below_or_equal
    }

    pub fn above_pct(&self) -> f64 {
        pct(self.above, self.total())
    }

    pub fn below_pct(&self) -> f64 {
        pct(self.below_or_equal, self.total())
    }
}

/// Threshold split of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSplit {
    pub group: String,
    pub split: ThresholdSplit,
}

/// Counts present values above (`>`) and at-or-below (`<=`) `threshold`.
pub fn threshold_split(values: &[Option<f64>], threshold: f64) -> ThresholdSplit {
    let mut split = ThresholdSplit {
        threshold,
        above: 0,
        below_or_equal: 0,
    };
    for v in values.iter().flatten() {
        if *v > threshold {
            split.above += 1;
        } else {
            split.below_or_equal += 1;
        }
    }
    split
}

/// Pairs of (group key, value) where both are present.
fn present_pairs<'a>(
    keys: &'a [Option<String>],
    values: &'a [Option<f64>],
) -> impl Iterator<Item = (&'a str, f64)> + 'a {
    keys.iter()
        .zip(values)
        .filter_map(|(k, v)| Some((k.as_deref()?, (*v)?)))
}

/// Group order: largest group first, ties by first appearance.
fn group_order(keys: &[Option<String>], values: &[Option<f64>]) -> Vec<String> {
    let present = present_pairs(keys, values).map(|(k, _)| Some(k));
    value_counts("group", present, Order::Descending).keys()
}

/// Per-group count and mean of `values`, largest group first.
pub fn group_means(keys: &[Option<String>], values: &[Option<f64>]) -> Vec<GroupMean> {
    group_order(keys, values)
        .into_iter()
        .map(|group| {
            let members: Vec<f64> = present_pairs(keys, values)
                .filter(|(k, _)| *k == group)
                .map(|(_, v)| v)
                .collect();
            GroupMean {
                count: members.len(),
                mean: mean(&members),
                group,
            }
        })
        .collect()
}

/// Per-group threshold split against one global threshold.
pub fn group_threshold_split(
    keys: &[Option<String>],
    values: &[Option<f64>],
    threshold: f64,
) -> Vec<GroupSplit> {
    group_order(keys, values)
        .into_iter()
        .map(|group| {
            let members: Vec<Option<f64>> = present_pairs(keys, values)
                .filter(|(k, _)| *k == group)
                .map(|(_, v)| Some(v))
                .collect();
            GroupSplit {
                split: threshold_split(&members, threshold),
                group,
            }
        })
        .collect()
}

/// The `k` most frequent present keys.
pub fn top_values(keys: &[Option<String>], k: usize) -> Vec<String> {
    value_counts("group", keys.iter().map(Option::as_deref), Order::Descending)
        .top(k)
        .keys()
}

/// Row mask selecting rows whose key is not in `excluded`.
///
/// Rows with a missing key are kept.
pub fn exclusion_mask(keys: &[Option<String>], excluded: &[String]) -> Vec<bool> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    keys.iter()
        .map(|k| k.as_deref().is_none_or(|k| !excluded.contains(k)))
        .collect()
}
