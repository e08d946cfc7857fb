//! Per-value counts of categorical columns.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// How the entries of a [`FrequencyTable`] are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Most frequent first; ties keep first-appearance order.
    Descending,
    /// By the value itself, for intrinsically ordered columns.
    Natural,
}

/// Counts per distinct value, in report order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, c)| *c as f64).collect()
    }

    /// The `k` most frequent entries, most frequent first.
    pub fn top(&self, k: usize) -> FrequencyTable {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(k);
        FrequencyTable {
            column: self.column.clone(),
            entries,
        }
    }

    /// Share of each entry in the table total, in percent.
    pub fn percentages(&self) -> Vec<(String, f64)> {
        let total = self.total();
        self.entries
            .iter()
            .map(|(k, c)| (k.clone(), super::utility::pct(*c, total)))
            .collect()
    }
}

/// Counts the non-missing values of a column.
pub fn value_counts<I, S>(column: &str, values: I, order: Order) -> FrequencyTable
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for value in values.into_iter().flatten() {
        let key = value.as_ref();
        match index.get(key) {
            Some(&i) => entries[i].1 += 1,
            None => {
                index.insert(key.to_string(), entries.len());
                entries.push((key.to_string(), 1));
            }
        }
    }

    match order {
        // stable sort keeps first appearance among equal counts
        Order::Descending => entries.sort_by(|a, b| b.1.cmp(&a.1)),
        Order::Natural => entries.sort_by(|a, b| natural_cmp(&a.0, &b.0)),
    }

    FrequencyTable {
        column: column.to_string(),
        entries,
    }
}

const WEEKDAYS: &[&[&str]] = &[
    &["monday", "mon", "понедельник", "пн"],
    &["tuesday", "tue", "вторник", "вт"],
    &["wednesday", "wed", "среда", "ср"],
    &["thursday", "thu", "четверг", "чт"],
    &["friday", "fri", "пятница", "пт"],
    &["saturday", "sat", "суббота", "сб"],
    &["sunday", "sun", "воскресенье", "вс"],
];

fn weekday_index(value: &str) -> Option<usize> {
    let lower = value.trim().to_lowercase();
    WEEKDAYS.iter().position(|names| names.contains(&lower.as_str()))
}

/// Leading number of a label such as `"18-24"` or `"75+"`.
fn leading_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return Some(n);
    }
    let end = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    if end == 0 {
        return None;
    }
    trimmed[..end].parse().ok()
}

/// Natural ordering of category labels: numeric (including range labels),
/// then weekday names, then lexical.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => return x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => {}
    }

    match (weekday_index(a), weekday_index(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_counts_descending() {
        let values = vec![Some("F"), Some("M"), Some("M"), None, Some("M")];
        let table = value_counts("gender_cd", values, Order::Descending);

        assert_eq!(table.entries, vec![("M".into(), 3), ("F".into(), 1)]);
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let values = vec![Some("b"), Some("a"), Some("c"), Some("a"), Some("b")];
        let table = value_counts("x", values, Order::Descending);
        assert_eq!(table.keys(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_natural_order_numeric_and_ranges() {
        let values = vec![Some("10"), Some("2"), Some("75+"), Some("18-24"), Some("2")];
        let table = value_counts("x", values, Order::Natural);
        assert_eq!(table.keys(), vec!["2", "10", "18-24", "75+"]);
    }

    #[test]
    fn test_natural_order_weekdays() {
        let values = vec![Some("Sunday"), Some("Monday"), Some("Wednesday")];
        let table = value_counts("day_of_week", values, Order::Natural);
        assert_eq!(table.keys(), vec!["Monday", "Wednesday", "Sunday"]);
    }

    #[test]
    fn test_total_matches_non_missing_rows() {
        let values: Vec<Option<String>> = (0..50)
            .map(|i| (i % 5 != 0).then(|| format!("v{}", i % 3)))
            .collect();
        let present = values.iter().flatten().count();
        let table = value_counts("x", values, Order::Descending);
        assert_eq!(table.total(), present);
    }

    #[test]
    fn test_top_k() {
        let values = vec![Some("a"), Some("b"), Some("b"), Some("c"), Some("c"), Some("c")];
        let table = value_counts("x", values, Order::Natural).top(2);
        assert_eq!(table.entries, vec![("c".into(), 3), ("b".into(), 2)]);
    }

    #[test]
    fn test_percentages() {
        let mut values = vec![Some("M"); 60];
        values.extend(vec![Some("F"); 40]);
        let table = value_counts("gender_cd", values, Order::Descending);
        assert_eq!(
            table.percentages(),
            vec![("M".to_string(), 60.0), ("F".to_string(), 40.0)]
        );
    }
}
