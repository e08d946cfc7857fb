//! Classical significance tests: two-sample t, one-way ANOVA and chi-square
//! independence. No correction for multiple comparisons is applied.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

use super::utility::{mean, sum_of_squares};

/// Outcome of one test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestOutcome {
    pub statistic: f64,
    /// Degrees of freedom; the second is only used by F tests.
    pub df: (f64, Option<f64>),
    pub p_value: f64,
}

/// Student's t-test for equal means of two independent samples, pooled
/// variance, two-sided.
///
/// `None` when either sample has fewer than two values or both have zero
/// variance.
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a), mean(b));
    let df = na + nb - 2.0;
    let pooled = (sum_of_squares(a, ma) + sum_of_squares(b, mb)) / df;
    let se = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 || !se.is_finite() {
        return None;
    }

    let t = (ma - mb) / se;
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = (2.0 * dist.sf(t.abs())).min(1.0);

    Some(TestOutcome {
        statistic: t,
        df: (df, None),
        p_value,
    })
}

/// One-way ANOVA F test across groups; empty groups are ignored.
///
/// `None` with fewer than two non-empty groups, no residual degrees of
/// freedom, or zero within-group variance.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<TestOutcome> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if k < 2 || n <= k {
        return None;
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand = mean(&all);

    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand).powi(2))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_of_squares(g, mean(g))).sum();

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    if ss_within == 0.0 {
        return None;
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).ok()?;

    Some(TestOutcome {
        statistic: f,
        df: (df_between, Some(df_within)),
        p_value: dist.sf(f),
    })
}

/// Pearson chi-square test of independence on a contingency table of counts,
/// without continuity correction.
///
/// Rows and columns with zero totals are dropped first. `None` when fewer
/// than two rows or columns remain.
pub fn chi_square_independence(table: &[Vec<usize>]) -> Option<TestOutcome> {
    let width = table.first().map(Vec::len).unwrap_or(0);
    let col_totals: Vec<usize> = (0..width)
        .map(|j| table.iter().map(|r| r.get(j).copied().unwrap_or(0)).sum())
        .collect();
    let keep_cols: Vec<usize> = (0..width).filter(|j| col_totals[*j] > 0).collect();

    let rows: Vec<Vec<f64>> = table
        .iter()
        .filter(|r| r.iter().sum::<usize>() > 0)
        .map(|r| keep_cols.iter().map(|j| r[*j] as f64).collect())
        .collect();

    if rows.len() < 2 || keep_cols.len() < 2 {
        return None;
    }

    let row_totals: Vec<f64> = rows.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..keep_cols.len())
        .map(|j| rows.iter().map(|r| r[j]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();

    let mut statistic = 0.0;
    for (i, row) in rows.iter().enumerate() {
        for (j, observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    let df = ((rows.len() - 1) * (keep_cols.len() - 1)) as f64;
    let dist = ChiSquared::new(df).ok()?;

    Some(TestOutcome {
        statistic,
        df: (df, None),
        p_value: dist.sf(statistic),
    })
}
