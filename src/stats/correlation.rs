//! Pairwise Pearson correlation over numeric columns.

use serde::Serialize;

use crate::dataset::{Dataset, Result};

/// Square correlation matrix; `values[i][j]` pairs `columns[i]` and `columns[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Pearson coefficient over rows where both values are present.
///
/// NaN when fewer than two complete pairs exist or either side has zero
/// variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }

    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Builds the symmetric matrix for the listed columns.
pub fn correlation_matrix(dataset: &Dataset, columns: &[String]) -> Result<CorrelationMatrix> {
    let data = columns
        .iter()
        .map(|c| dataset.numeric(c))
        .collect::<Result<Vec<_>>>()?;

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                // unit diagonal whenever the column has variance
                let own = pearson(data[i], data[i]);
                if own.is_nan() { f64::NAN } else { 1.0 }
            } else {
                pearson(data[i], data[j])
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn dataset() -> Dataset {
        let mut ds = Dataset::from_records(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![vec![String::new(); 4]; 5],
        );
        let a = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];
        let b = vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0), None];
        let c = vec![Some(5.0), Some(3.0), Some(4.0), Some(1.0), Some(2.0)];
        let d = vec![Some(7.0); 5];
        ds.replace_column("a", Column::Number(a)).unwrap();
        ds.replace_column("b", Column::Number(b)).unwrap();
        ds.replace_column("c", Column::Number(c)).unwrap();
        ds.replace_column("d", Column::Number(d)).unwrap();
        ds
    }

    #[test]
    fn test_pearson_perfect_linear() {
        let ds = dataset();
        let r = pearson(ds.numeric("a").unwrap(), ds.numeric("b").unwrap());
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let ds = dataset();
        let cols: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let m = correlation_matrix(&ds, &cols).unwrap();

        for i in 0..3 {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
        assert!((m.values[0][2] - -0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_is_nan() {
        let ds = dataset();
        let cols = vec!["a".to_string(), "d".to_string()];
        let m = correlation_matrix(&ds, &cols).unwrap();
        assert!(m.values[1][1].is_nan());
        assert!(m.values[0][1].is_nan());
        assert_eq!(m.values[0][0], 1.0);
    }
}
