//! Histogram binning and Gaussian kernel density for continuous columns.

use serde::Serialize;

use super::utility::{mean, sample_stddev};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Equal-width bins between min and max; the last bin is closed on the right.
///
/// A constant sample gets bins spread over `value ± 0.5`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lo: lo + width * i as f64,
            hi: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}

/// Scott's rule bandwidth: `sd * n^(-1/5)`.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let sd = sample_stddev(values, mean(values));
    sd * (values.len() as f64).powf(-0.2)
}

/// Gaussian KDE sampled at `points` evenly spaced x positions across the
/// data range, scaled by `scale` (use `n * bin_width` to overlay counts).
///
/// Empty when there are fewer than two values or no spread.
pub fn kde_curve(values: &[f64], points: usize, scale: f64) -> Vec<(f64, f64)> {
    if values.len() < 2 || points < 2 {
        return Vec::new();
    }

    let h = scott_bandwidth(values);
    if h.is_nan() || h <= 0.0 {
        return Vec::new();
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let n = values.len() as f64;
    let norm = 1.0 / (n * h * (2.0 * std::f64::consts::PI).sqrt());
    let step = (hi - lo) / (points - 1) as f64;

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / h).powi(2)).exp())
                .sum::<f64>()
                * norm;
            (x, density * scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let bins = histogram(&values, 20);

        assert_eq!(bins.len(), 20);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 100);
        assert_eq!(bins[0].lo, 0.0);
        assert!((bins[19].hi - 99.0).abs() < 1e-9);
        // max lands in the closed last bin
        assert_eq!(bins[19].count, 5);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let bins = histogram(&[3.0, 3.0], 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert_eq!(bins[0].lo, 2.5);
    }

    #[test]
    fn test_kde_integrates_to_scale() {
        let values: Vec<f64> = (0..200).map(|v| (v % 40) as f64).collect();
        let curve = kde_curve(&values, 400, 1.0);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, y)| y * step).sum();
        // truncated at the data range, so slightly under one
        assert!(area > 0.8 && area < 1.01);
    }

    #[test]
    fn test_kde_degenerate() {
        assert!(kde_curve(&[1.0], 10, 1.0).is_empty());
        assert!(kde_curve(&[2.0, 2.0, 2.0], 10, 1.0).is_empty());
    }
}
