//! Statistical helpers shared across the engine.

use statrs::distribution::{ContinuousCDF, Normal};

/// Mean of a slice. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (n denominator).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than
/// two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Quantile of the standard normal distribution.
///
/// `normal_quantile(0.975)` is the familiar 1.96 used for 95% intervals.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    let normal = Normal::new(0.0, 1.0).unwrap();
    normal.inverse_cdf(p)
}
