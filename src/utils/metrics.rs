//! Accuracy metrics for backend evaluation.

use crate::error::{EngineError, Result};

/// Accuracy metrics for a set of predictions.
#[derive(Debug, Clone)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error.
    pub mae: f64,
    /// Mean Absolute Percentage Error (None if any actual is zero).
    pub mape: Option<f64>,
}

/// Calculate MAE and MAPE between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(EngineError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(EngineError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let n = actual.len() as f64;

    let mae: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let mape = if actual.contains(&0.0) {
        None
    } else {
        let sum: f64 = actual
            .iter()
            .zip(predicted.iter())
            .map(|(a, p)| ((a - p) / a).abs())
            .sum();
        Some(100.0 * sum / n)
    };

    Ok(AccuracyMetrics { mae, mape })
}
