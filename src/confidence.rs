//! Confidence intervals for forecast points.

use crate::core::SalesForecast;
use crate::utils::stats;

/// Decorates point predictions with symmetric interval bounds.
///
/// margin = z(confidence) x dispersion, with the lower bound clamped
/// at zero. Zero dispersion collapses the interval to the point
/// prediction.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceEstimator {
    level: f64,
}

impl ConfidenceEstimator {
    /// Create an estimator for a confidence level in (0, 1).
    pub fn new(level: f64) -> Self {
        Self { level }
    }

    /// The configured confidence level.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Two-sided z multiplier for the configured level
    /// (1.96 at 95%, 1.645 at 90%).
    pub fn z_score(&self) -> f64 {
        stats::normal_quantile((1.0 + self.level) / 2.0)
    }

    /// Resolve the dispersion for a prediction set: a validation
    /// residual standard deviation when available, otherwise the
    /// standard deviation of the predictions themselves, or 15% of the
    /// mean prediction when only one exists.
    pub fn resolve_dispersion(&self, predictions: &[f64], residual_std: Option<f64>) -> f64 {
        if let Some(std) = residual_std {
            return std;
        }
        if predictions.len() > 1 {
            stats::sample_std(predictions)
        } else if predictions.len() == 1 {
            predictions[0] * 0.15
        } else {
            0.0
        }
    }

    /// Apply interval bounds to every point of a forecast.
    pub fn apply(&self, forecast: &mut SalesForecast, residual_std: Option<f64>) {
        let dispersion = self.resolve_dispersion(&forecast.predictions(), residual_std);
        let margin = self.z_score() * dispersion;
        for point in forecast.points_mut() {
            point.lower_bound = (point.predicted_sales - margin).max(0.0);
            point.upper_bound = point.predicted_sales + margin;
        }
    }
}
