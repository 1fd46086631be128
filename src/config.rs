//! Engine configuration.
//!
//! All tunables that the source system kept as scattered globals are
//! collected here as one explicit object validated up front.

use crate::error::{EngineError, Result};

/// Fallback used for lag features at the start of the series, where the
/// lagged day does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagFallback {
    /// Substitute the mean of the full historical target series.
    HistoricalMean,
    /// Substitute the earliest observed value.
    EarliestValue,
}

/// Configuration for the forecasting and analytics engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Weekday indices treated as weekend (0 = Monday .. 6 = Sunday).
    pub weekend_weekdays: Vec<u32>,
    /// Forecast horizon in days.
    pub horizon: usize,
    /// Confidence level for prediction intervals (e.g. 0.95).
    pub confidence_level: f64,
    /// Z-score threshold for anomaly detection.
    pub anomaly_threshold: f64,
    /// Lag offsets (in days) used as features.
    pub lag_offsets: Vec<usize>,
    /// Rolling-mean window lengths (in days) used as features.
    pub rolling_windows: Vec<usize>,
    /// Span (in days) of the percent-change trend feature.
    pub trend_span: usize,
    /// Fallback for lag features with no observed lagged day.
    pub lag_fallback: LagFallback,
    /// Number of chronological cross-validation folds.
    pub cv_folds: usize,
    /// Minimum number of records required for training.
    pub min_training_days: usize,
    /// Maximum AR order considered in the autoregressive order search.
    pub max_ar_order: usize,
    /// Maximum MA order considered in the autoregressive order search.
    pub max_ma_order: usize,
    /// Iteration budget for each numerical fit inside the order search.
    pub max_fit_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weekend_weekdays: vec![5, 6],
            horizon: 7,
            confidence_level: 0.95,
            anomaly_threshold: 2.0,
            lag_offsets: vec![1, 2, 3],
            rolling_windows: vec![3, 7],
            trend_span: 3,
            lag_fallback: LagFallback::HistoricalMean,
            cv_folds: 5,
            min_training_days: 10,
            max_ar_order: 2,
            max_ma_order: 2,
            max_fit_iterations: 500,
        }
    }
}

impl EngineConfig {
    /// Set the weekend weekday indices (0 = Monday .. 6 = Sunday).
    pub fn with_weekend_weekdays(mut self, weekdays: Vec<u32>) -> Self {
        self.weekend_weekdays = weekdays;
        self
    }

    /// Set the forecast horizon.
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the confidence level for prediction intervals.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the anomaly detection threshold in standard-deviation units.
    pub fn with_anomaly_threshold(mut self, threshold: f64) -> Self {
        self.anomaly_threshold = threshold;
        self
    }

    /// Set the lag fallback policy.
    pub fn with_lag_fallback(mut self, fallback: LagFallback) -> Self {
        self.lag_fallback = fallback;
        self
    }

    /// Validate the configuration, returning a `Configuration` error on
    /// the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.weekend_weekdays.iter().any(|&d| d > 6) {
            return Err(EngineError::Configuration(
                "weekend weekday index out of range (0..=6)".into(),
            ));
        }
        if self.horizon == 0 {
            return Err(EngineError::Configuration("horizon must be positive".into()));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(EngineError::Configuration(
                "confidence level must be in (0, 1)".into(),
            ));
        }
        if self.anomaly_threshold <= 0.0 {
            return Err(EngineError::Configuration(
                "anomaly threshold must be positive".into(),
            ));
        }
        if self.lag_offsets.is_empty() || self.lag_offsets.contains(&0) {
            return Err(EngineError::Configuration(
                "lag offsets must be non-empty and positive".into(),
            ));
        }
        if self.rolling_windows.is_empty() || self.rolling_windows.contains(&0) {
            return Err(EngineError::Configuration(
                "rolling windows must be non-empty and positive".into(),
            ));
        }
        if self.trend_span == 0 {
            return Err(EngineError::Configuration(
                "trend span must be positive".into(),
            ));
        }
        if self.cv_folds == 0 {
            return Err(EngineError::Configuration(
                "cross-validation needs at least one fold".into(),
            ));
        }
        if self.max_fit_iterations == 0 {
            return Err(EngineError::Configuration(
                "fit iteration budget must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 7);
        assert_eq!(config.weekend_weekdays, vec![5, 6]);
        assert_eq!(config.lag_offsets, vec![1, 2, 3]);
        assert_eq!(config.rolling_windows, vec![3, 7]);
    }

    #[test]
    fn builders_override_fields() {
        let config = EngineConfig::default()
            .with_weekend_weekdays(vec![4, 5])
            .with_horizon(14)
            .with_confidence_level(0.90)
            .with_anomaly_threshold(3.0)
            .with_lag_fallback(LagFallback::EarliestValue);

        assert_eq!(config.weekend_weekdays, vec![4, 5]);
        assert_eq!(config.horizon, 14);
        assert_eq!(config.confidence_level, 0.90);
        assert_eq!(config.anomaly_threshold, 3.0);
        assert_eq!(config.lag_fallback, LagFallback::EarliestValue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad_weekend = EngineConfig::default().with_weekend_weekdays(vec![7]);
        assert!(matches!(
            bad_weekend.validate(),
            Err(EngineError::Configuration(_))
        ));

        let bad_horizon = EngineConfig::default().with_horizon(0);
        assert!(bad_horizon.validate().is_err());

        let bad_level = EngineConfig::default().with_confidence_level(1.0);
        assert!(bad_level.validate().is_err());

        let mut bad_lags = EngineConfig::default();
        bad_lags.lag_offsets = vec![];
        assert!(bad_lags.validate().is_err());

        let mut zero_window = EngineConfig::default();
        zero_window.rolling_windows = vec![3, 0];
        assert!(zero_window.validate().is_err());
    }
}
