//! Backend selection by chronological cross-validation.

use crate::error::{EngineError, Result};
use crate::models::{BackendId, BackendSpec, BoxedBackend};
use crate::utils::metrics::calculate_metrics;
use crate::utils::stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation summary for the selected backend. Immutable once
/// produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    /// The winning backend.
    pub backend_id: BackendId,
    /// Mean absolute error across folds.
    pub mae: f64,
    /// Mean absolute percentage error across folds (None if any fold
    /// contained zero actuals).
    pub mape: Option<f64>,
    /// Standard deviation of cross-fold residuals, for interval
    /// estimation.
    pub residual_std: f64,
    /// When validation ran.
    pub validated_at: DateTime<Utc>,
}

/// Outcome of model selection: the refit winner plus its report.
pub struct SelectionOutcome {
    /// Winning backend, refit on the full history.
    pub backend: BoxedBackend,
    /// Validation report for the winner.
    pub report: TrainingReport,
}

/// Runs expanding-window cross-validation over candidate backends and
/// picks the winner by mean absolute error.
pub struct ModelSelector {
    candidates: Vec<BackendSpec>,
    folds: usize,
    min_training_rows: usize,
}

impl ModelSelector {
    /// Create a selector over candidates in registration order. The
    /// order breaks MAE ties: earlier wins.
    pub fn new(candidates: Vec<BackendSpec>, folds: usize, min_training_rows: usize) -> Self {
        Self {
            candidates,
            folds,
            min_training_rows,
        }
    }

    /// Validate every candidate and refit the winner on all rows.
    ///
    /// Folds are strictly chronological: each fold's test block follows
    /// its training prefix, and rows are never shuffled, so no future
    /// information leaks into training.
    pub fn select(&self, x: &[Vec<f64>], y: &[f64]) -> Result<SelectionOutcome> {
        if self.candidates.is_empty() {
            return Err(EngineError::Configuration(
                "no candidate backends registered".into(),
            ));
        }
        let n = y.len();
        if x.len() != n {
            return Err(EngineError::DimensionMismatch {
                expected: n,
                got: x.len(),
            });
        }
        if n < self.min_training_rows {
            return Err(EngineError::InsufficientData {
                needed: self.min_training_rows,
                got: n,
            });
        }

        // Test-block sizing mirrors chronological k-fold splitting:
        // k equal blocks at the end of the series, each preceded by an
        // ever-growing training prefix.
        let fold_size = (n / (self.folds + 1)).max(1);
        let usable_folds = self.folds.min((n - 1) / fold_size).max(1);

        let mut best: Option<(usize, f64, Option<f64>, Vec<f64>)> = None;

        for (position, spec) in self.candidates.iter().enumerate() {
            match self.validate_candidate(spec, x, y, fold_size, usable_folds) {
                Ok((mae, mape, residuals)) => {
                    log::info!("candidate {}: cv mae {:.3}", spec.id, mae);
                    let better = best.as_ref().map(|(_, b, _, _)| mae < *b).unwrap_or(true);
                    if better {
                        best = Some((position, mae, mape, residuals));
                    }
                }
                Err(err) => {
                    log::warn!("candidate {} failed validation: {err}", spec.id);
                }
            }
        }

        let (position, mae, mape, residuals) = best.ok_or_else(|| {
            EngineError::Computation("every candidate backend failed validation".into())
        })?;
        let spec = &self.candidates[position];

        let mut backend = spec.create();
        backend.fit(x, y)?;

        let report = TrainingReport {
            backend_id: spec.id,
            mae,
            mape,
            residual_std: stats::sample_std(&residuals),
            validated_at: Utc::now(),
        };
        log::info!(
            "selected backend {} (mae {:.3}, mape {:?})",
            report.backend_id,
            report.mae,
            report.mape
        );

        Ok(SelectionOutcome { backend, report })
    }

    /// Expanding-window validation of one candidate. Returns the mean
    /// fold MAE, mean fold MAPE, and all cross-fold residuals.
    fn validate_candidate(
        &self,
        spec: &BackendSpec,
        x: &[Vec<f64>],
        y: &[f64],
        fold_size: usize,
        folds: usize,
    ) -> Result<(f64, Option<f64>, Vec<f64>)> {
        let n = y.len();
        let mut fold_maes = Vec::with_capacity(folds);
        let mut fold_mapes = Vec::with_capacity(folds);
        let mut residuals = Vec::new();

        for fold in 0..folds {
            let test_end = n - (folds - 1 - fold) * fold_size;
            let test_start = test_end - fold_size;
            if test_start == 0 {
                continue;
            }

            let mut backend = spec.create();
            backend.fit(&x[..test_start], &y[..test_start])?;

            let mut predicted = Vec::with_capacity(fold_size);
            for row in test_start..test_end {
                predicted.push(backend.predict(&x[row])?);
            }
            let actual = &y[test_start..test_end];

            let metrics = calculate_metrics(actual, &predicted)?;
            log::debug!(
                "candidate {} fold {}: mae {:.3}",
                spec.id,
                fold + 1,
                metrics.mae
            );
            fold_maes.push(metrics.mae);
            fold_mapes.push(metrics.mape);
            residuals.extend(actual.iter().zip(predicted.iter()).map(|(a, p)| a - p));
        }

        if fold_maes.is_empty() {
            return Err(EngineError::InsufficientData {
                needed: self.min_training_rows,
                got: n,
            });
        }

        let mae = stats::mean(&fold_maes);
        let mape = if fold_mapes.iter().all(|m| m.is_some()) {
            let values: Vec<f64> = fold_mapes.iter().filter_map(|m| *m).collect();
            Some(stats::mean(&values))
        } else {
            None
        };

        Ok((mae, mape, residuals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Backend, BackendParams};
    use approx::assert_relative_eq;

    /// Stub backend predicting a fixed value; its fixed error makes CV
    /// scores predictable.
    struct Fixed {
        id: BackendId,
        value: f64,
        fitted: bool,
    }

    impl Backend for Fixed {
        fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<()> {
            self.fitted = true;
            Ok(())
        }
        fn predict(&self, _features: &[f64]) -> Result<f64> {
            Ok(self.value)
        }
        fn id(&self) -> BackendId {
            self.id
        }
        fn is_fitted(&self) -> bool {
            self.fitted
        }
        fn params(&self) -> Result<BackendParams> {
            Err(EngineError::FitRequired)
        }
    }

    fn fixed_spec(id: BackendId, value: f64) -> BackendSpec {
        BackendSpec::new(id, move || {
            Box::new(Fixed {
                id,
                value,
                fitted: false,
            })
        })
    }

    fn flat_data(n: usize, level: f64) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x = (0..n).map(|i| vec![i as f64]).collect();
        let y = vec![level; n];
        (x, y)
    }

    #[test]
    fn picks_the_lower_mae_candidate() {
        // Target is 100 everywhere: predicting 150 gives MAE 50,
        // predicting 180 gives MAE 80.
        let (x, y) = flat_data(24, 100.0);
        let selector = ModelSelector::new(
            vec![
                fixed_spec(BackendId::GradientBoosted, 180.0),
                fixed_spec(BackendId::Ridge, 150.0),
            ],
            5,
            10,
        );

        let outcome = selector.select(&x, &y).unwrap();
        assert_eq!(outcome.report.backend_id, BackendId::Ridge);
        assert_relative_eq!(outcome.report.mae, 50.0, epsilon = 1e-9);
        assert!(outcome.backend.is_fitted());
    }

    #[test]
    fn ties_keep_the_earliest_registered() {
        let (x, y) = flat_data(24, 100.0);
        let selector = ModelSelector::new(
            vec![
                fixed_spec(BackendId::GradientBoosted, 150.0),
                fixed_spec(BackendId::Ridge, 50.0), // same |error| = 50
            ],
            5,
            10,
        );

        let outcome = selector.select(&x, &y).unwrap();
        assert_eq!(outcome.report.backend_id, BackendId::GradientBoosted);
    }

    #[test]
    fn perfect_candidate_scores_zero() {
        let (x, y) = flat_data(24, 100.0);
        let selector =
            ModelSelector::new(vec![fixed_spec(BackendId::HistoricalMean, 100.0)], 5, 10);

        let outcome = selector.select(&x, &y).unwrap();
        assert_relative_eq!(outcome.report.mae, 0.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.report.mape.unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(outcome.report.residual_std, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn too_little_data_is_rejected() {
        let (x, y) = flat_data(6, 100.0);
        let selector =
            ModelSelector::new(vec![fixed_spec(BackendId::HistoricalMean, 100.0)], 5, 10);
        assert!(matches!(
            selector.select(&x, &y),
            Err(EngineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn no_candidates_is_a_configuration_error() {
        let (x, y) = flat_data(24, 100.0);
        let selector = ModelSelector::new(vec![], 5, 10);
        assert!(matches!(
            selector.select(&x, &y),
            Err(EngineError::Configuration(_))
        ));
    }
}
