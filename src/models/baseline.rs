//! Historical-mean baseline backend.
//!
//! The degenerate end of the fallback chain: always predicts the mean
//! of the training target. It cannot fail after a successful fit,
//! which is what makes it a safe terminus.

use crate::error::{EngineError, Result};
use crate::models::{Backend, BackendId, BackendParams};
use crate::utils::stats;
use serde::{Deserialize, Serialize};

/// Persisted parameters of the baseline backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoricalMeanParams {
    /// Mean of the training target.
    pub mean: f64,
}

/// Backend that predicts the historical mean of the target.
#[derive(Debug, Clone, Default)]
pub struct HistoricalMean {
    mean: Option<f64>,
}

impl HistoricalMean {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parameters.
    pub fn from_params(params: HistoricalMeanParams) -> Self {
        Self {
            mean: Some(params.mean),
        }
    }
}

impl Backend for HistoricalMean {
    fn fit(&mut self, _x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if y.is_empty() {
            return Err(EngineError::EmptyData);
        }
        self.mean = Some(stats::mean(y));
        Ok(())
    }

    fn predict(&self, _features: &[f64]) -> Result<f64> {
        self.mean.ok_or(EngineError::FitRequired)
    }

    fn id(&self) -> BackendId {
        BackendId::HistoricalMean
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    fn params(&self) -> Result<BackendParams> {
        let mean = self.mean.ok_or(EngineError::FitRequired)?;
        Ok(BackendParams::HistoricalMean(HistoricalMeanParams { mean }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn predicts_training_mean() {
        let mut backend = HistoricalMean::new();
        backend.fit(&[], &[100.0, 200.0, 300.0]).unwrap();
        assert!(backend.is_fitted());
        assert_relative_eq!(backend.predict(&[]).unwrap(), 200.0, epsilon = 1e-12);
        // Features are ignored entirely.
        assert_relative_eq!(
            backend.predict(&[1.0, 2.0, 3.0]).unwrap(),
            200.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn requires_fit_before_predict() {
        let backend = HistoricalMean::new();
        assert!(matches!(backend.predict(&[]), Err(EngineError::FitRequired)));
        assert!(backend.params().is_err());
    }

    #[test]
    fn empty_target_is_rejected() {
        let mut backend = HistoricalMean::new();
        assert!(matches!(backend.fit(&[], &[]), Err(EngineError::EmptyData)));
    }

    #[test]
    fn params_round_trip() {
        let mut backend = HistoricalMean::new();
        backend.fit(&[], &[10.0, 20.0]).unwrap();
        let params = backend.params().unwrap();
        let rebuilt = match params {
            BackendParams::HistoricalMean(p) => HistoricalMean::from_params(p),
            _ => panic!("wrong params variant"),
        };
        assert_relative_eq!(rebuilt.predict(&[]).unwrap(), 15.0, epsilon = 1e-12);
    }
}
