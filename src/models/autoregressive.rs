//! Autoregressive backend with automatic order selection.
//!
//! Orders (p, d, q) are searched over a small grid: d comes from a
//! stationarity test, (p, q) from minimizing AIC over conditional
//! sum-of-squares fits. One-step predictions read their lagged inputs
//! from the sales-lag feature columns, so the backend composes with
//! the same recursive forecasting loop as the regression backends.

use crate::error::{EngineError, Result};
use crate::models::{Backend, BackendId, BackendParams};
use crate::utils::optim::nelder_mead;
use crate::utils::stats;
use crate::validation::adf_test;
use serde::{Deserialize, Serialize};

const LAG_FEATURE_PREFIX: &str = "sales_lag_";

/// Persisted parameters of the autoregressive backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRegressiveParams {
    /// AR order.
    pub p: usize,
    /// Differencing order (0 or 1).
    pub d: usize,
    /// MA order (participates in selection; innovations are zero at
    /// prediction time).
    pub q: usize,
    /// AR coefficients.
    pub ar: Vec<f64>,
    /// MA coefficients.
    pub ma: Vec<f64>,
    /// Intercept on the (differenced) scale.
    pub intercept: f64,
    /// AIC of the selected order.
    pub aic: f64,
}

/// Autoregressive statistical backend.
#[derive(Debug, Clone)]
pub struct AutoRegressive {
    max_p: usize,
    max_q: usize,
    max_iterations: usize,
    /// Feature-column indices of sales_lag_1, sales_lag_2, ... in order.
    lag_indices: Vec<usize>,
    fitted: Option<AutoRegressiveParams>,
}

impl AutoRegressive {
    /// Create a backend resolving its lag columns from feature names.
    ///
    /// Consecutive `sales_lag_k` columns are collected starting at
    /// k = 1; the count bounds the usable AR order.
    pub fn from_feature_names(names: &[String], max_iterations: usize) -> Self {
        let mut lag_indices = Vec::new();
        for k in 1.. {
            let name = format!("{LAG_FEATURE_PREFIX}{k}");
            match names.iter().position(|n| *n == name) {
                Some(idx) => lag_indices.push(idx),
                None => break,
            }
        }
        Self {
            max_p: 2,
            max_q: 2,
            max_iterations,
            lag_indices,
            fitted: None,
        }
    }

    /// Rebuild from persisted parameters against an ordered feature
    /// list. Fails with `FeatureMismatch` if a required lag column is
    /// absent.
    pub fn from_params(params: AutoRegressiveParams, feature_names: &[String]) -> Result<Self> {
        let needed = params.p + params.d;
        let mut lag_indices = Vec::with_capacity(needed);
        for k in 1..=needed.max(1) {
            let name = format!("{LAG_FEATURE_PREFIX}{k}");
            let idx = feature_names
                .iter()
                .position(|n| *n == name)
                .ok_or_else(|| EngineError::FeatureMismatch(name.clone()))?;
            lag_indices.push(idx);
        }
        Ok(Self {
            max_p: params.p.max(2),
            max_q: params.q.max(2),
            max_iterations: 500,
            lag_indices,
            fitted: Some(params),
        })
    }

    /// Selected (p, d, q) order, if fitted.
    pub fn selected_order(&self) -> Option<(usize, usize, usize)> {
        self.fitted.as_ref().map(|f| (f.p, f.d, f.q))
    }

    /// Conditional sum of squares of an ARMA candidate.
    fn css(z: &[f64], p: usize, q: usize, ar: &[f64], ma: &[f64], intercept: f64) -> f64 {
        let n = z.len();
        let start = p.max(q);
        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut total = 0.0;
        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (z[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }
            let error = z[t] - pred;
            residuals[t] = error;
            total += error * error;
        }
        total
    }

    /// Fit one (p, q) candidate on the differenced series, returning
    /// parameters and AIC, or None when the candidate cannot be fit.
    fn fit_candidate(&self, z: &[f64], p: usize, q: usize, d: usize) -> Option<AutoRegressiveParams> {
        let start = p.max(q);
        if z.len() < start + 3 {
            return None;
        }

        let mean = stats::mean(z);
        let (ar, ma, intercept, css) = if p == 0 && q == 0 {
            let css = z.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            (vec![], vec![], mean, css)
        } else {
            let n_params = p + q + 1;
            let mut initial = vec![0.0; n_params];
            initial[0] = mean;
            for i in 0..p {
                initial[1 + i] = 0.1 / (i + 1) as f64;
            }
            for i in 0..q {
                initial[1 + p + i] = 0.1 / (i + 1) as f64;
            }

            let mut bounds = vec![(-1e9, 1e9)];
            bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

            let result = nelder_mead(
                |params| {
                    let ar = &params[1..1 + p];
                    let ma = &params[1 + p..];
                    Self::css(z, p, q, ar, ma, params[0])
                },
                &initial,
                &bounds,
                self.max_iterations,
            );

            let intercept = result.point[0];
            let ar = result.point[1..1 + p].to_vec();
            let ma = result.point[1 + p..].to_vec();
            (ar, ma, intercept, result.value)
        };

        let n_eff = (z.len() - start) as f64;
        if n_eff < 1.0 || !css.is_finite() {
            return None;
        }
        let variance = (css / n_eff).max(1e-12);
        let k = (p + q + 1) as f64;
        let log_likelihood =
            -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;

        Some(AutoRegressiveParams {
            p,
            d,
            q,
            ar,
            ma,
            intercept,
            aic,
        })
    }
}

impl Backend for AutoRegressive {
    fn fit(&mut self, _x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if y.is_empty() {
            return Err(EngineError::EmptyData);
        }
        if y.len() < 8 {
            return Err(EngineError::InsufficientData {
                needed: 8,
                got: y.len(),
            });
        }
        if self.lag_indices.is_empty() {
            return Err(EngineError::InvalidParameter(
                "no sales lag features available for the autoregressive backend".into(),
            ));
        }

        // Differencing order from the stationarity test: failing to
        // reject a unit root at 5% means first differences.
        let adf = adf_test(y);
        let d = if adf.is_stationary { 0 } else { 1 };

        let z: Vec<f64> = if d == 1 {
            y.windows(2).map(|w| w[1] - w[0]).collect()
        } else {
            y.to_vec()
        };

        let max_p = self.max_p.min(self.lag_indices.len().saturating_sub(d));
        let mut best: Option<AutoRegressiveParams> = None;
        for p in 0..=max_p {
            for q in 0..=self.max_q {
                if let Some(candidate) = self.fit_candidate(&z, p, q, d) {
                    log::debug!(
                        "order candidate ({p},{d},{q}): aic {:.3}",
                        candidate.aic
                    );
                    let better = best
                        .as_ref()
                        .map(|b| candidate.aic < b.aic)
                        .unwrap_or(true);
                    if better {
                        best = Some(candidate);
                    }
                }
            }
        }

        let selected =
            best.ok_or_else(|| EngineError::Computation("no autoregressive order could be fit".into()))?;
        log::debug!(
            "selected order ({},{},{}) with aic {:.3}",
            selected.p,
            selected.d,
            selected.q,
            selected.aic
        );
        self.fitted = Some(selected);
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let params = self.fitted.as_ref().ok_or(EngineError::FitRequired)?;
        let needed = params.p + params.d;
        if self.lag_indices.len() < needed {
            return Err(EngineError::InvalidParameter(format!(
                "autoregressive order needs {needed} sales lags, {} available",
                self.lag_indices.len()
            )));
        }

        let lag = |k: usize| -> Result<f64> {
            let idx = self.lag_indices[k - 1];
            features
                .get(idx)
                .copied()
                .ok_or(EngineError::DimensionMismatch {
                    expected: idx + 1,
                    got: features.len(),
                })
        };

        // Future innovations are zero, so MA terms drop out here.
        let c = params.intercept;
        let prediction = if params.d == 0 {
            let mut value = c;
            for i in 0..params.p {
                value += params.ar[i] * (lag(i + 1)? - c);
            }
            value
        } else {
            let mut delta = c;
            for i in 0..params.p {
                let z_lag = lag(i + 1)? - lag(i + 2)?;
                delta += params.ar[i] * (z_lag - c);
            }
            lag(1)? + delta
        };

        Ok(prediction)
    }

    fn id(&self) -> BackendId {
        BackendId::AutoRegressive
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn params(&self) -> Result<BackendParams> {
        let params = self.fitted.clone().ok_or(EngineError::FitRequired)?;
        Ok(BackendParams::AutoRegressive(params))
    }
}
