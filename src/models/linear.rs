//! Ridge regression backend over standardized features.

use crate::error::{EngineError, Result};
use crate::models::{Backend, BackendId, BackendParams};
use crate::utils::stats;
use serde::{Deserialize, Serialize};

/// Persisted parameters of the ridge backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeParams {
    /// L2 regularization strength.
    pub alpha: f64,
    /// Per-column centers (training means).
    pub centers: Vec<f64>,
    /// Per-column scales (training standard deviations).
    pub scales: Vec<f64>,
    /// Coefficients on the standardized columns.
    pub coefficients: Vec<f64>,
    /// Intercept (training target mean).
    pub intercept: f64,
}

/// Ridge regression fit on column-standardized inputs.
///
/// Standardization parameters are learned at fit time and re-applied
/// to every prediction input, so callers always pass raw features.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    alpha: f64,
    fitted: Option<RidgeParams>,
}

impl RidgeRegression {
    /// Create an unfitted backend with the given regularization.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            fitted: None,
        }
    }

    /// Rebuild from persisted parameters.
    pub fn from_params(params: RidgeParams) -> Self {
        Self {
            alpha: params.alpha,
            fitted: Some(params),
        }
    }
}

impl Backend for RidgeRegression {
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if x.is_empty() || y.is_empty() {
            return Err(EngineError::EmptyData);
        }
        if x.len() != y.len() {
            return Err(EngineError::DimensionMismatch {
                expected: y.len(),
                got: x.len(),
            });
        }

        let n = x.len();
        let k = x[0].len();
        for row in x {
            if row.len() != k {
                return Err(EngineError::DimensionMismatch {
                    expected: k,
                    got: row.len(),
                });
            }
        }

        // Column standardization; constant columns keep scale 1 so they
        // standardize to zero instead of dividing by zero.
        let mut centers = vec![0.0; k];
        let mut scales = vec![1.0; k];
        for j in 0..k {
            let column: Vec<f64> = x.iter().map(|row| row[j]).collect();
            centers[j] = stats::mean(&column);
            let std = stats::population_std(&column);
            scales[j] = if std < 1e-10 { 1.0 } else { std };
        }

        let standardized: Vec<Vec<f64>> = x
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| (v - centers[j]) / scales[j])
                    .collect()
            })
            .collect();

        let intercept = stats::mean(y);
        let centered_y: Vec<f64> = y.iter().map(|v| v - intercept).collect();

        // Normal equations with ridge penalty on the diagonal.
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for obs in 0..n {
            let row = &standardized[obs];
            for i in 0..k {
                xty[i] += row[i] * centered_y[obs];
                for j in i..k {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..k {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
            xtx[i][i] += self.alpha;
        }

        let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
            EngineError::Computation("ridge system is not positive definite".into())
        })?;

        self.fitted = Some(RidgeParams {
            alpha: self.alpha,
            centers,
            scales,
            coefficients,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let params = self.fitted.as_ref().ok_or(EngineError::FitRequired)?;
        if features.len() != params.coefficients.len() {
            return Err(EngineError::DimensionMismatch {
                expected: params.coefficients.len(),
                got: features.len(),
            });
        }

        let mut prediction = params.intercept;
        for (j, &value) in features.iter().enumerate() {
            let standardized = (value - params.centers[j]) / params.scales[j];
            prediction += params.coefficients[j] * standardized;
        }
        Ok(prediction)
    }

    fn id(&self) -> BackendId {
        BackendId::Ridge
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn params(&self) -> Result<BackendParams> {
        let params = self.fitted.clone().ok_or(EngineError::FitRequired)?;
        Ok(BackendParams::Ridge(params))
    }
}

/// Solve a symmetric positive definite system via Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
