//! Forecasting backends.
//!
//! Every backend implements the same fit/predict contract over
//! engineered feature rows, owns only its fitted parameters, and can
//! export them for persistence.

mod autoregressive;
mod baseline;
mod boosted;
mod linear;

pub use autoregressive::{AutoRegressive, AutoRegressiveParams};
pub use baseline::{HistoricalMean, HistoricalMeanParams};
pub use boosted::{BoostedConfig, BoostedParams, GradientBoostedTrees};
pub use linear::{RidgeParams, RidgeRegression};

use crate::error::Result;
use crate::features::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// Gradient-boosted regression trees.
    GradientBoosted,
    /// Autoregressive statistical model.
    AutoRegressive,
    /// Ridge regression over standardized features.
    Ridge,
    /// Historical-mean baseline.
    HistoricalMean,
}

impl BackendId {
    /// Stable string form used in artifacts and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::GradientBoosted => "gradient_boosted",
            BackendId::AutoRegressive => "auto_regressive",
            BackendId::Ridge => "ridge",
            BackendId::HistoricalMean => "historical_mean",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted parameters of a backend, as persisted in a model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum BackendParams {
    GradientBoosted(BoostedParams),
    AutoRegressive(AutoRegressiveParams),
    Ridge(RidgeParams),
    HistoricalMean(HistoricalMeanParams),
}

impl BackendParams {
    /// The backend variant these parameters belong to.
    pub fn id(&self) -> BackendId {
        match self {
            BackendParams::GradientBoosted(_) => BackendId::GradientBoosted,
            BackendParams::AutoRegressive(_) => BackendId::AutoRegressive,
            BackendParams::Ridge(_) => BackendId::Ridge,
            BackendParams::HistoricalMean(_) => BackendId::HistoricalMean,
        }
    }
}

/// Common interface for all forecasting backends.
///
/// Object-safe: selectors and the forecaster work with
/// `Box<dyn Backend>`.
pub trait Backend {
    /// Fit the backend on feature rows and the aligned target column.
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()>;

    /// Predict the target for one feature row.
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// The backend's identifier.
    fn id(&self) -> BackendId;

    /// Whether the backend has been fitted.
    fn is_fitted(&self) -> bool;

    /// Export fitted parameters for persistence.
    fn params(&self) -> Result<BackendParams>;
}

/// Type alias for boxed backend trait objects.
pub type BoxedBackend = Box<dyn Backend>;

/// A named backend factory, registered with the model selector.
pub struct BackendSpec {
    /// Backend identifier.
    pub id: BackendId,
    factory: Box<dyn Fn() -> BoxedBackend>,
}

impl BackendSpec {
    /// Create a spec from a factory closure.
    pub fn new<F>(id: BackendId, factory: F) -> Self
    where
        F: Fn() -> BoxedBackend + 'static,
    {
        Self {
            id,
            factory: Box::new(factory),
        }
    }

    /// Create a fresh, unfitted backend instance.
    pub fn create(&self) -> BoxedBackend {
        (self.factory)()
    }
}

/// Candidate backends in registration order: gradient-boosted trees,
/// the autoregressive model, then ridge regression. The order doubles
/// as the tie-break for model selection.
pub fn default_candidates(schema: &FeatureSchema, max_fit_iterations: usize) -> Vec<BackendSpec> {
    let ar_names: Vec<String> = schema.names().to_vec();
    vec![
        BackendSpec::new(BackendId::GradientBoosted, || {
            Box::new(GradientBoostedTrees::new(BoostedConfig::default()))
        }),
        BackendSpec::new(BackendId::AutoRegressive, move || {
            Box::new(AutoRegressive::from_feature_names(
                &ar_names,
                max_fit_iterations,
            ))
        }),
        BackendSpec::new(BackendId::Ridge, || Box::new(RidgeRegression::new(1.0))),
    ]
}

/// Rebuild a backend from persisted parameters.
///
/// `feature_names` is the artifact's ordered feature list; backends
/// that address named columns resolve their indices against it.
pub fn backend_from_params(
    params: &BackendParams,
    feature_names: &[String],
) -> Result<BoxedBackend> {
    Ok(match params {
        BackendParams::GradientBoosted(p) => Box::new(GradientBoostedTrees::from_params(p.clone())),
        BackendParams::AutoRegressive(p) => {
            Box::new(AutoRegressive::from_params(p.clone(), feature_names)?)
        }
        BackendParams::Ridge(p) => Box::new(RidgeRegression::from_params(p.clone())),
        BackendParams::HistoricalMean(p) => Box::new(HistoricalMean::from_params(*p)),
    })
}
