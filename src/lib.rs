//! # retail-forecast
//!
//! Sales forecasting and business analytics engine for small retail
//! operations working from short daily histories.
//!
//! The engine consumes an already-aggregated, date-indexed daily
//! series and produces structured results: multi-day forecasts with
//! confidence intervals, anomaly reports, weekly seasonal profiles,
//! and rule-based recommendations. Forecasting backends (gradient-
//! boosted trees, an autoregressive model, ridge regression, and a
//! historical-mean baseline) share one fit/predict contract; a model
//! selector picks among them by chronological cross-validation, and a
//! recursive forecaster drives multi-day prediction over a private
//! history buffer.

pub mod artifact;
pub mod config;
pub mod confidence;
pub mod core;
pub mod detection;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod insights;
pub mod models;
pub mod report;
pub mod selection;
pub mod utils;
pub mod validation;

pub use error::{EngineError, Result};

pub mod prelude {
    pub use crate::artifact::ModelArtifact;
    pub use crate::config::{EngineConfig, LagFallback};
    pub use crate::confidence::ConfidenceEstimator;
    pub use crate::core::{DailyRecord, ForecastPoint, SalesForecast, SalesHistory};
    pub use crate::detection::{
        AnomalyDetector, AnomalyDirection, AnomalyRecord, SeasonalAnalyzer, SeasonalProfile,
    };
    pub use crate::error::{EngineError, Result};
    pub use crate::features::{FeatureBuilder, FeatureSchema, FeatureVector};
    pub use crate::forecaster::RecursiveForecaster;
    pub use crate::insights::{
        Recommendation, RecommendationEngine, RecommendationInput, RecommendationKind, TopProduct,
    };
    pub use crate::models::{Backend, BackendId};
    pub use crate::report::{AnalyticsEngine, AnalyticsReport, ReportSection};
    pub use crate::selection::{ModelSelector, TrainingReport};
}
