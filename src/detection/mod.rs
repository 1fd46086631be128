//! Historical-series analysis: anomalies and weekly seasonality.

mod anomaly;
mod seasonal;

pub use anomaly::{AnomalyDetector, AnomalyDirection, AnomalyRecord};
pub use seasonal::{SeasonalAnalyzer, SeasonalProfile};
