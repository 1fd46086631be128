//! Shared numeric utilities.

pub mod metrics;
pub mod optim;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use optim::{nelder_mead, MinimizeResult};
pub use stats::{mean, normal_quantile, population_std, sample_std};
