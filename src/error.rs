//! Error types for the retail-forecast engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during forecasting and analytics operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Fewer records than the operation requires.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// No trained backend is available for inference.
    #[error("no trained backend available: {0}")]
    MissingBackend(String),

    /// The series has zero variance.
    #[error("degenerate series: zero variance")]
    DegenerateSeries,

    /// A persisted feature name is absent from the live feature set.
    #[error("feature '{0}' is not produced by the current feature builder")]
    FeatureMismatch(String),

    /// Invalid or missing configuration; aborts the run.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date-ordering violation in the input series.
    #[error("date error: {0}")]
    DateError(String),

    /// Numerical failure during fitting or prediction.
    #[error("computation error: {0}")]
    Computation(String),

    /// I/O failure while persisting or loading an artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
