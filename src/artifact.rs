//! Persisted model artifacts.
//!
//! Training writes one self-contained JSON artifact: backend
//! parameters plus metadata. The metadata's ordered feature-name list
//! is a binding contract; inference rebuilds its inputs in exactly
//! that order and refuses to run if a named feature no longer exists.

use crate::error::{EngineError, Result};
use crate::features::FeatureSchema;
use crate::models::{backend_from_params, Backend, BackendId, BackendParams, BoxedBackend};
use crate::selection::TrainingReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The only target this engine forecasts.
pub const TARGET_FIELD: &str = "total_sales";

/// Validation metrics carried alongside the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetrics {
    /// Cross-validation mean absolute error.
    pub mae: f64,
    /// Cross-validation mean absolute percentage error.
    pub mape: Option<f64>,
    /// Cross-fold residual standard deviation.
    pub residual_std: f64,
}

/// Metadata describing a trained backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Which backend the parameters belong to.
    pub model_type: BackendId,
    /// Name of the forecast target.
    pub target_field: String,
    /// Ordered feature names the backend was trained on.
    pub features: Vec<String>,
    /// Validation metrics.
    pub metrics: ArtifactMetrics,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
}

/// A trained backend with its metadata, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Artifact metadata.
    pub metadata: ArtifactMetadata,
    /// Fitted backend parameters.
    pub params: BackendParams,
}

impl ModelArtifact {
    /// Package a freshly trained backend for persistence.
    pub fn from_training(
        backend: &dyn Backend,
        report: &TrainingReport,
        schema: &FeatureSchema,
    ) -> Result<Self> {
        let params = backend.params()?;
        Ok(Self {
            metadata: ArtifactMetadata {
                model_type: backend.id(),
                target_field: TARGET_FIELD.to_string(),
                features: schema.names().to_vec(),
                metrics: ArtifactMetrics {
                    mae: report.mae,
                    mape: report.mape,
                    residual_std: report.residual_std,
                },
                trained_at: report.validated_at,
            },
            params,
        })
    }

    /// Write the artifact as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!(
            "saved {} artifact to {}",
            self.metadata.model_type,
            path.display()
        );
        Ok(())
    }

    /// Load an artifact from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EngineError::MissingBackend(format!(
                "artifact not found at {}",
                path.display()
            )));
        }
        let json = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)?;
        log::info!(
            "loaded {} artifact from {} (trained {})",
            artifact.metadata.model_type,
            path.display(),
            artifact.metadata.trained_at
        );
        Ok(artifact)
    }

    /// Residual dispersion recorded at training time.
    pub fn residual_std(&self) -> f64 {
        self.metadata.metrics.residual_std
    }

    /// Rebuild an inference backend bound to the live feature schema.
    ///
    /// Every persisted feature name is resolved to a live column; a
    /// missing name is a hard `FeatureMismatch`, never a silent zero.
    pub fn build_backend(&self, live_schema: &FeatureSchema) -> Result<ProjectedBackend> {
        if self.metadata.target_field != TARGET_FIELD {
            return Err(EngineError::InvalidParameter(format!(
                "artifact targets '{}', engine forecasts '{TARGET_FIELD}'",
                self.metadata.target_field
            )));
        }
        if self.metadata.model_type != self.params.id() {
            return Err(EngineError::InvalidParameter(format!(
                "artifact metadata says {} but parameters are for {}",
                self.metadata.model_type,
                self.params.id()
            )));
        }

        let projection = live_schema.project(&self.metadata.features)?;
        let inner = backend_from_params(&self.params, &self.metadata.features)?;
        Ok(ProjectedBackend { inner, projection })
    }
}

/// A loaded backend that reorders live feature vectors into the
/// artifact's feature order before predicting.
pub struct ProjectedBackend {
    inner: BoxedBackend,
    projection: Vec<usize>,
}

impl Backend for ProjectedBackend {
    /// Loaded artifacts are immutable; refitting goes through training.
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<()> {
        Err(EngineError::InvalidParameter(
            "a loaded artifact backend is read-only".into(),
        ))
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut projected = Vec::with_capacity(self.projection.len());
        for &index in &self.projection {
            let value = features
                .get(index)
                .copied()
                .ok_or(EngineError::DimensionMismatch {
                    expected: index + 1,
                    got: features.len(),
                })?;
            projected.push(value);
        }
        self.inner.predict(&projected)
    }

    fn id(&self) -> BackendId {
        self.inner.id()
    }

    fn is_fitted(&self) -> bool {
        self.inner.is_fitted()
    }

    fn params(&self) -> Result<BackendParams> {
        self.inner.params()
    }
}
