//! Combined analytics report assembly.
//!
//! One run produces four independent sections. A failing section is
//! replaced by an explicit placeholder carrying the failure reason, so
//! a single failing analytic never blocks the rest of the report.

use crate::artifact::ModelArtifact;
use crate::config::EngineConfig;
use crate::confidence::ConfidenceEstimator;
use crate::core::{SalesForecast, SalesHistory};
use crate::detection::{AnomalyDetector, AnomalyRecord, SeasonalAnalyzer, SeasonalProfile};
use crate::error::{EngineError, Result};
use crate::features::FeatureBuilder;
use crate::forecaster::RecursiveForecaster;
use crate::insights::{
    margin_pct, recent_trend_pct, Recommendation, RecommendationEngine, RecommendationInput,
    TopProduct,
};
use crate::models::{
    default_candidates, AutoRegressive, BoostedConfig, BoxedBackend, GradientBoostedTrees,
    HistoricalMean,
};
use crate::selection::ModelSelector;
use serde::Serialize;

/// Window length for the recent-vs-prior trend fed to recommendations.
const TREND_WINDOW_DAYS: usize = 7;

/// One report section: the computed value or the reason it is missing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection<T> {
    /// The section computed normally.
    Ready(T),
    /// The section failed; the rest of the report is unaffected.
    Unavailable { reason: String },
}

impl<T> ReportSection<T> {
    /// The value, if the section is ready.
    pub fn ready(&self) -> Option<&T> {
        match self {
            ReportSection::Ready(value) => Some(value),
            ReportSection::Unavailable { .. } => None,
        }
    }

    /// Whether the section computed normally.
    pub fn is_ready(&self) -> bool {
        matches!(self, ReportSection::Ready(_))
    }

    fn from_result(result: Result<T>, section: &str) -> Self {
        match result {
            Ok(value) => ReportSection::Ready(value),
            Err(err) => {
                log::warn!("{section} section unavailable: {err}");
                ReportSection::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// The combined output of one analytics run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    /// Multi-day sales forecast with intervals.
    pub forecast: ReportSection<SalesForecast>,
    /// Historical anomalies.
    pub anomalies: ReportSection<Vec<AnomalyRecord>>,
    /// Weekly seasonal profile.
    pub seasonal: ReportSection<SeasonalProfile>,
    /// Ordered recommendations.
    pub recommendations: ReportSection<Vec<Recommendation>>,
}

/// Batch forecasting-and-analytics engine.
///
/// Construction validates the configuration; a bad configuration is
/// the only error that aborts a run outright.
pub struct AnalyticsEngine {
    config: EngineConfig,
    builder: FeatureBuilder,
}

impl AnalyticsEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let builder = FeatureBuilder::new(&config)?;
        Ok(Self { config, builder })
    }

    /// The engine's feature rules.
    pub fn feature_builder(&self) -> &FeatureBuilder {
        &self.builder
    }

    /// Train on the full history: cross-validate all candidates, refit
    /// the winner, and package it as a persistable artifact.
    pub fn train(&self, history: &SalesHistory) -> Result<ModelArtifact> {
        let features = self.builder.build_all(history);
        let x: Vec<Vec<f64>> = features.into_iter().map(|f| f.values).collect();
        let y = history.sales();

        let selector = ModelSelector::new(
            default_candidates(self.builder.schema(), self.config.max_fit_iterations),
            self.config.cv_folds,
            self.config.min_training_days,
        );
        let outcome = selector.select(&x, &y)?;

        ModelArtifact::from_training(
            outcome.backend.as_ref(),
            &outcome.report,
            self.builder.schema(),
        )
    }

    /// Run the full analytics pipeline over one loaded history.
    ///
    /// `artifact` is the trained model to forecast with, if one exists;
    /// without it the engine falls back through freshly fit backends.
    /// `top_product` is externally computed product analytics.
    pub fn run(
        &self,
        history: &SalesHistory,
        artifact: Option<&ModelArtifact>,
        top_product: Option<&TopProduct>,
    ) -> AnalyticsReport {
        let forecast =
            ReportSection::from_result(self.forecast_section(history, artifact), "forecast");

        let anomalies = ReportSection::from_result(
            AnomalyDetector::new(self.config.anomaly_threshold).detect(history),
            "anomalies",
        );

        let seasonal = ReportSection::from_result(
            SeasonalAnalyzer::new(self.config.weekend_weekdays.clone()).analyze(history),
            "seasonal",
        );

        // Recommendations are a pure function of whatever inputs are
        // available; absent inputs only mute their rules.
        let input = RecommendationInput {
            seasonal: seasonal.ready(),
            trend_pct: recent_trend_pct(history, TREND_WINDOW_DAYS),
            margin_pct: margin_pct(history),
            top_product,
        };
        let recommendations = ReportSection::Ready(RecommendationEngine::generate(&input));

        AnalyticsReport {
            forecast,
            anomalies,
            seasonal,
            recommendations,
        }
    }

    fn forecast_section(
        &self,
        history: &SalesHistory,
        artifact: Option<&ModelArtifact>,
    ) -> Result<SalesForecast> {
        let (backend, residual_std) = self.inference_backend(history, artifact)?;

        let forecaster = RecursiveForecaster::new(self.builder.clone());
        let mut forecast = forecaster.forecast(history, self.config.horizon, backend.as_ref())?;

        ConfidenceEstimator::new(self.config.confidence_level).apply(&mut forecast, residual_std);
        Ok(forecast)
    }

    /// Resolve the backend for inference.
    ///
    /// A provided artifact is authoritative: its errors (including
    /// feature mismatches) propagate instead of being papered over by
    /// the fallback chain. Without an artifact, candidates are fit on
    /// the spot in declared order; the historical-mean baseline
    /// terminates the chain and cannot fail on a non-empty history.
    fn inference_backend(
        &self,
        history: &SalesHistory,
        artifact: Option<&ModelArtifact>,
    ) -> Result<(BoxedBackend, Option<f64>)> {
        if let Some(artifact) = artifact {
            let backend = artifact.build_backend(self.builder.schema())?;
            return Ok((Box::new(backend), Some(artifact.residual_std())));
        }

        let features = self.builder.build_all(history);
        let x: Vec<Vec<f64>> = features.into_iter().map(|f| f.values).collect();
        let y = history.sales();

        let names = self.builder.schema().names().to_vec();
        let max_iterations = self.config.max_fit_iterations;
        let chain: [Box<dyn Fn() -> BoxedBackend>; 3] = [
            Box::new(|| Box::new(GradientBoostedTrees::new(BoostedConfig::default()))),
            Box::new(move || {
                Box::new(AutoRegressive::from_feature_names(&names, max_iterations))
            }),
            Box::new(|| Box::new(HistoricalMean::new())),
        ];

        for factory in &chain {
            let mut backend = factory();
            match backend.fit(&x, &y) {
                Ok(()) => {
                    log::info!("no artifact available; fit {} for inference", backend.id());
                    return Ok((backend, None));
                }
                Err(err) => {
                    log::warn!("fallback candidate {} failed to fit: {err}", backend.id());
                }
            }
        }

        Err(EngineError::MissingBackend(
            "every fallback backend failed to fit".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DailyRecord;
    use chrono::NaiveDate;

    fn history(sales: &[f64]) -> SalesHistory {
        let records = sales
            .iter()
            .enumerate()
            .map(|(i, &s)| DailyRecord {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                total_sales: s,
                orders_count: 40.0,
                items_sold: 90.0,
                total_expenses: s * 0.55,
            })
            .collect();
        SalesHistory::new(records).unwrap()
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_aborts_construction() {
        let config = EngineConfig::default().with_confidence_level(2.0);
        assert!(matches!(
            AnalyticsEngine::new(config),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn full_run_produces_all_sections() {
        let sales: Vec<f64> = (0..21).map(|i| 900.0 + (i % 7) as f64 * 30.0).collect();
        let report = engine().run(&history(&sales), None, None);

        assert!(report.forecast.is_ready());
        assert!(report.anomalies.is_ready());
        assert!(report.seasonal.is_ready());
        assert!(report.recommendations.is_ready());

        let forecast = report.forecast.ready().unwrap();
        assert_eq!(forecast.len(), 7);
        for point in forecast.points() {
            assert!(point.predicted_sales >= 0.0);
            assert!(point.lower_bound >= 0.0);
            assert!(point.upper_bound >= point.lower_bound);
        }
    }

    #[test]
    fn short_history_degrades_sections_independently() {
        // Three days: anomalies need five, but the forecast can still
        // fall back and seasonality still groups what it has.
        let report = engine().run(&history(&[500.0, 520.0, 540.0]), None, None);

        assert!(report.forecast.is_ready());
        assert!(!report.anomalies.is_ready());
        assert!(report.seasonal.is_ready());
        assert!(report.recommendations.is_ready());

        match &report.anomalies {
            ReportSection::Unavailable { reason } => {
                assert!(reason.contains("insufficient data"));
            }
            ReportSection::Ready(_) => panic!("expected anomalies to be unavailable"),
        }
    }

    #[test]
    fn artifact_feature_mismatch_fails_the_forecast_loudly() {
        let sales: Vec<f64> = (0..20).map(|i| 800.0 + i as f64 * 5.0).collect();
        let history = history(&sales);
        let engine = engine();

        let mut artifact = engine.train(&history).unwrap();
        artifact.metadata.features.insert(0, "foo".to_string());

        let report = engine.run(&history, Some(&artifact), None);
        match &report.forecast {
            ReportSection::Unavailable { reason } => {
                assert!(reason.contains("foo"), "reason: {reason}");
            }
            ReportSection::Ready(_) => panic!("expected the forecast section to fail"),
        }
        // Other sections are unaffected.
        assert!(report.anomalies.is_ready());
        assert!(report.seasonal.is_ready());
    }

    #[test]
    fn trained_artifact_drives_the_forecast() {
        let sales: Vec<f64> = (0..21).map(|i| 1000.0 + (i as f64) * 10.0).collect();
        let history = history(&sales);
        let engine = engine();

        let artifact = engine.train(&history).unwrap();
        let report = engine.run(&history, Some(&artifact), None);

        let forecast = report.forecast.ready().expect("forecast should be ready");
        assert_eq!(forecast.len(), 7);
        // With a recorded residual dispersion the interval is
        // symmetric around every prediction.
        for point in forecast.points() {
            assert!(point.upper_bound >= point.predicted_sales);
        }
    }

    #[test]
    fn report_serializes_to_json() {
        let sales: Vec<f64> = (0..14).map(|i| 700.0 + (i % 5) as f64 * 20.0).collect();
        let report = engine().run(&history(&sales), None, None);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"forecast\""));
        assert!(json.contains("\"recommendations\""));
    }
}
