//! End-to-end tests for the forecasting and analytics engine.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use retail_forecast::models::{Backend, BackendId, BackendParams, BackendSpec};
use retail_forecast::prelude::*;
use retail_forecast::selection::ModelSelector;

fn start_date() -> NaiveDate {
    // A Monday.
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

fn history_from(sales: &[f64]) -> SalesHistory {
    let records = sales
        .iter()
        .enumerate()
        .map(|(i, &s)| DailyRecord {
            date: start_date() + Duration::days(i as i64),
            total_sales: s,
            orders_count: 30.0 + (i % 4) as f64,
            items_sold: 70.0 + (i % 6) as f64,
            total_expenses: s * 0.5,
        })
        .collect();
    SalesHistory::new(records).unwrap()
}

/// Stub backend that echoes the sales_lag_1 feature.
struct LagOneStub {
    index: usize,
}

impl Backend for LagOneStub {
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<()> {
        Ok(())
    }
    fn predict(&self, features: &[f64]) -> Result<f64> {
        Ok(features[self.index])
    }
    fn id(&self) -> BackendId {
        BackendId::HistoricalMean
    }
    fn is_fitted(&self) -> bool {
        true
    }
    fn params(&self) -> Result<BackendParams> {
        Err(EngineError::FitRequired)
    }
}

/// Stub backend always predicting a fixed value.
struct FixedStub {
    id: BackendId,
    value: f64,
}

impl Backend for FixedStub {
    fn fit(&mut self, _x: &[Vec<f64>], _y: &[f64]) -> Result<()> {
        Ok(())
    }
    fn predict(&self, _features: &[f64]) -> Result<f64> {
        Ok(self.value)
    }
    fn id(&self) -> BackendId {
        self.id
    }
    fn is_fitted(&self) -> bool {
        true
    }
    fn params(&self) -> Result<BackendParams> {
        Err(EngineError::FitRequired)
    }
}

#[test]
fn constant_series_has_no_anomalies_and_no_weekend_boost() {
    // Scenario: ten days at a constant 1000.
    let history = history_from(&[1000.0; 10]);

    let anomalies = AnomalyDetector::new(2.0).detect(&history).unwrap();
    assert!(anomalies.is_empty());

    let profile = SeasonalAnalyzer::new(vec![5, 6]).analyze(&history).unwrap();
    assert_relative_eq!(profile.weekend_boost_pct, 0.0, epsilon = 1e-12);
}

#[test]
fn single_extreme_day_is_flagged_as_spike() {
    // Scenario: values near 100 with one day at 500.
    let mut sales = vec![100.0, 95.0, 105.0, 98.0, 102.0, 97.0, 103.0, 100.0, 99.0];
    sales.push(500.0);
    let history = history_from(&sales);

    let anomalies = AnomalyDetector::new(2.0).detect(&history).unwrap();
    assert_eq!(anomalies.len(), 1);

    let spike = &anomalies[0];
    assert_eq!(spike.value, 500.0);
    assert_eq!(spike.direction, AnomalyDirection::Spike);
    assert!(spike.z_score > 2.0);
}

#[test]
fn lag_one_stub_repeats_last_value_with_collapsed_intervals() {
    // Scenario: a backend predicting lag_1, last observed value 250.
    let config = EngineConfig::default();
    let builder = FeatureBuilder::new(&config).unwrap();
    let index = builder.schema().index_of("sales_lag_1").unwrap();

    let history = history_from(&[240.0, 245.0, 250.0]);
    let forecaster = RecursiveForecaster::new(builder);
    let mut forecast = forecaster
        .forecast(&history, 3, &LagOneStub { index })
        .unwrap();

    assert_eq!(forecast.len(), 3);
    for point in forecast.points() {
        assert_relative_eq!(point.predicted_sales, 250.0, epsilon = 1e-12);
    }

    // Zero dispersion: the interval collapses to the prediction.
    ConfidenceEstimator::new(0.95).apply(&mut forecast, Some(0.0));
    for point in forecast.points() {
        assert_eq!(point.lower_bound, 250.0);
        assert_eq!(point.upper_bound, 250.0);
    }
}

#[test]
fn selector_prefers_the_lower_validation_error() {
    // Scenario: candidates with MAE 50 and 80.
    let history = history_from(&[100.0; 24]);
    let builder = FeatureBuilder::new(&EngineConfig::default()).unwrap();
    let x: Vec<Vec<f64>> = builder
        .build_all(&history)
        .into_iter()
        .map(|f| f.values)
        .collect();
    let y = history.sales();

    let candidates = vec![
        BackendSpec::new(BackendId::GradientBoosted, || {
            Box::new(FixedStub {
                id: BackendId::GradientBoosted,
                value: 180.0, // MAE 80 against a flat 100
            })
        }),
        BackendSpec::new(BackendId::Ridge, || {
            Box::new(FixedStub {
                id: BackendId::Ridge,
                value: 150.0, // MAE 50
            })
        }),
    ];

    let outcome = ModelSelector::new(candidates, 5, 10).select(&x, &y).unwrap();
    assert_eq!(outcome.report.backend_id, BackendId::Ridge);
    assert_relative_eq!(outcome.report.mae, 50.0, epsilon = 1e-9);
}

#[test]
fn persisted_unknown_feature_raises_a_mismatch() {
    // Scenario: artifact metadata names a feature the live builder
    // does not produce.
    let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
    let sales: Vec<f64> = (0..20).map(|i| 600.0 + (i % 7) as f64 * 25.0).collect();
    let history = history_from(&sales);

    let mut artifact = engine.train(&history).unwrap();
    artifact.metadata.features.push("foo".to_string());

    match artifact.build_backend(engine.feature_builder().schema()) {
        Err(EngineError::FeatureMismatch(name)) => assert_eq!(name, "foo"),
        Err(other) => panic!("expected FeatureMismatch, got {other}"),
        Ok(_) => panic!("expected FeatureMismatch, got a backend"),
    }
}

#[test]
fn feature_builder_covers_every_record() {
    let sales: Vec<f64> = (0..15).map(|i| 400.0 + i as f64).collect();
    let history = history_from(&sales);
    let builder = FeatureBuilder::new(&EngineConfig::default()).unwrap();

    let features = builder.build_all(&history);
    assert_eq!(features.len(), history.len());

    // The earliest rows still carry defined lag values (the fallback).
    let lag_3 = builder.schema().index_of("sales_lag_3").unwrap();
    for vector in &features[..3] {
        assert!(vector.values[lag_3].is_finite());
    }
}

#[test]
fn forecast_dates_extend_history_and_stay_non_negative() {
    let sales: Vec<f64> = (0..12).map(|i| 300.0 + (i % 3) as f64 * 10.0).collect();
    let history = history_from(&sales);

    let engine = AnalyticsEngine::new(EngineConfig::default().with_horizon(5)).unwrap();
    let report = engine.run(&history, None, None);
    let forecast = report.forecast.ready().expect("forecast should be ready");

    assert_eq!(forecast.len(), 5);
    let mut expected = history.last_date();
    for point in forecast.points() {
        expected = expected + Duration::days(1);
        assert_eq!(point.date, expected);
        assert!(point.predicted_sales >= 0.0);
        assert!(point.lower_bound >= 0.0);
        assert!(point.upper_bound >= point.predicted_sales);
    }
}

#[test]
fn train_save_load_and_forecast_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales_model.json");

    let sales: Vec<f64> = (0..28)
        .map(|i| 500.0 + (i % 7) as f64 * 40.0 + i as f64 * 2.0)
        .collect();
    let history = history_from(&sales);

    let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
    let artifact = engine.train(&history).unwrap();
    assert_eq!(artifact.metadata.target_field, "total_sales");
    assert!(artifact.metadata.metrics.mae >= 0.0);

    artifact.save(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();
    assert_eq!(loaded.metadata.model_type, artifact.metadata.model_type);

    let report = engine.run(&history, Some(&loaded), None);
    let forecast = report.forecast.ready().expect("forecast should be ready");
    assert_eq!(forecast.len(), 7);
    assert!(forecast.total_predicted() > 0.0);
}

#[test]
fn recommendations_are_reproducible_across_runs() {
    let sales: Vec<f64> = (0..21)
        .map(|i| if i % 7 >= 5 { 1500.0 } else { 800.0 })
        .collect();
    let history = history_from(&sales);
    let top_product = TopProduct {
        name: "Espresso".to_string(),
        units_sold: 410,
        revenue: 1230.0,
    };

    let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
    let first = engine.run(&history, None, Some(&top_product));
    let second = engine.run(&history, None, Some(&top_product));

    let first_recs = first.recommendations.ready().unwrap();
    let second_recs = second.recommendations.ready().unwrap();
    assert_eq!(first_recs, second_recs);

    // The strong weekend fires the high-priority rule first.
    assert_eq!(first_recs[0].kind, RecommendationKind::HighWeekendDemand);
    assert!(first_recs
        .iter()
        .any(|r| r.kind == RecommendationKind::StockTopProduct));
}

#[test]
fn boundary_serialization_shapes() {
    let sales: Vec<f64> = (0..14).map(|i| 650.0 + (i % 5) as f64 * 12.0).collect();
    let history = history_from(&sales);
    let engine = AnalyticsEngine::new(EngineConfig::default()).unwrap();
    let report = engine.run(&history, None, None);

    let json = serde_json::to_value(&report).unwrap();
    let forecast = &json["forecast"]["ready"];
    assert!(forecast["points"][0]["predicted_sales"].is_number());
    assert!(forecast["points"][0]["lower_bound"].is_number());

    let recommendations = &json["recommendations"]["ready"];
    assert!(recommendations[0]["kind"].is_string());
    assert!(recommendations[0]["priority"].is_string());
}
