//! Forecast result structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast day: a point prediction with interval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date.
    pub date: NaiveDate,
    /// Predicted daily sales, clamped to be non-negative.
    pub predicted_sales: f64,
    /// Lower interval bound, clamped to be non-negative.
    pub lower_bound: f64,
    /// Upper interval bound.
    pub upper_bound: f64,
}

impl ForecastPoint {
    /// A point prediction with a collapsed (zero-width) interval.
    pub fn point(date: NaiveDate, predicted_sales: f64) -> Self {
        Self {
            date,
            predicted_sales,
            lower_bound: predicted_sales,
            upper_bound: predicted_sales,
        }
    }
}

/// An ordered multi-day forecast, one point per horizon step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesForecast {
    points: Vec<ForecastPoint>,
}

impl SalesForecast {
    /// Wrap a date-ordered point sequence.
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    /// Forecast points in date order.
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Mutable access for interval decoration.
    pub fn points_mut(&mut self) -> &mut [ForecastPoint] {
        &mut self.points
    }

    /// Horizon length.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point predictions as a plain vector.
    pub fn predictions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_sales).collect()
    }

    /// Sum of predicted sales over the horizon.
    pub fn total_predicted(&self) -> f64 {
        self.points.iter().map(|p| p.predicted_sales).sum()
    }

    /// Mean predicted daily sales over the horizon.
    pub fn daily_average(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.total_predicted() / self.points.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn point_starts_with_collapsed_interval() {
        let point = ForecastPoint::point(day(1), 150.0);
        assert_eq!(point.lower_bound, 150.0);
        assert_eq!(point.upper_bound, 150.0);
    }

    #[test]
    fn summary_helpers() {
        let forecast = SalesForecast::new(vec![
            ForecastPoint::point(day(1), 100.0),
            ForecastPoint::point(day(2), 200.0),
            ForecastPoint::point(day(3), 300.0),
        ]);
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast.total_predicted(), 600.0);
        assert_eq!(forecast.daily_average(), 200.0);
        assert_eq!(forecast.predictions(), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn empty_forecast_averages_to_zero() {
        let forecast = SalesForecast::default();
        assert!(forecast.is_empty());
        assert_eq!(forecast.daily_average(), 0.0);
    }

    #[test]
    fn serializes_with_boundary_field_names() {
        let forecast = SalesForecast::new(vec![ForecastPoint {
            date: day(1),
            predicted_sales: 120.0,
            lower_bound: 100.0,
            upper_bound: 140.0,
        }]);
        let json = serde_json::to_string(&forecast).unwrap();
        assert!(json.contains("\"predicted_sales\":120.0"));
        assert!(json.contains("\"lower_bound\":100.0"));
        assert!(json.contains("\"upper_bound\":140.0"));
        assert!(json.contains("2024-05-01"));
    }
}
