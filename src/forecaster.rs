//! Recursive multi-day forecasting.

use crate::core::{ForecastPoint, SalesForecast, SalesHistory};
use crate::error::Result;
use crate::features::FeatureBuilder;
use crate::models::Backend;
use crate::utils::stats;
use chrono::Duration;

/// Drives H-step-ahead forecasting one day at a time.
///
/// The forecaster works on a private copy of the history columns.
/// Each predicted day is appended to that buffer before the next
/// day's features are built, so step i's lag_1 is step i-1's
/// prediction. The canonical history is never touched, which keeps
/// concurrent forecast calls over the same dataset independent.
pub struct RecursiveForecaster {
    builder: FeatureBuilder,
}

impl RecursiveForecaster {
    /// Create a forecaster using the given feature rules.
    pub fn new(builder: FeatureBuilder) -> Self {
        Self { builder }
    }

    /// Forecast `horizon` days past the end of `history`.
    ///
    /// A failing backend prediction falls back to the running mean of
    /// the buffer for that step and the loop continues; predictions
    /// are clamped at zero since sales cannot be negative.
    pub fn forecast(
        &self,
        history: &SalesHistory,
        horizon: usize,
        backend: &dyn Backend,
    ) -> Result<SalesForecast> {
        let mut sales = history.sales();
        let mut orders = history.orders();
        let mut items = history.items();

        // Auxiliary metrics are unknown for future days; the buffer
        // holds them at their historical means so lag and rolling
        // features stay defined.
        let mean_orders = stats::mean(&orders);
        let mean_items = stats::mean(&items);

        let mut date = history.last_date();
        let mut points = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            date = date + Duration::days(1);
            let vector = self.builder.build_next(date, &sales, &orders, &items);

            let predicted = match backend.predict(&vector.values) {
                Ok(value) => value.max(0.0),
                Err(err) => {
                    let fallback = stats::mean(&sales).max(0.0);
                    log::warn!(
                        "backend {} failed on {date}: {err}; using running mean {fallback:.3}",
                        backend.id()
                    );
                    fallback
                }
            };

            points.push(ForecastPoint::point(date, predicted));
            sales.push(predicted);
            orders.push(mean_orders);
            items.push(mean_items);
        }

        Ok(SalesForecast::new(points))
    }
}
