//! Feature construction from the daily series.
//!
//! Every day maps to one feature vector: calendar fields, lagged
//! metric values, rolling means, and a short-span trend. The same
//! rules serve training (over observed days) and inference (over a
//! forecast buffer that may already contain predicted values).

use crate::config::{EngineConfig, LagFallback};
use crate::core::SalesHistory;
use crate::error::{EngineError, Result};
use crate::utils::stats;
use chrono::{Datelike, NaiveDate};

/// Ordered feature-name list shared by every vector a builder produces.
///
/// The ordering is a binding contract for persisted models: inference
/// must assemble values in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Feature names in vector order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a named feature, if produced.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Resolve a persisted name list to live column indices.
    ///
    /// Fails loudly on the first absent name; a missing feature must
    /// never be silently substituted with a default.
    pub fn project(&self, names: &[String]) -> Result<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.index_of(name)
                    .ok_or_else(|| EngineError::FeatureMismatch(name.clone()))
            })
            .collect()
    }
}

/// Feature values for one day, ordered per the builder's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// The day the features describe.
    pub date: NaiveDate,
    /// Feature values in schema order.
    pub values: Vec<f64>,
}

/// Derives feature vectors from daily aggregates.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    weekend_weekdays: Vec<u32>,
    lag_offsets: Vec<usize>,
    rolling_windows: Vec<usize>,
    trend_span: usize,
    lag_fallback: LagFallback,
    schema: FeatureSchema,
}

const LAGGED_METRICS: [&str; 3] = ["sales", "orders", "items"];

impl FeatureBuilder {
    /// Create a builder from the engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut names = vec![
            "day_of_week".to_string(),
            "day_of_month".to_string(),
            "month".to_string(),
            "is_weekend".to_string(),
        ];
        for &lag in &config.lag_offsets {
            for metric in LAGGED_METRICS {
                names.push(format!("{metric}_lag_{lag}"));
            }
        }
        for &window in &config.rolling_windows {
            for metric in LAGGED_METRICS {
                names.push(format!("{metric}_rolling_{window}"));
            }
        }
        names.push("sales_trend".to_string());

        Ok(Self {
            weekend_weekdays: config.weekend_weekdays.clone(),
            lag_offsets: config.lag_offsets.clone(),
            rolling_windows: config.rolling_windows.clone(),
            trend_span: config.trend_span,
            lag_fallback: config.lag_fallback,
            schema: FeatureSchema { names },
        })
    }

    /// The schema every vector from this builder follows.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Whether a weekday index (0 = Monday) falls in the configured
    /// weekend set.
    pub fn is_weekend_index(&self, weekday: u32) -> bool {
        self.weekend_weekdays.contains(&weekday)
    }

    /// Build one feature vector per record, in order.
    ///
    /// Early rows whose lagged day precedes the series use the
    /// configured fallback instead of being dropped, so short histories
    /// still produce a full matrix.
    pub fn build_all(&self, history: &SalesHistory) -> Vec<FeatureVector> {
        let sales = history.sales();
        let orders = history.orders();
        let items = history.items();
        let columns = [&sales[..], &orders[..], &items[..]];

        history
            .records()
            .iter()
            .enumerate()
            .map(|(i, record)| FeatureVector {
                date: record.date,
                values: self.assemble(record.date, &columns, i, Some(i)),
            })
            .collect()
    }

    /// Build the feature vector for the day following a forecast
    /// buffer. Lag and rolling inputs read the buffer tail, which may
    /// already contain predicted values.
    pub fn build_next(
        &self,
        date: NaiveDate,
        sales: &[f64],
        orders: &[f64],
        items: &[f64],
    ) -> FeatureVector {
        let columns = [sales, orders, items];
        let row = sales.len();
        FeatureVector {
            date,
            values: self.assemble(date, &columns, row, None),
        }
    }

    /// Assemble values for the row at position `row` of the virtual
    /// series. `observed` carries the row's own index when its value is
    /// part of the columns (training); `None` means the row is a future
    /// day (inference).
    fn assemble(
        &self,
        date: NaiveDate,
        columns: &[&[f64]; 3],
        row: usize,
        observed: Option<usize>,
    ) -> Vec<f64> {
        let weekday = date.weekday().num_days_from_monday();
        let mut values = Vec::with_capacity(self.schema.len());

        values.push(weekday as f64);
        values.push(date.day() as f64);
        values.push(date.month() as f64);
        values.push(if self.is_weekend_index(weekday) { 1.0 } else { 0.0 });

        for &lag in &self.lag_offsets {
            for column in columns {
                values.push(self.lag_value(column, row, lag));
            }
        }

        // Rolling means include the row's own value when it is
        // observed; a future day can only average what the buffer holds.
        let window_end = observed.map(|i| i + 1).unwrap_or(columns[0].len());
        for &window in &self.rolling_windows {
            for column in columns {
                values.push(tail_mean(&column[..window_end], window));
            }
        }

        values.push(self.trend_value(columns[0], row, observed));

        values
    }

    fn lag_value(&self, column: &[f64], row: usize, lag: usize) -> f64 {
        if row >= lag {
            column[row - lag]
        } else {
            self.fallback_value(column)
        }
    }

    fn fallback_value(&self, column: &[f64]) -> f64 {
        match self.lag_fallback {
            LagFallback::HistoricalMean => stats::mean(column),
            LagFallback::EarliestValue => column.first().copied().unwrap_or(f64::NAN),
        }
    }

    /// Percent change of sales over `trend_span` days; 0 when the base
    /// day is absent or zero.
    fn trend_value(&self, sales: &[f64], row: usize, observed: Option<usize>) -> f64 {
        let span = self.trend_span;
        let (current_idx, base_idx) = match observed {
            Some(i) => (i, i.checked_sub(span)),
            // For a future day, the most recent computable trend comes
            // from the last buffered value.
            None => match row.checked_sub(1) {
                Some(last) => (last, last.checked_sub(span)),
                None => return 0.0,
            },
        };
        match base_idx {
            Some(base) if sales[base] != 0.0 => (sales[current_idx] - sales[base]) / sales[base],
            _ => 0.0,
        }
    }
}

/// Mean of the trailing `window` values (all of them when fewer exist).
fn tail_mean(values: &[f64], window: usize) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let take = window.min(values.len());
    stats::mean(&values[values.len() - take..])
}
