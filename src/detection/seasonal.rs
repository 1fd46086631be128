//! Weekly seasonal pattern analysis.

use crate::core::SalesHistory;
use crate::error::{EngineError, Result};
use crate::utils::stats;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Per-weekday profile of the sales history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalProfile {
    /// Mean sales per weekday name (only weekdays present in the data).
    pub weekday_average: BTreeMap<String, f64>,
    /// Weekday with the highest mean.
    pub best_day: String,
    /// Weekday with the lowest mean.
    pub worst_day: String,
    /// Mean over configured weekend days (0 when none observed).
    pub weekend_average: f64,
    /// Mean over non-weekend days (0 when none observed).
    pub weekday_average_scalar: f64,
    /// Percent difference of weekend vs weekday average; 0 when the
    /// weekday average is 0.
    pub weekend_boost_pct: f64,
}

/// Groups history by weekday and derives the weekly profile.
#[derive(Debug, Clone)]
pub struct SeasonalAnalyzer {
    weekend_weekdays: Vec<u32>,
}

impl SeasonalAnalyzer {
    /// Create an analyzer with the configured weekend weekday indices
    /// (0 = Monday .. 6 = Sunday).
    pub fn new(weekend_weekdays: Vec<u32>) -> Self {
        Self { weekend_weekdays }
    }

    /// Compute the weekly profile. Best/worst ties resolve to the
    /// lowest weekday index.
    pub fn analyze(&self, history: &SalesHistory) -> Result<SeasonalProfile> {
        if history.len() < 2 {
            return Err(EngineError::InsufficientData {
                needed: 2,
                got: history.len(),
            });
        }

        let mut grouped: [Vec<f64>; 7] = Default::default();
        let mut weekend_values = Vec::new();
        let mut weekday_values = Vec::new();

        for record in history.records() {
            let index = record.date.weekday().num_days_from_monday();
            grouped[index as usize].push(record.total_sales);
            if self.weekend_weekdays.contains(&index) {
                weekend_values.push(record.total_sales);
            } else {
                weekday_values.push(record.total_sales);
            }
        }

        let mut weekday_average = BTreeMap::new();
        let mut best: Option<(usize, f64)> = None;
        let mut worst: Option<(usize, f64)> = None;

        for (index, values) in grouped.iter().enumerate() {
            if values.is_empty() {
                continue;
            }
            let mean = stats::mean(values);
            weekday_average.insert(WEEKDAY_NAMES[index].to_string(), mean);

            // Strict comparisons keep the lowest index on ties.
            if best.map(|(_, m)| mean > m).unwrap_or(true) {
                best = Some((index, mean));
            }
            if worst.map(|(_, m)| mean < m).unwrap_or(true) {
                worst = Some((index, mean));
            }
        }

        let (best_index, _) = best.ok_or(EngineError::EmptyData)?;
        let (worst_index, _) = worst.ok_or(EngineError::EmptyData)?;

        let weekend_average = if weekend_values.is_empty() {
            0.0
        } else {
            stats::mean(&weekend_values)
        };
        let weekday_average_scalar = if weekday_values.is_empty() {
            0.0
        } else {
            stats::mean(&weekday_values)
        };

        let weekend_boost_pct = if weekday_average_scalar == 0.0 {
            0.0
        } else {
            (weekend_average - weekday_average_scalar) / weekday_average_scalar * 100.0
        };

        Ok(SeasonalProfile {
            weekday_average,
            best_day: WEEKDAY_NAMES[best_index].to_string(),
            worst_day: WEEKDAY_NAMES[worst_index].to_string(),
            weekend_average,
            weekday_average_scalar,
            weekend_boost_pct,
        })
    }
}
