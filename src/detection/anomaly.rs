//! Z-score anomaly detection over the sales history.

use crate::core::SalesHistory;
use crate::error::{EngineError, Result};
use crate::utils::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum history length for meaningful anomaly statistics.
const MIN_RECORDS: usize = 5;

/// Direction of a flagged deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyDirection {
    /// Value far above the mean.
    Spike,
    /// Value far below the mean.
    Drop,
}

/// A historical day whose sales deviate beyond the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// The anomalous day.
    pub date: NaiveDate,
    /// Observed sales value.
    pub value: f64,
    /// Deviation in standard-deviation units.
    pub z_score: f64,
    /// Spike or drop.
    pub direction: AnomalyDirection,
}

/// Flags days whose value deviates from the series mean by more than
/// a threshold in standard-deviation units.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl AnomalyDetector {
    /// Create a detector with the given z-score threshold.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Scan the full history for anomalous days.
    ///
    /// Statistics are population mean and standard deviation over the
    /// whole series, not a window. A zero-variance series has no
    /// anomalies by definition and returns an empty list.
    pub fn detect(&self, history: &SalesHistory) -> Result<Vec<AnomalyRecord>> {
        if history.len() < MIN_RECORDS {
            return Err(EngineError::InsufficientData {
                needed: MIN_RECORDS,
                got: history.len(),
            });
        }

        let sales = history.sales();
        let mean = stats::mean(&sales);
        let std = stats::population_std(&sales);

        if std == 0.0 {
            return Ok(Vec::new());
        }

        Ok(history
            .records()
            .iter()
            .filter_map(|record| {
                let z = (record.total_sales - mean) / std;
                if z.abs() > self.threshold {
                    Some(AnomalyRecord {
                        date: record.date,
                        value: record.total_sales,
                        z_score: z,
                        direction: if z > 0.0 {
                            AnomalyDirection::Spike
                        } else {
                            AnomalyDirection::Drop
                        },
                    })
                } else {
                    None
                }
            })
            .collect())
    }
}
