//! Daily sales history: the read-only input series.

use crate::error::{EngineError, Result};
use crate::utils::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of aggregated trading data, as delivered by the ingestion
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Trading day (unique, ascending key).
    pub date: NaiveDate,
    /// Total sales for the day.
    pub total_sales: f64,
    /// Number of orders.
    pub orders_count: f64,
    /// Number of items sold.
    pub items_sold: f64,
    /// Total expenses for the day.
    pub total_expenses: f64,
}

impl DailyRecord {
    /// Create a record with zeroed auxiliary metrics.
    pub fn sales_only(date: NaiveDate, total_sales: f64) -> Self {
        Self {
            date,
            total_sales,
            orders_count: 0.0,
            items_sold: 0.0,
            total_expenses: 0.0,
        }
    }
}

/// A validated, date-ascending sequence of daily records.
///
/// Gaps between dates are allowed; duplicates and out-of-order dates
/// are not. The history is loaded once per run and never mutated.
#[derive(Debug, Clone)]
pub struct SalesHistory {
    records: Vec<DailyRecord>,
}

impl SalesHistory {
    /// Build a history from records, validating the date invariant.
    pub fn new(records: Vec<DailyRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(EngineError::EmptyData);
        }
        for pair in records.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(EngineError::DateError(format!(
                    "dates must be strictly increasing: {} follows {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        for record in &records {
            if !record.total_sales.is_finite() {
                return Err(EngineError::DateError(format!(
                    "non-finite total_sales on {}",
                    record.date
                )));
            }
        }
        Ok(Self { records })
    }

    /// All records in date order.
    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    /// Number of days in the history.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history is empty (never true for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First recorded date.
    pub fn first_date(&self) -> NaiveDate {
        self.records[0].date
    }

    /// Last recorded date.
    pub fn last_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].date
    }

    /// Daily sales column.
    pub fn sales(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.total_sales).collect()
    }

    /// Daily order-count column.
    pub fn orders(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.orders_count).collect()
    }

    /// Daily items-sold column.
    pub fn items(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.items_sold).collect()
    }

    /// Daily expenses column.
    pub fn expenses(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.total_expenses).collect()
    }

    /// Mean of the sales column.
    pub fn mean_sales(&self) -> f64 {
        stats::mean(&self.sales())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_ascending_dates_with_gaps() {
        let history = SalesHistory::new(vec![
            DailyRecord::sales_only(day(2024, 3, 1), 100.0),
            DailyRecord::sales_only(day(2024, 3, 2), 110.0),
            // A gap: the 3rd is missing, and that is fine.
            DailyRecord::sales_only(day(2024, 3, 4), 120.0),
        ])
        .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history.first_date(), day(2024, 3, 1));
        assert_eq!(history.last_date(), day(2024, 3, 4));
        assert_eq!(history.sales(), vec![100.0, 110.0, 120.0]);
    }

    #[test]
    fn rejects_duplicates_and_disorder() {
        let duplicate = SalesHistory::new(vec![
            DailyRecord::sales_only(day(2024, 3, 1), 100.0),
            DailyRecord::sales_only(day(2024, 3, 1), 110.0),
        ]);
        assert!(matches!(duplicate, Err(EngineError::DateError(_))));

        let backwards = SalesHistory::new(vec![
            DailyRecord::sales_only(day(2024, 3, 2), 100.0),
            DailyRecord::sales_only(day(2024, 3, 1), 110.0),
        ]);
        assert!(backwards.is_err());
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(matches!(SalesHistory::new(vec![]), Err(EngineError::EmptyData)));

        let nan = SalesHistory::new(vec![DailyRecord::sales_only(day(2024, 3, 1), f64::NAN)]);
        assert!(nan.is_err());
    }

    #[test]
    fn mean_sales_over_columns() {
        let history = SalesHistory::new(vec![
            DailyRecord::sales_only(day(2024, 3, 1), 100.0),
            DailyRecord::sales_only(day(2024, 3, 2), 300.0),
        ])
        .unwrap();
        assert_eq!(history.mean_sales(), 200.0);
    }
}
