//! Rule-based business recommendations.
//!
//! A fixed, ordered rule table maps analytic outputs to recommendation
//! records. The mapping is a pure function: identical inputs always
//! produce the identical ordered list.

use crate::core::SalesHistory;
use crate::detection::SeasonalProfile;
use crate::utils::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
    Info,
}

/// What a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    HighWeekendDemand,
    WeakWeekend,
    HighlightBestDay,
    StockTopProduct,
    GrowthTrend,
    DeclineTrend,
    LowMargin,
    HighMargin,
    InsufficientSignal,
}

impl RecommendationKind {
    /// Stable key used for message lookup at the rendering boundary.
    pub fn message_key(&self) -> &'static str {
        match self {
            RecommendationKind::HighWeekendDemand => "recommendation.high_weekend_demand",
            RecommendationKind::WeakWeekend => "recommendation.weak_weekend",
            RecommendationKind::HighlightBestDay => "recommendation.highlight_best_day",
            RecommendationKind::StockTopProduct => "recommendation.stock_top_product",
            RecommendationKind::GrowthTrend => "recommendation.growth_trend",
            RecommendationKind::DeclineTrend => "recommendation.decline_trend",
            RecommendationKind::LowMargin => "recommendation.low_margin",
            RecommendationKind::HighMargin => "recommendation.high_margin",
            RecommendationKind::InsufficientSignal => "recommendation.insufficient_signal",
        }
    }
}

/// One recommendation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Rule that fired.
    pub kind: RecommendationKind,
    /// Priority of the recommendation.
    pub priority: Priority,
    /// Message key for the rendering boundary.
    pub message_key: String,
    /// Named parameters interpolated into the rendered message.
    pub message_params: BTreeMap<String, String>,
}

impl Recommendation {
    fn new(kind: RecommendationKind, priority: Priority) -> Self {
        Self {
            kind,
            priority,
            message_key: kind.message_key().to_string(),
            message_params: BTreeMap::new(),
        }
    }

    fn with_param(mut self, key: &str, value: String) -> Self {
        self.message_params.insert(key.to_string(), value);
        self
    }
}

/// Externally supplied product analytics for the stocking rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    /// Product name.
    pub name: String,
    /// Units sold over the analyzed period.
    pub units_sold: u64,
    /// Revenue over the analyzed period.
    pub revenue: f64,
}

/// Inputs to the recommendation rules. Absent inputs simply keep the
/// corresponding rules from firing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationInput<'a> {
    /// Weekly seasonal profile.
    pub seasonal: Option<&'a SeasonalProfile>,
    /// Recent-vs-prior-window sales trend, in percent.
    pub trend_pct: Option<f64>,
    /// Profit margin, in percent.
    pub margin_pct: Option<f64>,
    /// Best-selling product, if product analytics are available.
    pub top_product: Option<&'a TopProduct>,
}

/// Evaluates the fixed rule table.
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Run every rule in table order; each may append at most one
    /// recommendation. An empty outcome is replaced by the single
    /// default "insufficient signal" record.
    pub fn generate(input: &RecommendationInput<'_>) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if let Some(seasonal) = input.seasonal {
            let boost = seasonal.weekend_boost_pct;
            if boost > 20.0 {
                out.push(
                    Recommendation::new(RecommendationKind::HighWeekendDemand, Priority::High)
                        .with_param("boost_pct", format!("{boost:.1}")),
                );
            } else if boost < -10.0 {
                out.push(
                    Recommendation::new(RecommendationKind::WeakWeekend, Priority::Medium)
                        .with_param("boost_pct", format!("{boost:.1}")),
                );
            }

            out.push(
                Recommendation::new(RecommendationKind::HighlightBestDay, Priority::Info)
                    .with_param("best_day", seasonal.best_day.clone()),
            );
        }

        if let Some(product) = input.top_product {
            out.push(
                Recommendation::new(RecommendationKind::StockTopProduct, Priority::Info)
                    .with_param("product", product.name.clone())
                    .with_param("units_sold", product.units_sold.to_string()),
            );
        }

        if let Some(trend) = input.trend_pct {
            if trend > 10.0 {
                out.push(
                    Recommendation::new(RecommendationKind::GrowthTrend, Priority::Info)
                        .with_param("trend_pct", format!("{trend:.1}")),
                );
            } else if trend < -10.0 {
                out.push(
                    Recommendation::new(RecommendationKind::DeclineTrend, Priority::Medium)
                        .with_param("trend_pct", format!("{trend:.1}")),
                );
            }
        }

        if let Some(margin) = input.margin_pct {
            if margin < 30.0 {
                out.push(
                    Recommendation::new(RecommendationKind::LowMargin, Priority::Medium)
                        .with_param("margin_pct", format!("{margin:.1}")),
                );
            } else if margin > 50.0 {
                out.push(
                    Recommendation::new(RecommendationKind::HighMargin, Priority::Info)
                        .with_param("margin_pct", format!("{margin:.1}")),
                );
            }
        }

        if out.is_empty() {
            out.push(Recommendation::new(
                RecommendationKind::InsufficientSignal,
                Priority::Info,
            ));
        }

        out
    }
}

/// Percent change of the trailing `window`-day mean versus the leading
/// `window`-day mean. Needs at least two full windows; a non-positive
/// prior mean gives no trend.
pub fn recent_trend_pct(history: &SalesHistory, window: usize) -> Option<f64> {
    let sales = history.sales();
    if window == 0 || sales.len() < 2 * window {
        return None;
    }
    let recent = stats::mean(&sales[sales.len() - window..]);
    let prior = stats::mean(&sales[..window]);
    if prior <= 0.0 {
        return None;
    }
    Some((recent - prior) / prior * 100.0)
}

/// Profit margin of the history in percent:
/// (mean sales - mean expenses) / mean sales. None when mean sales is
/// not positive.
pub fn margin_pct(history: &SalesHistory) -> Option<f64> {
    let mean_sales = stats::mean(&history.sales());
    if !(mean_sales > 0.0) {
        return None;
    }
    let mean_expenses = stats::mean(&history.expenses());
    Some((mean_sales - mean_expenses) / mean_sales * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DailyRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn profile(boost: f64) -> SeasonalProfile {
        SeasonalProfile {
            weekday_average: BTreeMap::new(),
            best_day: "Saturday".to_string(),
            worst_day: "Tuesday".to_string(),
            weekend_average: 0.0,
            weekday_average_scalar: 0.0,
            weekend_boost_pct: boost,
        }
    }

    fn top_product() -> TopProduct {
        TopProduct {
            name: "Espresso".to_string(),
            units_sold: 320,
            revenue: 960.0,
        }
    }

    #[test]
    fn strong_weekend_fires_high_priority_rule_first() {
        let profile = profile(35.0);
        let input = RecommendationInput {
            seasonal: Some(&profile),
            ..Default::default()
        };
        let recommendations = RecommendationEngine::generate(&input);

        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0].kind, RecommendationKind::HighWeekendDemand);
        assert_eq!(recommendations[0].priority, Priority::High);
        assert_eq!(recommendations[0].message_params["boost_pct"], "35.0");
        assert_eq!(recommendations[1].kind, RecommendationKind::HighlightBestDay);
        assert_eq!(recommendations[1].message_params["best_day"], "Saturday");
    }

    #[test]
    fn weak_weekend_is_medium_priority() {
        let profile = profile(-25.0);
        let input = RecommendationInput {
            seasonal: Some(&profile),
            ..Default::default()
        };
        let recommendations = RecommendationEngine::generate(&input);
        assert_eq!(recommendations[0].kind, RecommendationKind::WeakWeekend);
        assert_eq!(recommendations[0].priority, Priority::Medium);
    }

    #[test]
    fn full_input_follows_table_order() {
        let profile = profile(30.0);
        let product = top_product();
        let input = RecommendationInput {
            seasonal: Some(&profile),
            trend_pct: Some(-15.0),
            margin_pct: Some(60.0),
            top_product: Some(&product),
        };
        let kinds: Vec<RecommendationKind> = RecommendationEngine::generate(&input)
            .iter()
            .map(|r| r.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                RecommendationKind::HighWeekendDemand,
                RecommendationKind::HighlightBestDay,
                RecommendationKind::StockTopProduct,
                RecommendationKind::DeclineTrend,
                RecommendationKind::HighMargin,
            ]
        );
    }

    #[test]
    fn no_signal_yields_single_default() {
        let recommendations = RecommendationEngine::generate(&RecommendationInput::default());
        assert_eq!(recommendations.len(), 1);
        assert_eq!(
            recommendations[0].kind,
            RecommendationKind::InsufficientSignal
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let profile = profile(22.0);
        let product = top_product();
        let input = RecommendationInput {
            seasonal: Some(&profile),
            trend_pct: Some(12.0),
            margin_pct: Some(25.0),
            top_product: Some(&product),
        };

        let first = RecommendationEngine::generate(&input);
        let second = RecommendationEngine::generate(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn neutral_metrics_fire_no_trend_or_margin_rules() {
        let input = RecommendationInput {
            trend_pct: Some(5.0),
            margin_pct: Some(40.0),
            ..Default::default()
        };
        let recommendations = RecommendationEngine::generate(&input);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(
            recommendations[0].kind,
            RecommendationKind::InsufficientSignal
        );
    }

    fn history(sales_and_expenses: &[(f64, f64)]) -> SalesHistory {
        let records = sales_and_expenses
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| DailyRecord {
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + i as u32).unwrap(),
                total_sales: s,
                orders_count: 0.0,
                items_sold: 0.0,
                total_expenses: e,
            })
            .collect();
        SalesHistory::new(records).unwrap()
    }

    #[test]
    fn trend_compares_trailing_and_leading_windows() {
        // First week at 100, second week at 150: +50%.
        let data: Vec<(f64, f64)> = (0..14)
            .map(|i| (if i < 7 { 100.0 } else { 150.0 }, 0.0))
            .collect();
        let history = history(&data);
        assert_relative_eq!(
            recent_trend_pct(&history, 7).unwrap(),
            50.0,
            epsilon = 1e-9
        );

        // Too short for two windows.
        let short = self::history(&[(100.0, 0.0); 10]);
        assert!(recent_trend_pct(&short, 7).is_none());
    }

    #[test]
    fn margin_uses_mean_sales_and_expenses() {
        let history = history(&[(100.0, 60.0), (200.0, 120.0)]);
        assert_relative_eq!(margin_pct(&history).unwrap(), 40.0, epsilon = 1e-9);

        let zero_sales = self::history(&[(0.0, 10.0), (0.0, 5.0)]);
        assert!(margin_pct(&zero_sales).is_none());
    }
}
