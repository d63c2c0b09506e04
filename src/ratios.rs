use crate::aggregation::MonthlyAggregate;
use crate::schema::YearMonth;
use crate::utils::mean;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a ratio has no value for a month. Resolved by leaving the month out of
/// the series; never returned to callers of the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatioUndefined {
    #[error("numerator category '{0}' has no value")]
    MissingNumerator(String),

    #[error("denominator '{0}' has no value")]
    MissingDenominator(String),

    #[error("denominator '{0}' is zero")]
    ZeroDenominator(String),
}

/// Percentage of `numerator` over `denominator`.
pub fn percentage(
    numerator: (&str, Option<f64>),
    denominator: (&str, Option<f64>),
) -> std::result::Result<f64, RatioUndefined> {
    let num = numerator
        .1
        .ok_or_else(|| RatioUndefined::MissingNumerator(numerator.0.to_string()))?;
    let den = denominator
        .1
        .ok_or_else(|| RatioUndefined::MissingDenominator(denominator.0.to_string()))?;

    if den == 0.0 {
        return Err(RatioUndefined::ZeroDenominator(denominator.0.to_string()));
    }

    Ok(num / den * 100.0)
}

/// Month-indexed ratio series. Months where a ratio is undefined are absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatioSeries {
    pub savings_rate: BTreeMap<YearMonth, f64>,
    /// Keyed by category, then month.
    pub expense_ratios: BTreeMap<String, BTreeMap<YearMonth, f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct RatioSummary {
    #[schemars(description = "Mean savings rate (%) over the months where it is defined; null when never defined")]
    pub mean_savings_rate: Option<f64>,

    #[schemars(description = "Mean expense ratio (%) per category over the months where it is defined")]
    pub mean_expense_ratios: BTreeMap<String, f64>,
}

/// Derives the savings rate and expense ratios from a monthly aggregate.
pub struct RatioEngine {
    income_category: String,
    savings_category: String,
}

impl RatioEngine {
    pub fn new(income_category: impl Into<String>, savings_category: impl Into<String>) -> Self {
        Self {
            income_category: income_category.into(),
            savings_category: savings_category.into(),
        }
    }

    pub fn derive(&self, aggregate: &MonthlyAggregate) -> RatioSeries {
        let series = RatioSeries {
            savings_rate: self.savings_rate(aggregate),
            expense_ratios: self.expense_ratios(aggregate),
        };

        info!(
            "Savings rate defined for {} of {} months; expense ratios for {} categories",
            series.savings_rate.len(),
            aggregate.month_count(),
            series.expense_ratios.len()
        );

        series
    }

    /// `savings / income * 100` for each month where both are present and
    /// income is non-zero.
    pub fn savings_rate(&self, aggregate: &MonthlyAggregate) -> BTreeMap<YearMonth, f64> {
        let mut rates = BTreeMap::new();

        for month in aggregate.months() {
            let savings = aggregate.get(month, &self.savings_category);
            let income = aggregate.get(month, &self.income_category);

            match percentage(
                (&self.savings_category, savings),
                (&self.income_category, income),
            ) {
                Ok(rate) => {
                    rates.insert(month, rate);
                }
                Err(reason) => debug!("Savings rate undefined for {}: {}", month, reason),
            }
        }

        rates
    }

    /// Each non-income category's share of the month's total across all
    /// categories (income and savings included).
    pub fn expense_ratios(
        &self,
        aggregate: &MonthlyAggregate,
    ) -> BTreeMap<String, BTreeMap<YearMonth, f64>> {
        let mut ratios: BTreeMap<String, BTreeMap<YearMonth, f64>> = BTreeMap::new();

        for category in aggregate
            .categories()
            .filter(|c| *c != self.income_category)
        {
            let mut series = BTreeMap::new();
            for month in aggregate.months() {
                match percentage(
                    (category, aggregate.get(month, category)),
                    ("monthly total", aggregate.month_total(month)),
                ) {
                    Ok(ratio) => {
                        series.insert(month, ratio);
                    }
                    Err(reason) => {
                        debug!("{} ratio undefined for {}: {}", category, month, reason)
                    }
                }
            }
            ratios.insert(category.to_string(), series);
        }

        ratios
    }

    pub fn summarize(series: &RatioSeries) -> RatioSummary {
        let savings: Vec<f64> = series.savings_rate.values().copied().collect();

        RatioSummary {
            mean_savings_rate: mean(&savings),
            mean_expense_ratios: series
                .expense_ratios
                .iter()
                .filter_map(|(category, by_month)| {
                    let values: Vec<f64> = by_month.values().copied().collect();
                    mean(&values).map(|m| (category.clone(), m))
                })
                .collect(),
        }
    }
}
