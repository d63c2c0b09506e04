use crate::aggregation::MonthlyAggregate;
use crate::ratios::{RatioSeries, RatioSummary};
use crate::schema::{MonthlyRow, SeriesPoint, YearMonth};
use crate::DiagnosticSummary;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    #[schemars(description = "Line chart of summed amounts per category and month")]
    MonthlyTrends,
    #[schemars(description = "Pie chart of the mean monthly amount per category")]
    ExpenseBreakdown,
    #[schemars(description = "Line chart of the monthly savings rate")]
    SavingsRate,
    #[schemars(description = "Line chart of each category's share of the monthly total")]
    ExpenseRatios,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Trace {
    pub name: String,
    pub panel: Panel,

    #[schemars(description = "One point per month of the report; value is null where the series is undefined")]
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BreakdownSlice {
    pub category: String,

    #[schemars(description = "Mean monthly amount over the months where the category is present")]
    pub mean_amount: f64,

    #[schemars(description = "Share (%) of the summed category means; null when that sum is zero")]
    pub share_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryFilter {
    pub label: String,

    #[schemars(description = "Visibility per trace, in the order: monthly_trends, savings_rate (if present), expense_ratios")]
    pub visible: Vec<bool>,
}

/// Everything the charting collaborator needs to draw the static charts and
/// the interactive dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportPayload {
    pub title: String,
    pub months: Vec<YearMonth>,
    pub categories: Vec<String>,
    pub monthly_aggregate: Vec<MonthlyRow>,
    pub monthly_trends: Vec<Trace>,
    pub expense_breakdown: Vec<BreakdownSlice>,
    pub savings_rate: Option<Trace>,
    pub expense_ratios: Vec<Trace>,
    pub summary: RatioSummary,
    pub diagnostics: DiagnosticSummary,
    pub filters: Vec<CategoryFilter>,
}

impl ReportPayload {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportPayload)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn trace_count(&self) -> usize {
        self.monthly_trends.len() + usize::from(self.savings_rate.is_some()) + self.expense_ratios.len()
    }
}

pub struct ReportAssembler<'a> {
    title: &'a str,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(title: &'a str) -> Self {
        Self { title }
    }

    pub fn assemble(
        &self,
        aggregate: &MonthlyAggregate,
        ratios: &RatioSeries,
        summary: &RatioSummary,
        diagnostics: &DiagnosticSummary,
    ) -> ReportPayload {
        let months: Vec<YearMonth> = aggregate.months().collect();

        let monthly_trends: Vec<Trace> = aggregate
            .categories()
            .map(|category| Trace {
                name: category.to_string(),
                panel: Panel::MonthlyTrends,
                points: full_index(&months, &aggregate.category_series(category)),
            })
            .filter(has_data)
            .collect();

        let savings_rate = Some(Trace {
            name: "Savings Rate (%)".to_string(),
            panel: Panel::SavingsRate,
            points: full_index(&months, &ratios.savings_rate),
        })
        .filter(has_data);

        let expense_ratios: Vec<Trace> = ratios
            .expense_ratios
            .iter()
            .map(|(category, series)| Trace {
                name: format!("{} Ratio (%)", category),
                panel: Panel::ExpenseRatios,
                points: full_index(&months, series),
            })
            .filter(has_data)
            .collect();

        let filters = category_filters(
            &monthly_trends,
            savings_rate.is_some(),
            expense_ratios.len(),
        );

        ReportPayload {
            title: self.title.to_string(),
            categories: aggregate.categories().map(str::to_string).collect(),
            monthly_aggregate: aggregate.to_rows(),
            expense_breakdown: expense_breakdown(aggregate),
            months,
            monthly_trends,
            savings_rate,
            expense_ratios,
            summary: summary.clone(),
            diagnostics: diagnostics.clone(),
            filters,
        }
    }
}

fn has_data(trace: &Trace) -> bool {
    trace.points.iter().any(|p| p.value.is_some())
}

fn full_index(months: &[YearMonth], series: &BTreeMap<YearMonth, f64>) -> Vec<SeriesPoint> {
    months
        .iter()
        .map(|month| SeriesPoint {
            month: *month,
            value: series.get(month).copied(),
        })
        .collect()
}

fn expense_breakdown(aggregate: &MonthlyAggregate) -> Vec<BreakdownSlice> {
    let means = aggregate.category_means();
    let total: f64 = means.values().sum();

    means
        .into_iter()
        .map(|(category, mean_amount)| BreakdownSlice {
            share_percent: if total == 0.0 {
                None
            } else {
                Some(mean_amount / total * 100.0)
            },
            category,
            mean_amount,
        })
        .collect()
}

/// "All Categories" shows every trace; each per-category option shows that
/// category's trend alongside the savings and ratio panels.
fn category_filters(trends: &[Trace], has_savings: bool, ratio_count: usize) -> Vec<CategoryFilter> {
    let tail: Vec<bool> = vec![true; usize::from(has_savings) + ratio_count];

    let mut filters = vec![CategoryFilter {
        label: "All Categories".to_string(),
        visible: vec![true; trends.len() + tail.len()],
    }];

    for (idx, trace) in trends.iter().enumerate() {
        let mut visible: Vec<bool> = (0..trends.len()).map(|i| i == idx).collect();
        visible.extend_from_slice(&tail);
        filters.push(CategoryFilter {
            label: trace.name.clone(),
            visible,
        });
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::MonthlyAggregator;
    use crate::ratios::RatioEngine;
    use crate::schema::{AmountOrigin, CleanedRecord};
    use chrono::NaiveDate;

    fn record(m: u32, category: &str, amount: f64) -> CleanedRecord {
        CleanedRecord {
            date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
            category: category.to_string(),
            amount,
            origin: AmountOrigin::Recorded,
            description: None,
        }
    }

    fn payload(records: &[CleanedRecord]) -> ReportPayload {
        let aggregate = MonthlyAggregator::aggregate(records).unwrap();
        let series = RatioEngine::new("Salary", "Savings").derive(&aggregate);
        let summary = RatioEngine::summarize(&series);
        ReportAssembler::new("Test Dashboard").assemble(
            &aggregate,
            &series,
            &summary,
            &DiagnosticSummary::default(),
        )
    }

    #[test]
    fn test_series_cover_full_month_index() {
        let report = payload(&[
            record(1, "Salary", 4000.0),
            record(1, "Rent", 1200.0),
            record(2, "Salary", 4000.0),
            record(2, "Savings", 800.0),
        ]);

        assert_eq!(report.months.len(), 2);
        let savings = report.savings_rate.as_ref().unwrap();
        assert_eq!(savings.points[0].value, None);
        assert_eq!(savings.points[1].value, Some(20.0));

        let rent = report
            .monthly_trends
            .iter()
            .find(|t| t.name == "Rent")
            .unwrap();
        assert_eq!(rent.points[1].value, None);
    }

    #[test]
    fn test_traces_without_data_are_omitted() {
        let report = payload(&[record(1, "Rent", 1200.0), record(1, "Salary", 4000.0)]);
        assert!(report.savings_rate.is_none());
        assert_eq!(report.expense_ratios.len(), 1);
        assert_eq!(report.expense_ratios[0].name, "Rent Ratio (%)");
    }

    #[test]
    fn test_breakdown_shares_sum_to_100() {
        let report = payload(&[
            record(1, "Salary", 3000.0),
            record(1, "Rent", 1000.0),
            record(2, "Salary", 3000.0),
        ]);
        let total: f64 = report
            .expense_breakdown
            .iter()
            .filter_map(|s| s.share_percent)
            .sum();
        assert!((total - 100.0).abs() < 1e-9);

        let rent = report
            .expense_breakdown
            .iter()
            .find(|s| s.category == "Rent")
            .unwrap();
        assert_eq!(rent.mean_amount, 1000.0);
        assert_eq!(rent.share_percent, Some(25.0));
    }

    #[test]
    fn test_filter_masks_match_trace_count() {
        let report = payload(&[
            record(1, "Salary", 4000.0),
            record(1, "Savings", 400.0),
            record(1, "Rent", 1000.0),
        ]);

        assert_eq!(report.filters.len(), 1 + report.monthly_trends.len());
        for filter in &report.filters {
            assert_eq!(filter.visible.len(), report.trace_count());
        }

        let rent_filter = report.filters.iter().find(|f| f.label == "Rent").unwrap();
        let trends = report.monthly_trends.len();
        assert_eq!(rent_filter.visible[..trends].iter().filter(|v| **v).count(), 1);
        assert!(rent_filter.visible[trends..].iter().all(|v| *v));
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ReportPayload::schema_as_json().unwrap();
        assert!(schema_json.contains("monthly_aggregate"));
        assert!(schema_json.contains("savings_rate"));
        assert!(schema_json.contains("diagnostics"));
    }

    #[test]
    fn test_payload_serializes_nulls_for_excluded_months() {
        let report = payload(&[
            record(1, "Salary", 4000.0),
            record(2, "Salary", 4000.0),
            record(2, "Savings", 800.0),
        ]);
        let json = serde_json::to_value(&report).unwrap();
        let points = &json["savings_rate"]["points"];
        assert_eq!(points[0]["month"], "2024-01");
        assert!(points[0]["value"].is_null());
        assert_eq!(points[1]["value"], 20.0);
    }
}
