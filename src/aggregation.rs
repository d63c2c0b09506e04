use crate::error::{FinanceTrackerError, PipelineStage, Result};
use crate::schema::{CleanedRecord, MonthlyRow, YearMonth};
use crate::utils::round_to_cents;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sums per (month, category). A missing cell means the category had no
/// records that month, which is not the same as a zero total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    rows: BTreeMap<YearMonth, BTreeMap<String, f64>>,
    categories: BTreeSet<String>,
}

impl MonthlyAggregate {
    /// Months in ascending chronological order.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.rows.keys().copied()
    }

    /// Categories in lexicographic order.
    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.iter().map(String::as_str)
    }

    pub fn month_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn get(&self, month: YearMonth, category: &str) -> Option<f64> {
        self.rows.get(&month)?.get(category).copied()
    }

    /// Sum of every present cell in the month; `None` for an unknown month.
    pub fn month_total(&self, month: YearMonth) -> Option<f64> {
        self.rows
            .get(&month)
            .map(|cells| round_to_cents(cells.values().sum()))
    }

    /// Values of one category over the months where it is present.
    pub fn category_series(&self, category: &str) -> BTreeMap<YearMonth, f64> {
        self.rows
            .iter()
            .filter_map(|(month, cells)| cells.get(category).map(|v| (*month, *v)))
            .collect()
    }

    /// Mean monthly amount per category, averaging only the months where the
    /// category is present.
    pub fn category_means(&self) -> BTreeMap<String, f64> {
        self.categories
            .iter()
            .filter_map(|category| {
                let series = self.category_series(category);
                if series.is_empty() {
                    return None;
                }
                let mean = series.values().sum::<f64>() / series.len() as f64;
                Some((category.clone(), mean))
            })
            .collect()
    }

    /// Row view with an explicit `None` for absent cells.
    pub fn to_rows(&self) -> Vec<MonthlyRow> {
        self.rows
            .iter()
            .map(|(month, cells)| MonthlyRow {
                month: *month,
                values: self
                    .categories
                    .iter()
                    .map(|c| (c.clone(), cells.get(c).copied()))
                    .collect(),
            })
            .collect()
    }
}

/// Buckets cleaned records by calendar month and category.
pub struct MonthlyAggregator;

impl MonthlyAggregator {
    pub fn aggregate(records: &[CleanedRecord]) -> Result<MonthlyAggregate> {
        if records.is_empty() {
            return Err(FinanceTrackerError::EmptyDataset {
                stage: PipelineStage::Aggregation,
            });
        }

        let mut rows: BTreeMap<YearMonth, BTreeMap<String, f64>> = BTreeMap::new();
        let mut categories = BTreeSet::new();

        for record in records {
            *rows
                .entry(record.month())
                .or_default()
                .entry(record.category.clone())
                .or_insert(0.0) += record.amount;
            categories.insert(record.category.clone());
        }

        for cells in rows.values_mut() {
            for value in cells.values_mut() {
                *value = round_to_cents(*value);
            }
        }

        debug!(
            "Aggregated categories: {}",
            categories.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        info!(
            "Aggregated {} records into {} months x {} categories",
            records.len(),
            rows.len(),
            categories.len()
        );

        Ok(MonthlyAggregate { rows, categories })
    }
}
