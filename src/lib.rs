//! # Finance Tracker
//!
//! A library for turning a flat, messy personal transaction log into monthly
//! aggregates and the ratios derived from them.
//!
//! ## Core Concepts
//!
//! - **Cleaning**: dates are parsed strictly, categories are title-cased,
//!   missing amounts are imputed with the batch mean and amounts far from the
//!   mean are dropped as outliers
//! - **Monthly Aggregate**: sums per (calendar month, category), where a
//!   category with no records in a month has no value rather than a zero
//! - **Ratios**: savings rate (`Savings / Salary * 100`) and each category's
//!   share of the month's total; months where a ratio is undefined are left out
//! - **Report Payload**: a serializable view model for an external charting tool
//!
//! ## Example
//!
//! ```rust,ignore
//! use finance_tracker::*;
//!
//! let records = vec![
//!     TransactionRecord::new("2024-01-15", "Salary", Some(4000.0)),
//!     TransactionRecord::new("2024-01-20", "rent ", Some(1200.0)),
//!     TransactionRecord::new("2024-02-10", "Salary", Some(4000.0)),
//!     TransactionRecord::new("2024-02-12", "Savings", Some(800.0)),
//! ];
//!
//! let output = analyze_transactions(&records, &PipelineConfig::default()).unwrap();
//! assert_eq!(output.ratios.savings_rate.len(), 1);
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod ingestion;
pub mod normalizer;
pub mod outliers;
pub mod ratios;
pub mod report;
pub mod schema;
pub mod statistics;
pub mod utils;

pub use aggregation::{MonthlyAggregate, MonthlyAggregator};
pub use config::{OutlierMethod, PipelineConfig};
pub use error::{FinanceTrackerError, PipelineStage, Result};
pub use export::{write_aggregate_csv, write_cleaned_csv, write_report_json};
pub use generator::{generate_transactions, write_transactions_csv};
pub use ingestion::{read_transactions, read_transactions_from_reader};
pub use normalizer::{NormalizationOutcome, RecordNormalizer, RejectedRow, RejectionReason};
pub use outliers::{FilterOutcome, OutlierFilter};
pub use ratios::{RatioEngine, RatioSeries, RatioSummary, RatioUndefined};
pub use report::{ReportAssembler, ReportPayload};
pub use schema::*;
pub use statistics::AmountStatistics;

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Row counts describing every data-quality decision taken during cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticSummary {
    pub input_rows: usize,
    #[schemars(description = "Rows dropped because the date could not be parsed")]
    pub dropped_invalid_dates: usize,
    #[schemars(description = "Rows dropped because the category was empty")]
    pub dropped_empty_categories: usize,
    #[schemars(description = "Rows dropped because the amount was missing and nothing could be imputed")]
    pub dropped_unimputable_amounts: usize,
    #[schemars(description = "Rows whose missing amount was replaced by the batch mean")]
    pub imputed_amounts: usize,
    #[schemars(description = "Rows removed by the outlier filter")]
    pub removed_outliers: usize,
    pub cleaned_rows: usize,
}

impl DiagnosticSummary {
    fn from_outcomes(
        input_rows: usize,
        normalized: &NormalizationOutcome,
        filtered: &FilterOutcome,
    ) -> Self {
        Self {
            input_rows,
            dropped_invalid_dates: normalized
                .count_rejected(|r| matches!(r, RejectionReason::UnparseableDate(_))),
            dropped_empty_categories: normalized
                .count_rejected(|r| *r == RejectionReason::EmptyCategory),
            dropped_unimputable_amounts: normalized
                .count_rejected(|r| *r == RejectionReason::UnimputableAmount),
            imputed_amounts: normalized.imputed,
            removed_outliers: filtered.removed.len(),
            cleaned_rows: filtered.retained.len(),
        }
    }
}

/// Output of the cleaning stages alone.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub records: Vec<CleanedRecord>,
    pub rejected: Vec<RejectedRow>,
    pub diagnostics: DiagnosticSummary,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub cleaned: Vec<CleanedRecord>,
    pub aggregate: MonthlyAggregate,
    pub ratios: RatioSeries,
    pub summary: RatioSummary,
    pub diagnostics: DiagnosticSummary,
}

impl AnalysisOutput {
    pub fn report(&self, config: &PipelineConfig) -> ReportPayload {
        ReportAssembler::new(&config.dashboard_title).assemble(
            &self.aggregate,
            &self.ratios,
            &self.summary,
            &self.diagnostics,
        )
    }
}

pub struct FinanceTracker;

impl FinanceTracker {
    /// Normalization followed by outlier filtering.
    ///
    /// Statistics are computed once per stage input and passed down, so both
    /// stages are pure functions of their arguments. Fails with
    /// [`FinanceTrackerError::EmptyDataset`] naming the first stage that is
    /// left without rows.
    pub fn clean(records: &[TransactionRecord], config: &PipelineConfig) -> Result<CleanedDataset> {
        config.validate()?;
        ensure_rows(records.len(), PipelineStage::Ingestion)?;

        let raw_stats = AmountStatistics::of_present_amounts(records);
        debug!(
            "Present amounts: {} (mean {:?})",
            raw_stats.count,
            raw_stats.mean()
        );

        let mut normalized = RecordNormalizer::new(config).normalize(records, &raw_stats);
        ensure_rows(normalized.records.len(), PipelineStage::Normalization)?;

        let normalized_stats = AmountStatistics::of_records(&normalized.records);
        debug!(
            "Normalized amounts: mean {:.2}, std dev {:.2}",
            normalized_stats.mean,
            normalized_stats.std_dev()
        );

        let filter = OutlierFilter::new(config.outlier_threshold, config.outlier_method)?;
        let filtered = filter.filter(std::mem::take(&mut normalized.records), &normalized_stats);
        ensure_rows(filtered.retained.len(), PipelineStage::OutlierFiltering)?;

        let diagnostics = DiagnosticSummary::from_outcomes(records.len(), &normalized, &filtered);

        Ok(CleanedDataset {
            records: filtered.retained,
            rejected: normalized.rejected,
            diagnostics,
        })
    }

    pub fn process(records: &[TransactionRecord], config: &PipelineConfig) -> Result<AnalysisOutput> {
        let cleaned = Self::clean(records, config)?;
        Self::analyze_cleaned(cleaned, config)
    }

    /// Aggregation and ratio derivation over an already cleaned dataset.
    pub fn analyze_cleaned(cleaned: CleanedDataset, config: &PipelineConfig) -> Result<AnalysisOutput> {
        let aggregate = MonthlyAggregator::aggregate(&cleaned.records)?;

        let engine = RatioEngine::new(config.income_key(), config.savings_key());
        let ratios = engine.derive(&aggregate);
        let summary = RatioEngine::summarize(&ratios);

        match summary.mean_savings_rate {
            Some(rate) => info!("Mean savings rate: {:.2}%", rate),
            None => info!("Savings rate undefined for every month"),
        }

        Ok(AnalysisOutput {
            cleaned: cleaned.records,
            aggregate,
            ratios,
            summary,
            diagnostics: cleaned.diagnostics,
        })
    }
}

fn ensure_rows(count: usize, stage: PipelineStage) -> Result<()> {
    if count == 0 {
        return Err(FinanceTrackerError::EmptyDataset { stage });
    }
    Ok(())
}

pub fn analyze_transactions(
    records: &[TransactionRecord],
    config: &PipelineConfig,
) -> Result<AnalysisOutput> {
    FinanceTracker::process(records, config)
}

pub fn analyze_csv(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<AnalysisOutput> {
    let records = read_transactions(path)?;
    FinanceTracker::process(&records, config)
}
