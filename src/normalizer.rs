use crate::config::PipelineConfig;
use crate::schema::{AmountOrigin, CleanedRecord, TransactionRecord};
use crate::statistics::AmountStatistics;
use crate::utils::{parse_date_with_formats, round_to_cents, title_case};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The date text matched none of the accepted formats
    UnparseableDate(String),
    /// The category was empty after trimming
    EmptyCategory,
    /// The amount was missing and no amount in the batch could be averaged
    UnimputableAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Zero-based position of the row in the input batch
    pub row_index: usize,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizationOutcome {
    pub records: Vec<CleanedRecord>,
    pub rejected: Vec<RejectedRow>,
    pub imputed: usize,
    /// Rounded value substituted for missing amounts, if any amount was present
    pub imputation_value: Option<f64>,
}

impl NormalizationOutcome {
    pub fn count_rejected(&self, predicate: impl Fn(&RejectionReason) -> bool) -> usize {
        self.rejected.iter().filter(|r| predicate(&r.reason)).count()
    }
}

/// Parses dates, normalizes categories and fills in missing amounts.
///
/// Malformed rows are filtered out and reported, never turned into errors.
pub struct RecordNormalizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// `raw_stats` must be computed over the present amounts of `records`
    /// (see [`AmountStatistics::of_present_amounts`]); its mean is the
    /// imputation value.
    pub fn normalize(
        &self,
        records: &[TransactionRecord],
        raw_stats: &AmountStatistics,
    ) -> NormalizationOutcome {
        let imputation_value = raw_stats.mean().map(round_to_cents);
        let mut outcome = NormalizationOutcome {
            imputation_value,
            ..Default::default()
        };

        for (row_index, record) in records.iter().enumerate() {
            let Some(date) = parse_date_with_formats(&record.date, &self.config.date_formats)
            else {
                debug!("Row {}: unparseable date '{}'", row_index, record.date);
                outcome.rejected.push(RejectedRow {
                    row_index,
                    reason: RejectionReason::UnparseableDate(record.date.clone()),
                });
                continue;
            };

            let category = title_case(&record.category);
            if category.is_empty() {
                debug!("Row {}: empty category", row_index);
                outcome.rejected.push(RejectedRow {
                    row_index,
                    reason: RejectionReason::EmptyCategory,
                });
                continue;
            }

            let (amount, origin) = match (record.finite_amount(), imputation_value) {
                (Some(amount), _) => (round_to_cents(amount), AmountOrigin::Recorded),
                (None, Some(fill)) => {
                    debug!("Row {}: imputing missing amount as {:.2}", row_index, fill);
                    outcome.imputed += 1;
                    (fill, AmountOrigin::Imputed)
                }
                (None, None) => {
                    outcome.rejected.push(RejectedRow {
                        row_index,
                        reason: RejectionReason::UnimputableAmount,
                    });
                    continue;
                }
            };

            outcome.records.push(CleanedRecord {
                date,
                category,
                amount,
                origin,
                description: record.description.clone(),
            });
        }

        let bad_dates =
            outcome.count_rejected(|r| matches!(r, RejectionReason::UnparseableDate(_)));
        if bad_dates > 0 {
            warn!(
                "{} rows had dates that could not be parsed and were dropped",
                bad_dates
            );
        }

        info!(
            "Normalized {} of {} rows ({} imputed, {} rejected)",
            outcome.records.len(),
            records.len(),
            outcome.imputed,
            outcome.rejected.len()
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn normalize(records: &[TransactionRecord]) -> NormalizationOutcome {
        let config = PipelineConfig::default();
        let stats = AmountStatistics::of_present_amounts(records);
        RecordNormalizer::new(&config).normalize(records, &stats)
    }

    #[test]
    fn test_category_variants_collapse() {
        let records = vec![
            TransactionRecord::new("2024-01-01", "rent", Some(1200.0)),
            TransactionRecord::new("2024-02-01", "RENT ", Some(1200.0)),
            TransactionRecord::new("2024-03-01", "Rent", Some(1200.0)),
        ];
        let outcome = normalize(&records);
        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.records.iter().all(|r| r.category == "Rent"));
    }

    #[test]
    fn test_missing_amount_imputed_with_batch_mean() {
        let records = vec![
            TransactionRecord::new("2024-01-01", "Groceries", Some(400.0)),
            TransactionRecord::new("2024-01-02", "Groceries", Some(600.0)),
            TransactionRecord::new("2024-01-03", "Groceries", None),
        ];
        let outcome = normalize(&records);

        assert_eq!(outcome.imputed, 1);
        assert_eq!(outcome.imputation_value, Some(500.0));
        let imputed = &outcome.records[2];
        assert_eq!(imputed.amount, 500.00);
        assert_eq!(imputed.origin, AmountOrigin::Imputed);
    }

    #[test]
    fn test_imputation_mean_includes_rows_later_dropped() {
        // The bad-date row still contributes its amount to the batch mean.
        let records = vec![
            TransactionRecord::new("garbage", "Rent", Some(300.0)),
            TransactionRecord::new("2024-01-02", "Rent", Some(100.0)),
            TransactionRecord::new("2024-01-03", "Rent", None),
        ];
        let outcome = normalize(&records);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[1].amount, 200.0);
    }

    #[test]
    fn test_imputed_value_is_rounded() {
        let records = vec![
            TransactionRecord::new("2024-01-01", "Fees", Some(1.0)),
            TransactionRecord::new("2024-01-01", "Fees", Some(1.0)),
            TransactionRecord::new("2024-01-01", "Fees", Some(2.0)),
            TransactionRecord::new("2024-01-01", "Fees", None),
        ];
        let outcome = normalize(&records);
        assert_eq!(outcome.records[3].amount, 1.33);
    }

    #[test]
    fn test_bad_dates_are_dropped_and_reported() {
        let records = vec![
            TransactionRecord::new("2024-13-45", "Rent", Some(1.0)),
            TransactionRecord::new("2024-01-05", "Rent", Some(2.0)),
        ];
        let outcome = normalize(&records);

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.records[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(
            outcome.rejected,
            vec![RejectedRow {
                row_index: 0,
                reason: RejectionReason::UnparseableDate("2024-13-45".to_string()),
            }]
        );
    }

    #[test]
    fn test_no_present_amounts_means_no_imputation() {
        let records = vec![
            TransactionRecord::new("2024-01-01", "Rent", None),
            TransactionRecord::new("2024-01-02", " ", Some(5.0)),
        ];
        let config = PipelineConfig::default();
        let stats = AmountStatistics::from_values(std::iter::empty());
        let outcome = RecordNormalizer::new(&config).normalize(&records, &stats);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.imputed, 0);
        assert_eq!(
            outcome.count_rejected(|r| *r == RejectionReason::UnimputableAmount),
            1
        );
        assert_eq!(
            outcome.count_rejected(|r| *r == RejectionReason::EmptyCategory),
            1
        );
    }

    #[test]
    fn test_non_finite_amounts_are_imputed() {
        let records = vec![
            TransactionRecord::new("2024-01-01", "Salary", Some(4000.0)),
            TransactionRecord::new("2024-01-02", "Rent", Some(f64::NAN)),
            TransactionRecord::new("2024-01-03", "Groceries", None),
            TransactionRecord::new("2024-01-04", "Fees", Some(f64::NEG_INFINITY)),
        ];
        let outcome = normalize(&records);

        assert_eq!(outcome.imputation_value, Some(4000.0));
        assert_eq!(outcome.imputed, 3);
        assert!(outcome.records.iter().all(|r| r.amount == 4000.0));
        assert_eq!(outcome.records[1].origin, AmountOrigin::Imputed);
    }

    #[test]
    fn test_amounts_rounded_to_cents() {
        let records = vec![TransactionRecord::new("2024-01-01", "Rent", Some(1199.999))];
        let outcome = normalize(&records);
        assert_eq!(outcome.records[0].amount, 1200.0);
        assert_eq!(outcome.records[0].origin, AmountOrigin::Recorded);
    }
}
