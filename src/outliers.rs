use crate::config::OutlierMethod;
use crate::error::{FinanceTrackerError, Result};
use crate::schema::CleanedRecord;
use crate::statistics::AmountStatistics;
use log::{debug, info, warn};

/// Absorbs floating point noise when comparing deviations against the bound.
const DEVIATION_TOLERANCE: f64 = 1e-6;

/// Smallest batch whose leave-one-out reference is trusted: four remaining
/// amounts. Smaller batches use the whole-batch statistics.
const MIN_LEAVE_ONE_OUT_BATCH: usize = 5;

/// Amounts are kept to cents, so a reference spread below one cent is raised
/// to one cent.
const AMOUNT_RESOLUTION: f64 = 0.01;

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub retained: Vec<CleanedRecord>,
    pub removed: Vec<CleanedRecord>,
}

/// Removes records whose amount lies more than `threshold` standard
/// deviations from the mean. Records are never modified, only dropped.
pub struct OutlierFilter {
    threshold: f64,
    method: OutlierMethod,
}

impl OutlierFilter {
    pub fn new(threshold: f64, method: OutlierMethod) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(FinanceTrackerError::InvalidOutlierThreshold(threshold));
        }
        Ok(Self { threshold, method })
    }

    /// `stats` must describe exactly the amounts of `records`.
    pub fn filter(&self, records: Vec<CleanedRecord>, stats: &AmountStatistics) -> FilterOutcome {
        if stats.std_dev() == 0.0 {
            debug!("Amounts have zero spread; outlier filter is a no-op");
            return FilterOutcome {
                retained: records,
                removed: Vec::new(),
            };
        }

        let (retained, removed): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| !self.is_outlier(record.amount, stats));

        for record in &removed {
            debug!(
                "Removed outlier {} {} {:.2}",
                record.date, record.category, record.amount
            );
        }
        if !removed.is_empty() {
            warn!(
                "Removed {} outlier amounts (more than {} standard deviations from the mean)",
                removed.len(),
                self.threshold
            );
        }
        info!("{} records retained after outlier filtering", retained.len());

        FilterOutcome { retained, removed }
    }

    pub fn is_outlier(&self, amount: f64, stats: &AmountStatistics) -> bool {
        let (mean, std_dev) = match self.method {
            OutlierMethod::LeaveOneOut if stats.count >= MIN_LEAVE_ONE_OUT_BATCH => {
                match stats.without(amount) {
                    Some((mean, std_dev)) => (mean, std_dev.max(AMOUNT_RESOLUTION)),
                    None => (stats.mean, stats.std_dev()),
                }
            }
            _ => (stats.mean, stats.std_dev()),
        };

        (amount - mean).abs() > self.threshold * std_dev + DEVIATION_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AmountOrigin;
    use chrono::NaiveDate;

    fn records(amounts: &[f64]) -> Vec<CleanedRecord> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| CleanedRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                category: "Misc".to_string(),
                amount,
                origin: AmountOrigin::Recorded,
                description: None,
            })
            .collect()
    }

    fn run(amounts: &[f64], method: OutlierMethod) -> FilterOutcome {
        let batch = records(amounts);
        let stats = AmountStatistics::of_records(&batch);
        OutlierFilter::new(3.0, method).unwrap().filter(batch, &stats)
    }

    #[test]
    fn test_extreme_value_removed() {
        let outcome = run(&[100.0, 100.0, 100.0, 100.0, 100_000.0], OutlierMethod::LeaveOneOut);
        assert_eq!(outcome.retained.len(), 4);
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].amount, 100_000.0);
    }

    #[test]
    fn test_zero_variance_is_noop() {
        for method in [OutlierMethod::LeaveOneOut, OutlierMethod::Batch] {
            let outcome = run(&[100.0; 5], method);
            assert_eq!(outcome.retained.len(), 5);
            assert!(outcome.removed.is_empty());
        }
    }

    #[test]
    fn test_batch_method_cannot_flag_within_small_batch() {
        // With five values no point can be more than (n-1)/sqrt(n) sample
        // deviations from a mean that includes it.
        let outcome = run(&[100.0, 100.0, 100.0, 100.0, 100_000.0], OutlierMethod::Batch);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_batch_method_on_large_batch() {
        let mut amounts = vec![100.0; 30];
        amounts.push(100_000.0);
        let outcome = run(&amounts, OutlierMethod::Batch);
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.retained.len(), 30);
    }

    #[test]
    fn test_ordinary_spread_is_retained() {
        let amounts = [
            4200.0, 1200.0, 350.0, 120.0, 80.0, 900.0, 4100.0, 1200.0, 410.0, 95.0, 60.0, 850.0,
            4000.0, 1150.0, 380.0,
        ];
        let outcome = run(&amounts, OutlierMethod::LeaveOneOut);
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.retained.len(), amounts.len());
    }

    #[test]
    fn test_tiny_batches_are_not_filtered() {
        let outcome = run(&[1.0, 1_000_000.0], OutlierMethod::LeaveOneOut);
        assert_eq!(outcome.retained.len(), 2);
    }

    #[test]
    fn test_small_batches_use_whole_batch_spread() {
        for amounts in [
            [4000.0, 4000.0, 800.0],
            [3000.0, 600.0, 400.0],
        ] {
            let outcome = run(&amounts, OutlierMethod::LeaveOneOut);
            assert!(outcome.removed.is_empty(), "{:?} lost a row", amounts);
        }

        let outcome = run(&[100.0, 100.0, 100.0, 100_000.0], OutlierMethod::LeaveOneOut);
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_cent_level_difference_is_not_an_outlier() {
        let mut amounts = vec![100.0; 9];
        amounts.push(100.01);
        let outcome = run(&amounts, OutlierMethod::LeaveOneOut);
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.retained.len(), 10);
    }

    #[test]
    fn test_retained_records_are_untouched_and_ordered() {
        let batch = records(&[100.0, 100.0, 100_000.0, 100.0, 100.0]);
        let stats = AmountStatistics::of_records(&batch);
        let expected: Vec<_> = batch.iter().filter(|r| r.amount == 100.0).cloned().collect();

        let outcome = OutlierFilter::new(3.0, OutlierMethod::LeaveOneOut)
            .unwrap()
            .filter(batch, &stats);
        assert_eq!(outcome.retained, expected);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(OutlierFilter::new(0.0, OutlierMethod::Batch).is_err());
        assert!(OutlierFilter::new(f64::NAN, OutlierMethod::Batch).is_err());
    }
}
