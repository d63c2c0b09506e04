use crate::schema::{CleanedRecord, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Summary statistics of a batch of amounts, computed once per run and handed
/// to the stages that need them.
///
/// Accumulated with Welford's algorithm so the mean and the sum of squared
/// deviations can also be downdated for leave-one-out comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmountStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sum of squared deviations from the mean.
    pub m2: f64,
}

impl AmountStatistics {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut stats = Self::default();
        for value in values {
            stats.count += 1;
            let delta = value - stats.mean;
            stats.mean += delta / stats.count as f64;
            stats.m2 += delta * (value - stats.mean);
        }
        stats
    }

    /// Statistics over the amounts present in raw rows. Missing and
    /// non-finite amounts are skipped.
    pub fn of_present_amounts(records: &[TransactionRecord]) -> Self {
        Self::from_values(records.iter().filter_map(TransactionRecord::finite_amount))
    }

    pub fn of_records(records: &[CleanedRecord]) -> Self {
        Self::from_values(records.iter().map(|r| r.amount))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean, or `None` when no value was observed.
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.mean)
        }
    }

    /// Sample standard deviation (n - 1 denominator); zero below two values.
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2.max(0.0) / (self.count - 1) as f64).sqrt()
    }

    /// Mean and sample standard deviation of the batch with `value` removed.
    ///
    /// `value` must be one of the values the statistics were built from.
    /// Returns `None` when fewer than two values would remain.
    pub fn without(&self, value: f64) -> Option<(f64, f64)> {
        if self.count < 3 {
            return None;
        }
        let remaining = (self.count - 1) as f64;
        let mean = self.mean + (self.mean - value) / remaining;
        let m2 = (self.m2 - (value - self.mean) * (value - mean)).max(0.0);
        let std_dev = (m2 / (remaining - 1.0)).sqrt();
        Some((mean, std_dev))
    }
}
