use crate::error::{FinanceTrackerError, Result};
use crate::utils::title_case;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Each amount is compared with the mean and standard deviation of the
    /// other amounts in the batch.
    #[default]
    LeaveOneOut,
    /// Each amount is compared with the mean and standard deviation of the
    /// whole batch, itself included.
    Batch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// chrono formats tried in order when parsing the Date column.
    pub date_formats: Vec<String>,
    /// Maximum allowed distance from the mean, in standard deviations.
    pub outlier_threshold: f64,
    pub outlier_method: OutlierMethod,
    /// Denominator category of the savings rate; excluded from expense ratios.
    pub income_category: String,
    /// Numerator category of the savings rate.
    pub savings_category: String,
    pub dashboard_title: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
            ],
            outlier_threshold: 3.0,
            outlier_method: OutlierMethod::default(),
            income_category: "Salary".to_string(),
            savings_category: "Savings".to_string(),
            dashboard_title: "Personal Finance Dashboard".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.outlier_threshold.is_finite() || self.outlier_threshold <= 0.0 {
            return Err(FinanceTrackerError::InvalidOutlierThreshold(
                self.outlier_threshold,
            ));
        }

        if self.date_formats.is_empty() {
            return Err(FinanceTrackerError::InvalidConfig(
                "at least one date format is required".to_string(),
            ));
        }

        if title_case(&self.income_category).is_empty() {
            return Err(FinanceTrackerError::InvalidConfig(
                "income_category must not be empty".to_string(),
            ));
        }

        if title_case(&self.savings_category).is_empty() {
            return Err(FinanceTrackerError::InvalidConfig(
                "savings_category must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Income category in the same normalized form as cleaned records.
    pub fn income_key(&self) -> String {
        title_case(&self.income_category)
    }

    /// Savings category in the same normalized form as cleaned records.
    pub fn savings_key(&self) -> String {
        title_case(&self.savings_category)
    }
}
