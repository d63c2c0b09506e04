use std::fmt;
use thiserror::Error;

/// Pipeline stage reported alongside fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Ingestion,
    Normalization,
    OutlierFiltering,
    Aggregation,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Ingestion => "ingestion",
            PipelineStage::Normalization => "normalization",
            PipelineStage::OutlierFiltering => "outlier filtering",
            PipelineStage::Aggregation => "aggregation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FinanceTrackerError {
    #[error("Input is missing required columns: {}", .missing.join(", "))]
    InputFormat { missing: Vec<String> },

    #[error("No records left after {stage}")]
    EmptyDataset { stage: PipelineStage },

    #[error("Invalid outlier threshold {0}: must be a positive finite number of standard deviations")]
    InvalidOutlierThreshold(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinanceTrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_format_message_lists_columns() {
        let err = FinanceTrackerError::InputFormat {
            missing: vec!["Date".to_string(), "Amount".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Input is missing required columns: Date, Amount"
        );
    }

    #[test]
    fn test_empty_dataset_names_stage() {
        let err = FinanceTrackerError::EmptyDataset {
            stage: PipelineStage::Aggregation,
        };
        assert!(err.to_string().contains("aggregation"));
    }
}
