use crate::error::FinanceTrackerError;
use crate::utils::parse_month_key;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One raw input row, exactly as read from the transaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unparsed date text; may be malformed.
    pub date: String,
    /// Free-text label with inconsistent case and whitespace.
    pub category: String,
    /// Signed amount, `None` when the cell was empty or not numeric.
    pub amount: Option<f64>,
    pub description: Option<String>,
}

impl TransactionRecord {
    pub fn new(date: &str, category: &str, amount: Option<f64>) -> Self {
        Self {
            date: date.to_string(),
            category: category.to_string(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// The amount, unless it is missing, NaN or infinite.
    pub fn finite_amount(&self) -> Option<f64> {
        self.amount.filter(|a| a.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AmountOrigin {
    /// Amount present in the source row
    Recorded,
    /// Missing in the source row, replaced by the batch mean
    Imputed,
}

/// Canonical record produced by cleaning.
///
/// The date is always valid, the category is title-cased and the amount is
/// finite and rounded to cents. Once a record has passed the outlier filter its
/// amount also lies within the configured number of standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub origin: AmountOrigin,
    pub description: Option<String>,
}

impl CleanedRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Calendar month used as the bucketing key. Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = FinanceTrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = parse_month_key(s)?;
        Ok(Self { year, month })
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for YearMonth {
    fn schema_name() -> String {
        "YearMonth".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// One aggregate row with an explicit `None` for categories absent that month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyRow {
    #[schemars(description = "Calendar month in YYYY-MM format")]
    pub month: YearMonth,

    #[schemars(description = "Summed amount per category; null when the category has no records that month")]
    pub values: BTreeMap<String, Option<f64>>,
}

/// A point of a month-indexed series; `value` is null for excluded months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesPoint {
    pub month: YearMonth,
    pub value: Option<f64>,
}
