use crate::error::{FinanceTrackerError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Rounds a monetary value to 2 decimal places (half away from zero).
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Title-cases a category label after trimming and collapsing inner whitespace.
///
/// A letter is upper-cased when it starts a word (the previous character is not
/// alphanumeric) and lower-cased otherwise, so `"rent"`, `"RENT "` and `"Rent"`
/// all become `"Rent"`, and `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let mut prev_alnum = false;

    for ch in collapsed.chars() {
        if ch.is_alphabetic() {
            if prev_alnum {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
        } else {
            out.push(ch);
        }
        prev_alnum = ch.is_alphanumeric();
    }

    out
}

/// Parses a raw amount cell. Empty, non-numeric and non-finite cells are missing.
///
/// A leading currency sign and thousands separators are accepted:
/// `"$1,200.50"` and `"-$15.00"` both parse.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let cleaned: String = rest
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let value: f64 = cleaned.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}

/// Tries each format in order; datetime formats are truncated to their date.
pub fn parse_date_with_formats(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    formats.iter().find_map(|fmt| {
        if fmt.contains("%H") {
            NaiveDateTime::parse_from_str(trimmed, fmt)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(trimmed, fmt).ok()
        }
    })
}

/// Parses a month key in the format "YYYY-MM" into (year, month).
pub fn parse_month_key(key: &str) -> Result<(i32, u32)> {
    let start_str = format!("{}-01", key.trim());
    let start = NaiveDate::parse_from_str(&start_str, "%Y-%m-%d")
        .map_err(|_| FinanceTrackerError::InvalidMonth(key.to_string()))?;

    Ok((start.year(), start.month()))
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
