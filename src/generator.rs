use crate::error::Result;
use crate::ingestion::{AMOUNT_COLUMN, CATEGORY_COLUMN, DATE_COLUMN, DESCRIPTION_COLUMN};
use crate::schema::TransactionRecord;
use crate::utils::round_to_cents;
use chrono::{Days, NaiveDate};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Category and the uniform range its monthly amount is drawn from.
const CATEGORY_RANGES: [(&str, f64, f64); 6] = [
    ("Salary", 3000.0, 5000.0),
    ("Rent", 100.0, 1000.0),
    ("Groceries", 100.0, 1000.0),
    ("Utilities", 100.0, 1000.0),
    ("Entertainment", 100.0, 1000.0),
    ("Savings", 500.0, 1500.0),
];

const PERIODS: u64 = 12;
const PERIOD_DAYS: u64 = 30;

/// Synthetic transaction log: one row per category on each of 12 dates
/// spaced 30 days apart from 2024-01-01. The same seed yields the same data.
pub fn generate_transactions(seed: u64) -> Vec<TransactionRecord> {
    let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
        return Vec::new();
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let mut records = Vec::with_capacity(PERIODS as usize * CATEGORY_RANGES.len());
    for period in 0..PERIODS {
        let date = start
            .checked_add_days(Days::new(period * PERIOD_DAYS))
            .unwrap_or(start);

        for (category, low, high) in CATEGORY_RANGES {
            let amount = round_to_cents(rng.gen_range(low..high));
            records.push(
                TransactionRecord::new(&date.format("%Y-%m-%d").to_string(), category, Some(amount))
                    .with_description(&format!("{} expense", category)),
            );
        }
    }

    records
}

pub fn write_transactions_csv_to<W: Write>(records: &[TransactionRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([DATE_COLUMN, CATEGORY_COLUMN, AMOUNT_COLUMN, DESCRIPTION_COLUMN])?;

    for record in records {
        wtr.write_record([
            record.date.clone(),
            record.category.clone(),
            record.amount.map(|a| format!("{:.2}", a)).unwrap_or_default(),
            record.description.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_transactions_csv(records: &[TransactionRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_transactions_csv_to(records, fs::File::create(path)?)?;
    info!("Wrote {} synthetic transactions to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::read_transactions_from_reader;

    #[test]
    fn test_shape_and_ranges() {
        let records = generate_transactions(7);
        assert_eq!(records.len(), 72);

        assert_eq!(records[0].date, "2024-01-01");
        assert_eq!(records[6].date, "2024-01-31");
        assert_eq!(records[71].date, "2024-11-26");

        for record in &records {
            let (_, low, high) = CATEGORY_RANGES
                .iter()
                .find(|(c, _, _)| *c == record.category)
                .unwrap();
            let amount = record.amount.unwrap();
            assert!(amount >= *low && amount <= *high);
            assert_eq!(
                record.description.as_deref(),
                Some(format!("{} expense", record.category).as_str())
            );
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        assert_eq!(generate_transactions(42), generate_transactions(42));
        assert_ne!(generate_transactions(1), generate_transactions(2));
    }

    #[test]
    fn test_csv_reads_back() {
        let records = generate_transactions(3);
        let mut buf = Vec::new();
        write_transactions_csv_to(&records, &mut buf).unwrap();

        let back = read_transactions_from_reader(buf.as_slice()).unwrap();
        assert_eq!(back, records);
    }
}
