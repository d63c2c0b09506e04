use crate::error::{FinanceTrackerError, Result};
use crate::schema::TransactionRecord;
use crate::utils::parse_amount;
use csv::{ByteRecord, StringRecord};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DATE_COLUMN: &str = "Date";
pub const CATEGORY_COLUMN: &str = "Category";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const DESCRIPTION_COLUMN: &str = "Description";

struct ColumnLayout {
    date: usize,
    category: usize,
    amount: usize,
    description: Option<usize>,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let date = find(DATE_COLUMN);
        let category = find(CATEGORY_COLUMN);
        let amount = find(AMOUNT_COLUMN);

        match (date, category, amount) {
            (Some(date), Some(category), Some(amount)) => Ok(Self {
                date,
                category,
                amount,
                description: find(DESCRIPTION_COLUMN),
            }),
            _ => {
                let missing = [
                    (DATE_COLUMN, date),
                    (CATEGORY_COLUMN, category),
                    (AMOUNT_COLUMN, amount),
                ]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
                Err(FinanceTrackerError::InputFormat { missing })
            }
        }
    }

    fn read_row(&self, row: &ByteRecord) -> TransactionRecord {
        let cell = |idx: usize| String::from_utf8_lossy(row.get(idx).unwrap_or_default());

        let raw_amount = cell(self.amount);
        let amount = parse_amount(&raw_amount);
        if amount.is_none() && !raw_amount.trim().is_empty() {
            debug!("Treating non-numeric amount '{}' as missing", raw_amount);
        }

        let description = self
            .description
            .map(|idx| cell(idx).trim().to_string())
            .filter(|d| !d.is_empty());

        TransactionRecord {
            date: cell(self.date).into_owned(),
            category: cell(self.category).into_owned(),
            amount,
            description,
        }
    }
}

/// Reads transactions from any CSV source with a header row.
///
/// Fails with [`FinanceTrackerError::InputFormat`] when the Date, Category or
/// Amount column is absent. Short rows are tolerated; their missing cells read
/// as empty and are dealt with during normalization. Cells that are not valid
/// UTF-8 are decoded lossily.
pub fn read_transactions_from_reader<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let layout = ColumnLayout::from_headers(rdr.headers()?)?;

    let mut records = Vec::new();
    for (index, result) in rdr.byte_records().enumerate() {
        let row = result?;
        if row.iter().all(|cell| cell.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }
        if std::str::from_utf8(row.as_slice()).is_err() {
            debug!("Row {}: replacing invalid UTF-8 bytes", index);
        }
        records.push(layout.read_row(&row));
    }

    Ok(records)
}

pub fn read_transactions(path: impl AsRef<Path>) -> Result<Vec<TransactionRecord>> {
    let file = File::open(path.as_ref())?;
    let records = read_transactions_from_reader(file)?;
    info!(
        "Read {} transaction rows from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}
