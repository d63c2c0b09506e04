use crate::aggregation::MonthlyAggregate;
use crate::error::Result;
use crate::ingestion::{AMOUNT_COLUMN, CATEGORY_COLUMN, DATE_COLUMN, DESCRIPTION_COLUMN};
use crate::report::ReportPayload;
use crate::schema::CleanedRecord;
use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes cleaned records with ISO dates and 2-decimal amounts.
pub fn write_cleaned_csv_to<W: Write>(records: &[CleanedRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([DATE_COLUMN, CATEGORY_COLUMN, AMOUNT_COLUMN, DESCRIPTION_COLUMN])?;

    for record in records {
        wtr.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.category.clone(),
            format!("{:.2}", record.amount),
            record.description.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_cleaned_csv(records: &[CleanedRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    write_cleaned_csv_to(records, File::create(path)?)?;
    info!("Wrote {} cleaned records to {}", records.len(), path.display());
    Ok(())
}

/// One row per month, one column per category; absent cells are left empty.
pub fn write_aggregate_csv_to<W: Write>(aggregate: &MonthlyAggregate, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Month".to_string()];
    header.extend(aggregate.categories().map(str::to_string));
    wtr.write_record(&header)?;

    for row in aggregate.to_rows() {
        let mut line = vec![row.month.to_string()];
        line.extend(
            row.values
                .values()
                .map(|v| v.map(|x| format!("{:.2}", x)).unwrap_or_default()),
        );
        wtr.write_record(&line)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_aggregate_csv(aggregate: &MonthlyAggregate, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    write_aggregate_csv_to(aggregate, File::create(path)?)?;
    info!("Wrote monthly aggregate to {}", path.display());
    Ok(())
}

pub fn write_report_json(payload: &ReportPayload, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer.flush()?;
    info!("Wrote report payload to {}", path.display());
    Ok(())
}
