//! CSV serialization of the dataset.
//!
//! Every file carries a fixed header row, even when the table is empty.

use crate::dataset::Dataset;
use crate::records::Record;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A CSV file written by [`write_dataset`]
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    pub table: &'static str,
    pub path: PathBuf,
    pub rows: usize,
}

/// Path of a table's CSV file inside `dir`
pub fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.csv", table))
}

/// Serialize records to a writer, header first
pub fn write_records<R: Record, W: Write>(writer: W, rows: &[R]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(R::COLUMNS)?;
    for row in rows {
        csv.serialize(row)
            .with_context(|| format!("Failed to serialize {} row {}", R::TABLE, row.id()))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one table to `<dir>/<table>.csv`
pub fn write_table<R: Record>(dir: &Path, rows: &[R]) -> Result<WrittenTable> {
    let path = table_path(dir, R::TABLE);
    let file = File::create(&path)
        .with_context(|| format!("Cannot create output file: {}", path.display()))?;
    write_records(file, rows)?;
    tracing::debug!(table = R::TABLE, rows = rows.len(), path = %path.display(), "wrote table");
    Ok(WrittenTable {
        table: R::TABLE,
        path,
        rows: rows.len(),
    })
}

/// Write all five tables, creating `dir` if needed
pub fn write_dataset(dataset: &Dataset, dir: &Path) -> Result<Vec<WrittenTable>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create data directory: {}", dir.display()))?;
    Ok(vec![
        write_table(dir, &dataset.customers)?,
        write_table(dir, &dataset.products)?,
        write_table(dir, &dataset.orders)?,
        write_table(dir, &dataset.order_items)?,
        write_table(dir, &dataset.payments)?,
    ])
}

/// Iterate records from a CSV reader after checking its header.
///
/// `Err` items carry the 1-based data row number.
pub fn read_records<R: Record, Rd: Read>(
    reader: Rd,
) -> Result<impl Iterator<Item = Result<R>>> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().context("Failed to read CSV header")?.clone();
    let found: Vec<&str> = headers.iter().collect();
    if found != R::COLUMNS {
        bail!(
            "Unexpected header for {}: expected [{}], found [{}]",
            R::TABLE,
            R::COLUMNS.join(", "),
            found.join(", ")
        );
    }

    Ok(csv
        .into_deserialize::<R>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Malformed {} row {}", R::TABLE, i + 1))))
}

/// Read a whole table from `<dir>/<table>.csv`
pub fn read_table<R: Record>(dir: &Path) -> Result<Vec<R>> {
    let path = table_path(dir, R::TABLE);
    let file =
        File::open(&path).with_context(|| format!("Cannot open {}", path.display()))?;
    read_records(file)?.collect()
}

/// Read all five tables back into a dataset
pub fn read_dataset(dir: &Path) -> Result<Dataset> {
    Ok(Dataset {
        customers: read_table(dir)?,
        products: read_table(dir)?,
        orders: read_table(dir)?,
        order_items: read_table(dir)?,
        payments: read_table(dir)?,
    })
}

/// Count data rows (excluding the header) of a CSV file
pub fn count_rows(path: &Path) -> Result<usize> {
    let mut csv = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let mut count = 0;
    for record in csv.records() {
        record.with_context(|| format!("Malformed row in {}", path.display()))?;
        count += 1;
    }
    Ok(count)
}
