//! CSV loader for importing the generated tables into DuckDB.

use super::Database;
use crate::progress::{byte_bar, ProgressReader};
use anyhow::{bail, Context, Result};
use duckdb::types::Value;
use shop_data_gen::{table_path, Schema, SqlType, Table};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A row rejected by a primary-key, foreign-key or NOT NULL constraint.
///
/// The table's transaction has been rolled back when this is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    pub table: String,
    /// 1-based data row number in the CSV file
    pub row: usize,
    pub message: String,
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Constraint violation loading {} row {}: {}",
            self.table, self.row, self.message
        )
    }
}

impl std::error::Error for ConstraintViolation {}

/// Rows loaded into one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableLoad {
    pub table: String,
    pub rows: u64,
    pub duration_secs: f64,
}

/// Statistics from a full load
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    /// Tables in load order
    pub tables: Vec<TableLoad>,
    pub duration_secs: f64,
}

impl LoadStats {
    pub fn rows_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Rows loaded into `table`, if it was loaded
    pub fn rows_for(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tables, {} rows loaded in {:.2}s",
            self.tables.len(),
            self.rows_inserted(),
            self.duration_secs
        )
    }
}

/// Loads one CSV file per schema table, parents before children
pub struct CsvLoader<'a> {
    schema: &'a Schema,
    progress: bool,
}

impl<'a> CsvLoader<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            progress: false,
        }
    }

    /// Show a byte progress bar while reading
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Recreate every table and load `<data_dir>/<table>.csv` into it.
    ///
    /// All input files are checked before the database is touched. Each table
    /// is loaded in its own transaction and committed before the next starts.
    pub fn load(&self, db: &mut Database, data_dir: &Path) -> Result<LoadStats> {
        let start = Instant::now();
        let tables = self.schema.tables_in_order();

        let mut inputs: Vec<(&Table, PathBuf)> = Vec::with_capacity(tables.len());
        let mut total_bytes = 0;
        for table in tables {
            let path = table_path(data_dir, &table.name);
            let meta = std::fs::metadata(&path)
                .with_context(|| format!("Missing input file: {}", path.display()))?;
            total_bytes += meta.len();
            inputs.push((table, path));
        }

        self.reset_schema(db)?;

        let progress_bar = self.progress.then(|| byte_bar(total_bytes));

        let mut stats = LoadStats::default();
        let mut offset = 0;
        for (table, path) in &inputs {
            let table_start = Instant::now();
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            let reader: Box<dyn Read> = match &progress_bar {
                Some(pb) => {
                    pb.set_message(table.name.clone());
                    Box::new(ProgressReader::with_bar(file, pb, offset))
                }
                None => Box::new(file),
            };

            let rows = load_table(db, table, BufReader::new(reader))
                .with_context(|| format!("Failed to load {}", path.display()))?;

            offset += std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            let duration_secs = table_start.elapsed().as_secs_f64();
            tracing::info!(table = %table.name, rows, duration_secs, "table loaded");
            stats.tables.push(TableLoad {
                table: table.name.clone(),
                rows,
                duration_secs,
            });
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Load complete");
        }

        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }

    /// Drop dependents first, then create parents first
    fn reset_schema(&self, db: &Database) -> Result<()> {
        for table in self.schema.drop_order() {
            db.execute(&format!("DROP TABLE IF EXISTS {}", table.name))?;
        }
        for table in self.schema.tables_in_order() {
            tracing::debug!(table = %table.name, "creating table");
            db.execute(&table.create_sql())?;
        }
        Ok(())
    }
}

/// Insert every CSV row of one table inside a single transaction
fn load_table<R: Read>(db: &mut Database, table: &Table, reader: R) -> Result<u64> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().context("Failed to read CSV header")?.clone();
    let expected = table.column_names();
    let found: Vec<&str> = headers.iter().collect();
    if found != expected {
        bail!(
            "Unexpected header for {}: expected [{}], found [{}]",
            table.name,
            expected.join(", "),
            found.join(", ")
        );
    }

    let tx = db
        .connection_mut()
        .transaction()
        .context("Failed to begin transaction")?;
    let mut rows = 0u64;
    {
        let mut stmt = tx
            .prepare(&table.insert_sql())
            .with_context(|| format!("Failed to prepare insert for {}", table.name))?;

        for (i, record) in csv.records().enumerate() {
            let row = i + 1;
            let record =
                record.with_context(|| format!("Malformed {} row {}", table.name, row))?;
            if record.len() != table.columns.len() {
                bail!(
                    "Malformed {} row {}: expected {} fields, found {}",
                    table.name,
                    row,
                    table.columns.len(),
                    record.len()
                );
            }

            let mut params = Vec::with_capacity(record.len());
            for (column, field) in table.columns.iter().zip(record.iter()) {
                params.push(bind_value(column.sql_type, field).with_context(|| {
                    format!("Malformed {} row {} column {}", table.name, row, column.name)
                })?);
            }

            if let Err(e) = stmt.execute(duckdb::params_from_iter(params)) {
                let message = e.to_string();
                if is_constraint_error(&message) {
                    return Err(ConstraintViolation {
                        table: table.name.clone(),
                        row,
                        message,
                    }
                    .into());
                }
                return Err(e).with_context(|| format!("Failed to insert {} row {}", table.name, row));
            }
            rows += 1;
        }
    }
    tx.commit()
        .with_context(|| format!("Failed to commit {}", table.name))?;
    Ok(rows)
}

/// Integers are bound natively; everything else as text cast by the engine
fn bind_value(sql_type: SqlType, field: &str) -> Result<Value> {
    if field.is_empty() && sql_type != SqlType::Text {
        return Ok(Value::Null);
    }
    match sql_type {
        SqlType::Integer => {
            let n: i64 = field
                .trim()
                .parse()
                .with_context(|| format!("'{}' is not an integer", field))?;
            Ok(Value::BigInt(n))
        }
        _ => Ok(Value::Text(field.to_string())),
    }
}

fn is_constraint_error(message: &str) -> bool {
    message.contains("Constraint Error")
        || message.contains("violates")
        || message.contains("Violates")
}
