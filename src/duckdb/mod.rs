//! DuckDB storage for the e-commerce dataset.
//!
//! This module loads the generated CSV files into an on-disk DuckDB database
//! with enforced foreign keys and runs analytic queries against it.
//!
//! # Example
//!
//! ```no_run
//! use shop_etl::duckdb::{CsvLoader, Database, IntegrityReport};
//! use shop_data_gen::Schema;
//! use std::path::Path;
//!
//! let schema = Schema::ecommerce();
//! let mut db = Database::open(Path::new("ecommerce.duckdb")).unwrap();
//! let stats = CsvLoader::new(&schema).load(&mut db, Path::new("data")).unwrap();
//! println!("{}", stats);
//!
//! let report = IntegrityReport::run(&db, &schema).unwrap();
//! print!("{}", report);
//! ```

mod integrity;
mod loader;
mod output;
mod runner;

pub use integrity::{IntegrityReport, OrphanCheck, TableCount};
pub use loader::{CsvLoader, ConstraintViolation, LoadStats, TableLoad};
pub use output::{OutputFormat, QueryResultFormatter};
pub use runner::{
    discover_queries, QueryOutcome, QueryReport, QueryRunner, RunSummary, DEFAULT_ROW_LIMIT,
};

use anyhow::{bail, Context, Result};
use duckdb::types::ValueRef;
use duckdb::{AccessMode, Config, Connection};
use std::path::Path;

/// Result of a query execution
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data (each row is a vector of string values)
    pub rows: Vec<Vec<String>>,
    /// Query execution time in seconds
    pub execution_time_secs: f64,
}

impl QueryResult {
    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// An open database file
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database file for writing, creating it if absent
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    /// Open an existing database file read-only
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Database not found: {}", path.display());
        }
        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .context("Failed to configure read-only access")?;
        let conn = Connection::open_with_flags(path, config)
            .with_context(|| format!("Failed to open DuckDB database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database read-only");
        Ok(Self { conn })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to create in-memory DuckDB database")?;
        Ok(Self { conn })
    }

    /// Execute a query and return the results
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let start = std::time::Instant::now();

        let mut stmt = self
            .conn
            .prepare(sql)
            .with_context(|| format!("Failed to prepare query: {}", sql.trim()))?;

        let mut rows_result = stmt
            .query([])
            .with_context(|| format!("Failed to execute query: {}", sql.trim()))?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = rows_result.next()? {
            if column_count == 0 {
                column_count = row.as_ref().column_count();
            }

            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(match row.get_ref(i) {
                    Ok(value) => value_to_string(value),
                    Err(_) => "ERROR".to_string(),
                });
            }
            rows.push(values);
        }

        // Release the borrow on the statement before reading column names
        drop(rows_result);

        let columns: Vec<String> = (0..stmt.column_count())
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Run a query that returns a single integer, such as `COUNT(*)`
    pub fn query_count(&self, sql: &str) -> Result<i64> {
        self.conn
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .with_context(|| format!("Failed to execute query: {}", sql.trim()))
    }

    /// Execute a statement that doesn't return results (e.g., CREATE, DROP)
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .with_context(|| format!("Failed to execute: {}", sql.trim()))
    }

    /// Names of the user tables, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let result = self.query(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        Ok(result.rows.into_iter().map(|mut r| r.swap_remove(0)).collect())
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Render a DuckDB value for display
fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Boolean(b) => b.to_string(),
        ValueRef::TinyInt(n) => n.to_string(),
        ValueRef::SmallInt(n) => n.to_string(),
        ValueRef::Int(n) => n.to_string(),
        ValueRef::BigInt(n) => n.to_string(),
        ValueRef::HugeInt(n) => n.to_string(),
        ValueRef::UTinyInt(n) => n.to_string(),
        ValueRef::USmallInt(n) => n.to_string(),
        ValueRef::UInt(n) => n.to_string(),
        ValueRef::UBigInt(n) => n.to_string(),
        ValueRef::Float(f) => f.to_string(),
        ValueRef::Double(f) => f.to_string(),
        ValueRef::Text(s) => String::from_utf8_lossy(s).to_string(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
        ValueRef::Decimal(d) => d.to_string(),
        ValueRef::Timestamp(_, ts) => {
            // Microseconds since epoch
            let secs = ts.div_euclid(1_000_000);
            let nanos = (ts.rem_euclid(1_000_000) * 1000) as u32;
            match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => ts.to_string(),
            }
        }
        ValueRef::Date32(days) => {
            // 719163 = days from 0001-01-01 to 1970-01-01
            match chrono::NaiveDate::from_num_days_from_ce_opt(719163 + days) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => days.to_string(),
            }
        }
        ValueRef::Time64(_, micros) => {
            let secs = (micros / 1_000_000) as u32;
            let nanos = ((micros % 1_000_000) * 1000) as u32;
            match chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos) {
                Some(time) => time.format("%H:%M:%S").to_string(),
                None => micros.to_string(),
            }
        }
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_query_renders_types() {
        let db = Database::open_in_memory().unwrap();
        let result = db
            .query(
                "SELECT 42 AS n, CAST('12.50' AS DECIMAL(10,2)) AS price, \
                 DATE '2024-02-29' AS d, TIMESTAMP '2024-03-01 09:30:00' AS ts, NULL AS missing",
            )
            .unwrap();
        assert_eq!(result.columns, vec!["n", "price", "d", "ts", "missing"]);
        assert_eq!(
            result.rows[0],
            vec!["42", "12.50", "2024-02-29", "2024-03-01 09:30:00", "NULL"]
        );
    }

    #[test]
    fn test_empty_result_keeps_columns() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (id INTEGER, name VARCHAR)").unwrap();
        let result = db.query("SELECT id, name FROM t").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.column_count(), 2);
    }

    #[test]
    fn test_query_count_and_list_tables() {
        let db = Database::open_in_memory().unwrap();
        db.execute("CREATE TABLE b (id INTEGER)").unwrap();
        db.execute("CREATE TABLE a (id INTEGER)").unwrap();
        db.execute("INSERT INTO a VALUES (1), (2), (3)").unwrap();
        assert_eq!(db.query_count("SELECT COUNT(*) FROM a").unwrap(), 3);
        assert_eq!(db.list_tables().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_read_only_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.duckdb");
        let err = Database::open_read_only(&path).err().unwrap();
        assert!(err.to_string().contains("Database not found"));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shop.duckdb");
        {
            let db = Database::open(&path).unwrap();
            db.execute("CREATE TABLE t (id INTEGER)").unwrap();
        }
        let db = Database::open_read_only(&path).unwrap();
        assert_eq!(db.list_tables().unwrap(), vec!["t"]);
        assert!(db.execute("INSERT INTO t VALUES (1)").is_err());
    }
}
