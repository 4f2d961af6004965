//! Project completeness check.
//!
//! Reports which artifacts of the three stages exist: the CSV files, the
//! database with its tables, and the query files.

use crate::config::ProjectPaths;
use crate::duckdb::{discover_queries, Database};
use anyhow::Result;
use shop_data_gen::{count_rows, table_path, TABLE_NAMES};
use std::fmt;
use std::path::PathBuf;

/// One expected CSV file
#[derive(Debug, Clone, PartialEq)]
pub struct DataFileCheck {
    pub table: &'static str,
    pub path: PathBuf,
    /// Data rows, or `None` when the file is missing or unreadable
    pub rows: Option<usize>,
    /// Why an existing file could not be counted
    pub error: Option<String>,
}

/// One expected database table
#[derive(Debug, Clone, PartialEq)]
pub struct TableCheck {
    pub table: &'static str,
    /// Row count, or `None` when the table is missing
    pub rows: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    pub data_files: Vec<DataFileCheck>,
    pub database: PathBuf,
    /// `None` when the database file does not exist
    pub tables: Option<Vec<TableCheck>>,
    pub sql_dir: PathBuf,
    pub queries: Vec<PathBuf>,
}

impl VerifyReport {
    /// Inspect the project. Missing artifacts are recorded, not returned as errors.
    pub fn collect(paths: &ProjectPaths) -> Result<Self> {
        let mut data_files = Vec::with_capacity(TABLE_NAMES.len());
        for table in TABLE_NAMES {
            let path = table_path(&paths.data_dir, table);
            let (rows, error) = if path.is_file() {
                match count_rows(&path) {
                    Ok(rows) => (Some(rows), None),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "cannot count rows: {:#}", e);
                        (None, Some(format!("{:#}", e)))
                    }
                }
            } else {
                (None, None)
            };
            data_files.push(DataFileCheck {
                table,
                path,
                rows,
                error,
            });
        }

        let tables = if paths.database.exists() {
            let db = Database::open_read_only(&paths.database)?;
            let present = db.list_tables()?;
            let mut checks = Vec::with_capacity(TABLE_NAMES.len());
            for table in TABLE_NAMES {
                let rows = if present.iter().any(|t| t == table) {
                    Some(db.query_count(&format!("SELECT COUNT(*) FROM {}", table))?)
                } else {
                    None
                };
                checks.push(TableCheck { table, rows });
            }
            Some(checks)
        } else {
            None
        };

        // An empty or missing query directory is reported, not fatal
        let queries = discover_queries(&paths.sql_dir).unwrap_or_default();

        Ok(Self {
            data_files,
            database: paths.database.clone(),
            tables,
            sql_dir: paths.sql_dir.clone(),
            queries,
        })
    }

    pub fn data_complete(&self) -> bool {
        self.data_files.iter().all(|f| f.rows.is_some())
    }

    pub fn database_complete(&self) -> bool {
        self.tables
            .as_ref()
            .is_some_and(|tables| tables.iter().all(|t| t.rows.is_some()))
    }

    pub fn queries_present(&self) -> bool {
        !self.queries.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.data_complete() && self.database_complete() && self.queries_present()
    }
}

fn status(ok: bool) -> &'static str {
    if ok {
        "[OK]"
    } else {
        "[MISSING]"
    }
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[1] Data files")?;
        for file in &self.data_files {
            match (file.rows, &file.error) {
                (Some(rows), _) => {
                    writeln!(f, "  {} {}: {} rows", status(true), file.path.display(), rows)?
                }
                (None, Some(error)) => writeln!(f, "  [INVALID] {}: {}", file.path.display(), error)?,
                (None, None) => writeln!(f, "  {} {}", status(false), file.path.display())?,
            }
        }

        writeln!(f, "[2] Database {}", self.database.display())?;
        match &self.tables {
            None => writeln!(f, "  {} database file", status(false))?,
            Some(tables) => {
                for table in tables {
                    match table.rows {
                        Some(rows) => {
                            writeln!(f, "  {} table {}: {} rows", status(true), table.table, rows)?
                        }
                        None => writeln!(f, "  {} table {}", status(false), table.table)?,
                    }
                }
            }
        }

        writeln!(f, "[3] Query files in {}", self.sql_dir.display())?;
        if self.queries.is_empty() {
            writeln!(f, "  {} no .sql files", status(false))?;
        }
        for query in &self.queries {
            let name = query
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(f, "  {} {}", status(true), name)?;
        }
        Ok(())
    }
}
