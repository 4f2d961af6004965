//! Runs a directory of `.sql` files against a loaded database.
//!
//! Files run in lexical order. A failing query is reported and the rest still
//! run; the summary tells the caller whether anything failed.

use super::{Database, OutputFormat, QueryResult, QueryResultFormatter};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Rows shown per query unless configured otherwise
pub const DEFAULT_ROW_LIMIT: usize = 20;

/// Find `*.sql` files directly inside `dir`, sorted by file name
pub fn discover_queries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Query directory not found: {}", dir.display());
    }

    // The directory is matched literally; only the file name is a pattern
    let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.sql");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        bail!("No SQL files found in {}", dir.display());
    }
    Ok(files)
}

/// What happened to one query file
#[derive(Debug)]
pub enum QueryOutcome {
    Rows(QueryResult),
    Failed(String),
}

#[derive(Debug)]
pub struct QueryReport {
    /// File stem, used as the query's display name
    pub name: String,
    pub path: PathBuf,
    pub outcome: QueryOutcome,
}

impl QueryReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Failed(_))
    }

    /// Total rows returned, or `None` if the query failed
    pub fn total_rows(&self) -> Option<usize> {
        match &self.outcome {
            QueryOutcome::Rows(result) => Some(result.row_count()),
            QueryOutcome::Failed(_) => None,
        }
    }
}

/// Outcomes of a full run, in execution order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<QueryReport>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failed()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.reports.len() - self.failed()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// Executes query files and writes their rendered results to `out`
pub struct QueryRunner<'a, W: Write> {
    db: &'a Database,
    out: W,
    format: OutputFormat,
    limit: Option<usize>,
    timing: bool,
}

impl<'a, W: Write> QueryRunner<'a, W> {
    pub fn new(db: &'a Database, out: W) -> Self {
        Self {
            db,
            out,
            format: OutputFormat::Table,
            limit: Some(DEFAULT_ROW_LIMIT),
            timing: false,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Rows shown per query; `None` shows every row
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Print each query's execution time after its result
    pub fn with_timing(mut self, timing: bool) -> Self {
        self.timing = timing;
        self
    }

    /// Run every file in order. Only output errors abort the run.
    pub fn run_all(&mut self, files: &[PathBuf]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for path in files {
            summary.reports.push(self.run_file(path)?);
        }

        let rule = if summary.all_succeeded() {
            "All queries executed successfully".to_string()
        } else {
            format!(
                "{} of {} queries failed",
                summary.failed(),
                summary.reports.len()
            )
        };
        writeln!(self.out, "{}", banner(&rule))?;
        Ok(summary)
    }

    /// Run one file and render its result
    pub fn run_file(&mut self, path: &Path) -> Result<QueryReport> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        writeln!(self.out, "{}", banner(&format!("Running Query: {}", name)))?;

        let outcome = match fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))
            .and_then(|sql| self.db.query(&sql))
        {
            Ok(result) => {
                self.render(&result)?;
                tracing::info!(query = %name, rows = result.row_count(), "query finished");
                QueryOutcome::Rows(result)
            }
            Err(e) => {
                let message = format!("{:#}", e);
                eprintln!("Error in {}: {}", name, message);
                tracing::debug!(query = %name, "query failed");
                QueryOutcome::Failed(message)
            }
        };

        Ok(QueryReport {
            name,
            path: path.to_path_buf(),
            outcome,
        })
    }

    fn render(&mut self, result: &QueryResult) -> Result<()> {
        if result.is_empty() {
            writeln!(self.out, "No results returned.")?;
        } else {
            let formatted = QueryResultFormatter::format(result, self.format, self.limit);
            write!(self.out, "{}", formatted)?;
            writeln!(self.out, "Total Rows Returned: {}", result.row_count())?;
        }
        if self.timing {
            writeln!(self.out, "Executed in {:.3}s", result.execution_time_secs)?;
        }
        if !result.is_empty() {
            writeln!(self.out)?;
        }
        Ok(())
    }
}

/// A title centred in a rule of `=`
fn banner(title: &str) -> String {
    let width: usize = 60;
    let pad = width.saturating_sub(title.chars().count() + 2);
    let left = pad / 2;
    format!(
        "{} {} {}",
        "=".repeat(left),
        title,
        "=".repeat(pad - left)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        for name in ["02_b.sql", "10_c.sql", "01_a.sql", "notes.txt"] {
            fs::write(temp.path().join(name), "SELECT 1").unwrap();
        }
        fs::create_dir(temp.path().join("nested.sql")).unwrap();

        let files = discover_queries(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_a.sql", "02_b.sql", "10_c.sql"]);
    }

    #[test]
    fn test_discover_in_directory_with_pattern_characters() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("shop[2024]*?").join("sql");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("01_a.sql"), "SELECT 1").unwrap();
        fs::write(dir.join("02_b.sql"), "SELECT 2").unwrap();

        let files = discover_queries(&dir).unwrap();
        assert_eq!(files, vec![dir.join("01_a.sql"), dir.join("02_b.sql")]);
    }

    #[test]
    fn test_discover_errors() {
        let temp = TempDir::new().unwrap();
        let err = discover_queries(temp.path()).unwrap_err();
        assert!(err.to_string().contains("No SQL files found"));

        let err = discover_queries(&temp.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("Query directory not found"));
    }

    #[test]
    fn test_timing_line_only_when_enabled() {
        let db = Database::open_in_memory().unwrap();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("01_one.sql"), "SELECT 1 AS one").unwrap();
        fs::write(temp.path().join("02_none.sql"), "SELECT 1 AS one WHERE false").unwrap();
        let files = discover_queries(temp.path()).unwrap();

        let mut out = Vec::new();
        QueryRunner::new(&db, &mut out).run_all(&files).unwrap();
        let plain = String::from_utf8(out).unwrap();
        assert!(!plain.contains("Executed in"));

        let mut out = Vec::new();
        QueryRunner::new(&db, &mut out)
            .with_timing(true)
            .run_all(&files)
            .unwrap();
        let timed = String::from_utf8(out).unwrap();
        assert_eq!(timed.matches("Executed in ").count(), 2);
        assert!(timed.contains("Total Rows Returned: 1\nExecuted in "));
        assert!(timed.contains("No results returned.\nExecuted in "));
    }

    #[test]
    fn test_banner_width() {
        let line = banner("Running Query: top_customers");
        assert_eq!(line.chars().count(), 60);
        assert!(line.contains(" Running Query: top_customers "));
    }
}
