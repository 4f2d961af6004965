//! Query command: run the canned SQL files against the loaded database.

use super::Project;
use anyhow::{bail, Result};
use clap::Args;
use shop_etl::duckdb::{discover_queries, Database, OutputFormat, QueryRunner, DEFAULT_ROW_LIMIT};
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  shop-etl query
  shop-etl query --limit 5
  shop-etl query --format json --limit 0
  shop-etl query --timing
  shop-etl query --sql-dir reports --database /tmp/shop.duckdb")]
pub struct QueryArgs {
    /// Directory of .sql files, run in file-name order
    #[arg(long, value_name = "DIR")]
    pub sql_dir: Option<PathBuf>,

    /// Database file to query (opened read-only)
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Rows shown per query (0 shows all)
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT)]
    pub limit: usize,

    /// Output format: table, json, csv
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Show execution time for each query
    #[arg(long)]
    pub timing: bool,
}

pub fn run(args: QueryArgs, project: &Project) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let paths = project
        .paths
        .clone()
        .with_overrides(None, args.sql_dir, args.database);

    if !paths.database.exists() {
        bail!(
            "Database {} not found. Run `shop-etl load` first.",
            paths.database.display()
        );
    }
    let db = Database::open_read_only(&paths.database)?;
    let files = discover_queries(&paths.sql_dir)?;
    tracing::info!(count = files.len(), dir = %paths.sql_dir.display(), "running queries");

    let limit = (args.limit > 0).then_some(args.limit);
    let stdout = io::stdout();
    let summary = QueryRunner::new(&db, stdout.lock())
        .with_format(format)
        .with_limit(limit)
        .with_timing(args.timing)
        .run_all(&files)?;

    if !summary.all_succeeded() {
        bail!(
            "{} of {} queries failed",
            summary.failed(),
            summary.reports.len()
        );
    }
    Ok(())
}
