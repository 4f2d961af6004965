//! Load command: import the CSV files into DuckDB and report integrity.

use super::Project;
use anyhow::Result;
use clap::Args;
use shop_data_gen::Schema;
use shop_etl::duckdb::{CsvLoader, Database, IntegrityReport};
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  shop-etl load
  shop-etl load --progress
  shop-etl load --data-dir /tmp/shop --database /tmp/shop.duckdb")]
pub struct LoadArgs {
    /// Directory containing the CSV files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Database file to (re)create
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Show load progress
    #[arg(short, long)]
    pub progress: bool,
}

pub fn run(args: LoadArgs, project: &Project) -> Result<()> {
    let paths = project
        .paths
        .clone()
        .with_overrides(args.data_dir, None, args.database);
    let schema = Schema::ecommerce();

    eprintln!(
        "Loading {} into {}...",
        paths.data_dir.display(),
        paths.database.display()
    );

    let mut db = Database::open(&paths.database)?;
    let stats = CsvLoader::new(&schema)
        .with_progress(args.progress)
        .load(&mut db, &paths.data_dir)?;

    for table in &stats.tables {
        println!(
            "  {:<12} {:>8} rows  ({:.2}s)",
            table.table, table.rows, table.duration_secs
        );
    }
    eprintln!("Loaded {}", stats);

    let report = IntegrityReport::run(&db, &schema)?;
    print!("{}", report);

    if report.total_orphans() > 0 {
        eprintln!(
            "Warning: {} orphaned rows found; foreign keys may not have been enforced",
            report.total_orphans()
        );
    }
    if let Some(mismatches) = report.payment_mismatches.filter(|&n| n > 0) {
        eprintln!(
            "Warning: {} payments differ from their order's item total",
            mismatches
        );
    }
    Ok(())
}
