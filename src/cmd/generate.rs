//! Generate command: synthesize the dataset and write it as CSV.

use super::{DatasetArgs, Project};
use anyhow::{bail, Result};
use clap::Args;
use shop_data_gen::{write_dataset, Generator};
use std::path::PathBuf;
use std::time::Instant;

/// Violations listed before the rest are summarised
const MAX_VIOLATIONS_SHOWN: usize = 10;

#[derive(Args, Debug)]
#[command(after_help = "Examples:
  shop-etl generate
  shop-etl generate --seed 42
  shop-etl generate --customers 100 --products 50 --orders 200 --data-dir /tmp/shop")]
pub struct GenerateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output directory for the CSV files
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: GenerateArgs, project: &Project) -> Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(|| project.paths.data_dir.clone());

    let mut config = project.config.generate.clone();
    let overrides = args.dataset;
    if let Some(n) = overrides.customers {
        config.customers = n;
    }
    if let Some(n) = overrides.products {
        config.products = n;
    }
    if let Some(n) = overrides.orders {
        config.orders = n;
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }

    let start = Instant::now();
    let mut generator = Generator::new(config)?;
    eprintln!(
        "Generating {} customers, {} products, {} orders (seed {})...",
        generator.config().customers,
        generator.config().products,
        generator.config().orders,
        generator.seed()
    );

    let data = generator.generate();

    let violations = data.check_consistency();
    if !violations.is_empty() {
        for violation in violations.iter().take(MAX_VIOLATIONS_SHOWN) {
            eprintln!("  {}", violation);
        }
        if violations.len() > MAX_VIOLATIONS_SHOWN {
            eprintln!("  ... and {} more", violations.len() - MAX_VIOLATIONS_SHOWN);
        }
        bail!(
            "Generated dataset is inconsistent ({} violations); no files written",
            violations.len()
        );
    }

    let written = write_dataset(&data, &data_dir)?;

    eprintln!("Wrote {} files to {}:", written.len(), data_dir.display());
    for table in &written {
        println!("  {:<12} {:>8} rows  {}", table.table, table.rows, table.path.display());
    }
    eprintln!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
