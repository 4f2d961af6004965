mod generate;
mod load;
mod query;
mod verify;

use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate as generate_completions, Shell};
use shop_etl::config::{ProjectConfig, ProjectPaths};
use std::io;
use std::path::PathBuf;

pub use generate::GenerateArgs;
pub use load::LoadArgs;
pub use query::QueryArgs;

#[derive(Parser)]
#[command(name = "shop-etl")]
#[command(version)]
#[command(
    about = "Generate a synthetic e-commerce dataset, load it into DuckDB and query it",
    long_about = None
)]
pub struct Cli {
    /// Project root; relative data, query and database paths resolve against it
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// YAML config file with `paths` and `generate` sections
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the five CSV files
    Generate(GenerateArgs),

    /// Load the CSV files into DuckDB and run integrity checks
    Load(LoadArgs),

    /// Run every .sql file in the query directory
    Query(QueryArgs),

    /// Check that data files, database tables and query files exist
    Verify,

    /// Generate, load and query in one go
    Run(RunArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options for the full pipeline
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Show load progress
    #[arg(short, long)]
    pub progress: bool,

    /// Rows shown per query (0 shows all)
    #[arg(long, default_value_t = shop_etl::duckdb::DEFAULT_ROW_LIMIT)]
    pub limit: usize,
}

/// Dataset size and seed overrides shared by `generate` and `run`
#[derive(Args, Debug, Default)]
pub struct DatasetArgs {
    /// Number of customers
    #[arg(long)]
    pub customers: Option<usize>,

    /// Number of products
    #[arg(long)]
    pub products: Option<usize>,

    /// Number of orders
    #[arg(long)]
    pub orders: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Configuration and paths shared by every stage of one invocation
pub struct Project {
    pub config: ProjectConfig,
    pub paths: ProjectPaths,
}

impl Project {
    fn load(cli: &Cli) -> Result<Self> {
        let config = ProjectConfig::load_or_default(cli.config.as_deref())?;
        let paths = config.resolve_paths(&cli.root);
        tracing::debug!(?paths, "resolved project paths");
        Ok(Self { config, paths })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    shop_etl::logging::init(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell, &mut Cli::command(), "shop-etl", &mut io::stdout());
        return Ok(());
    }

    let project = Project::load(&cli)?;

    match cli.command {
        Commands::Generate(args) => generate::run(args, &project),
        Commands::Load(args) => load::run(args, &project),
        Commands::Query(args) => query::run(args, &project),
        Commands::Verify => verify::run(&project),
        Commands::Run(args) => {
            generate::run(
                GenerateArgs {
                    dataset: args.dataset,
                    data_dir: None,
                },
                &project,
            )?;
            eprintln!();
            load::run(
                LoadArgs {
                    data_dir: None,
                    database: None,
                    progress: args.progress,
                },
                &project,
            )?;
            eprintln!();
            query::run(
                QueryArgs {
                    sql_dir: None,
                    database: None,
                    limit: args.limit,
                    format: "table".to_string(),
                    timing: false,
                },
                &project,
            )
        }
        Commands::Completions { .. } => Ok(()),
    }
}
