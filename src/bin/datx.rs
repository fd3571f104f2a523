mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::{cmd_bench, cmd_inspect, cmd_query};

#[derive(Parser)]
#[command(name = "datx")]
#[command(
    about = "IPv4 lookups over datx geolocation index files",
    long_about = "datx - Fast read-only IPv4 lookups over datx index files\n\n\
    Resolves IPv4 addresses and hostnames to the record stored for their\n\
    address range (country, region, city, ISP, ...). Files are memory-mapped\n\
    and never modified.\n\n\
    Examples:\n\
      datx query ipip.datx 8.8.8.8\n\
      datx query ipip.datx example.com --json\n\
      datx inspect ipip.datx\n\
      datx bench ipip.datx -n 1000000"
)]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up IPv4 addresses or hostnames
    Query {
        /// Path to the datx database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Addresses or hostnames to look up ("-" reads one per line from stdin)
        #[arg(value_name = "QUERY", required = true)]
        queries: Vec<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,

        /// Quiet mode - no output, only exit code (0 = all found, 1 = otherwise)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Inspect a datx database header and index
    Inspect {
        /// Path to the datx database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Benchmark lookup performance against a database
    Bench {
        /// Path to the datx database
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Number of queries to run
        #[arg(short = 'n', long, default_value = "1000000")]
        count: usize,

        /// LRU cache capacity (default: 0 - disabled)
        #[arg(long, default_value = "0")]
        cache_size: usize,

        /// Read the file into memory instead of memory-mapping it
        #[arg(long)]
        no_mmap: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            database,
            queries,
            json,
            quiet,
        } => cmd_query(database, queries, json, quiet),
        Commands::Inspect { database, json } => cmd_inspect(database, json),
        Commands::Bench {
            database,
            count,
            cache_size,
            no_mmap,
        } => cmd_bench(database, count, cache_size, no_mmap),
    }
}
