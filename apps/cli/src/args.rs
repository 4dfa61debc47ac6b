use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "verdantops", author, version, about = "Carbon accounting for data workloads", long_about = None)]
pub struct Cli {
    /// Config file (created with defaults when missing)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the SQLite database and intensity defaults
    #[arg(long, global = true, env = "VERDANT_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve(ServeArgs),
    /// Create or upgrade the database schema and seed reference data
    Migrate,
    /// Import NDJSON exports from a file or directory tree
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the configured port for this run only
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<String>,

    /// Bearer token required on ingest routes
    #[arg(long, env = "VERDANT_INGEST_TOKEN", hide_env_values = true)]
    pub ingest_token: Option<String>,
}
