use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "model-relations-graph",
    version,
    about = "Model schema/relationship graph builder",
    long_about = "Build a JSON graph of an application's model layer: models as nodes, associations as edges, with schema metadata and bounded-depth relationship cycle detection. Models come from a TOML manifest; schema metadata comes from an optional SQL DDL dump."
)]
pub struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true, default_value_t = false)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the model graph document
    Generate {
        /// TOML manifest describing the application's models
        #[arg(long)]
        manifest: PathBuf,
        /// SQL schema dump backing schema inspection
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output JSON file path (defaults to the configured output path)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overwrite an existing output file without confirmation
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Print the document to stdout instead of persisting it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
