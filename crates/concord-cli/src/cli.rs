use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "concord",
    about = "Concord: compare expected and actual tables or messages",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log comparison progress (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two JSON-encoded tables
    Table(TableArgs),
    /// Compare two JSON-encoded messages
    Message(MessageArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// File holding the expected data
    #[arg(long)]
    pub expected: PathBuf,
    /// File holding the actual data
    #[arg(long)]
    pub actual: PathBuf,
    /// TOML comparison settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the result tree as JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct TableArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Key column; repeat for a composite key
    #[arg(long = "key")]
    pub keys: Vec<String>,
    /// Numeric column as NAME or NAME:PRECISION
    #[arg(long = "numeric")]
    pub numeric: Vec<String>,
    /// Flag rows whose key was already seen
    #[arg(long)]
    pub check_duplicates: bool,
    /// Compare literals ignoring case
    #[arg(long)]
    pub ignore_case: bool,
}

#[derive(Args)]
pub struct MessageArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Key fields of a repeating group as TYPE=FIELD[,FIELD...]
    #[arg(long = "group-key")]
    pub group_keys: Vec<String>,
    /// Compare literals ignoring case
    #[arg(long)]
    pub ignore_case: bool,
}
