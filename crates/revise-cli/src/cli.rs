use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use revise_sdk::NodeId;

#[derive(Parser)]
#[command(
    name = "revise",
    about = "Revise: structural diff, review and patch for markdown documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Engine settings in TOML
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write diff markup turning one document into another
    Diff(DiffArgs),
    /// Normalize diff markup
    Normalize(FileArgs),
    /// List the diffs in a diff markup file
    List(FileArgs),
    /// Accept diffs and print the resulting markup
    Accept(ResolveArgs),
    /// Reject diffs and print the resulting markup
    Reject(ResolveArgs),
    /// Import diff markup and export it again
    Export(ExportArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    /// The original document (`-` for stdin)
    pub before: PathBuf,
    /// The revised document
    pub after: PathBuf,
    /// Print span counts to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args)]
pub struct FileArgs {
    /// Diff markup file (`-` for stdin)
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Diff markup file (`-` for stdin)
    pub file: PathBuf,
    /// Diff to resolve, as listed by `revise list` (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<NodeId>,
    /// Resolve every diff
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Diff markup file (`-` for stdin)
    pub file: PathBuf,
    /// Write every span on a single line
    #[arg(long)]
    pub collapse: bool,
}
