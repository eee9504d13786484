//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "timeroll")]
#[command(version, about = "Pipe output into log files rotated on time boundaries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read stdin and append it to rotating log files
    Run(RunArgs),

    /// Validate a rolling configuration
    Check(PolicyArgs),

    /// Render a file name pattern for an instant
    Render(RenderArgs),
}

/// Options describing the rolling policy
#[derive(Args, Clone, Default)]
pub struct PolicyArgs {
    /// File name pattern with a %d{...} date placeholder
    #[arg(short, long, env = "TIMEROLL_PATTERN")]
    pub pattern: Option<String>,

    /// Fixed path of the active log file
    #[arg(short, long)]
    pub active: Option<PathBuf>,

    /// Render dates in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Config file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Copy input verbatim instead of prefixing each line with a timestamp
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// RFC 3339 instant to render (default: now)
    #[arg(long)]
    pub at: Option<String>,
}
