use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tc-router")]
#[command(about = "Run test case use cases against CSV, Jira or database backed sources")]
pub struct CliArgs {
    #[arg(long, short, default_value = "tc-router.toml")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Activate a draft test case
    Activate(TargetArgs),
    /// Move an active test case back to draft
    Deactivate(TargetArgs),
    /// Change title, priority or labels of a test case
    Update(UpdateArgs),
    /// Show one test case
    Get(TargetArgs),
    /// List test cases matching a filter
    List(ListArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Backing source: csv, jira or database
    #[arg(long, short)]
    pub source: String,

    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Backing source: csv, jira or database
    #[arg(long, short)]
    pub source: String,

    /// draft, active or deprecated
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub title_contains: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,
}
