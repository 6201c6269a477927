//! CLI command definitions

use crate::core::DomainType;
use clap::Args;

/// Options shared by `run` and `stream`
#[derive(Debug, Args, Clone)]
pub struct SearchArgs {
    /// Seed query: a company name, person name or tax id
    pub query: String,

    /// Maximum expansion depth (0 runs the seed steps only)
    #[arg(short = 'd', long)]
    pub max_depth: Option<u32>,

    /// Search the same keyword on the same domain more than once
    #[arg(long)]
    pub allow_duplicates: bool,

    /// Restrict the run to these domains (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_domain)]
    pub domains: Vec<DomainType>,

    /// Number of same-depth steps to search concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Pause between steps, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Run a pipeline in the background and wait for its snapshot
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub search: SearchArgs,
}

/// Run a pipeline and print each step as it completes
#[derive(Debug, Args, Clone)]
pub struct StreamCommand {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Stop listening after this many step events
    #[arg(long)]
    pub take: Option<usize>,
}

/// Show a saved run
#[derive(Debug, Args, Clone)]
pub struct ShowCommand {
    /// Pipeline ID
    pub pipeline_id: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List the steps of a saved run
#[derive(Debug, Args, Clone)]
pub struct StepsCommand {
    /// Pipeline ID
    pub pipeline_id: String,

    /// Only steps at this depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Continue the pending steps of a cancelled run
#[derive(Debug, Args, Clone)]
pub struct ResumeCommand {
    /// Pipeline ID
    pub pipeline_id: String,
}

/// Show execution history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate the settings file and fixtures
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output the effective settings in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse a domain name such as `court` or `web-fraud`
pub fn parse_domain(s: &str) -> Result<DomainType, String> {
    s.parse()
}
