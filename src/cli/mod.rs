//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    HistoryCommand, ResumeCommand, RunCommand, ShowCommand, StepsCommand, StreamCommand, ValidateCommand,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Multi-source investigation pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "dragnet")]
#[command(version)]
#[command(about = "Expands a seed query across public-record sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Record source fixture file (overrides the settings file)
    #[arg(long, global = true)]
    pub fixtures: Option<PathBuf>,

    /// Keep results in memory only
    #[arg(long, global = true)]
    pub no_history: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline and print its result
    Run(RunCommand),

    /// Run a pipeline, printing steps as they complete
    Stream(StreamCommand),

    /// Show a saved run
    Show(ShowCommand),

    /// List the steps of a saved run
    Steps(StepsCommand),

    /// Continue a cancelled run
    Resume(ResumeCommand),

    /// Show execution history
    History(HistoryCommand),

    /// Validate settings and fixtures
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
