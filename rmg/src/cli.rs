//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;

/// RoadmapGen - two-pass LLM roadmap generator
#[derive(Parser)]
#[command(
    name = "rmg",
    about = "Generate a development roadmap for an app idea (draft, then reflect)",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a roadmap and print it
    Generate {
        #[command(flatten)]
        args: RoadmapArgs,
    },

    /// Generate a roadmap and write it to a file
    Save {
        #[command(flatten)]
        args: RoadmapArgs,

        /// Destination file
        #[arg(short, long, default_value = "roadmap.md")]
        output_file: PathBuf,
    },

    /// Propose clarification questions for an idea
    Questions {
        /// The application idea
        #[arg(value_parser = non_empty_idea)]
        idea: String,

        /// Use this draft instead of generating one
        #[arg(short, long)]
        draft: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Arguments shared by `generate` and `save`
#[derive(Debug, Clone, clap::Args)]
pub struct RoadmapArgs {
    /// The application idea
    #[arg(value_parser = non_empty_idea)]
    pub idea: String,

    /// YAML or JSON file of clarification answers (key: answer)
    #[arg(short, long)]
    pub answers: Option<PathBuf>,

    /// Ask clarification questions interactively before the reflection pass
    #[arg(long)]
    pub clarify: bool,
}

/// Output format for commands that print structured data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Yaml,
    Json,
}

/// Reject blank ideas; the idea itself is passed on exactly as typed
fn non_empty_idea(s: &str) -> Result<String, String> {
    debug!(len = s.len(), "non_empty_idea: called");
    if s.trim().is_empty() {
        return Err("idea must not be empty".to_string());
    }
    Ok(s.to_string())
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roadmapgen")
        .join("logs")
        .join("roadmapgen.log");
    debug!(?path, "get_log_path: returning path");
    path
}
