//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no I/O happens here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// tfcheck -- lifecycle tests for the content-safety Terraform module.
///
/// Use `tfcheck <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "tfcheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to a tfcheck.toml configuration file.
    ///
    /// Without this flag `tfcheck.toml` in the current directory is used if
    /// it exists, otherwise built-in defaults apply.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios in parallel and report the outcome.
    Run(RunArgs),

    /// List configured scenarios.
    List,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run only the named scenario (repeatable). Default: all.
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Override the terraform binary.
    #[arg(long, value_name = "PATH")]
    pub terraform_binary: Option<PathBuf>,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, terraform, scenarios).
        #[arg(long)]
        section: Option<String>,
    },
}
