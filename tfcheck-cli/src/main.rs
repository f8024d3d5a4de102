//! tfcheck -- lifecycle tests for the content-safety Terraform module.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use tfcheck_core::config::{GeneralConfig, TfcheckConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Configuration file looked up when `-c` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "tfcheck.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.as_deref();

    match cli.command {
        // config commands report load errors themselves
        Commands::Config(args) => {
            let loaded = load_config(config_path, cli.log_level.as_deref()).await;
            let general = match &loaded {
                Ok(config) => config.general.clone(),
                Err(_) => {
                    let mut general = GeneralConfig::default();
                    if let Some(level) = cli.log_level {
                        general.log_level = level;
                    }
                    general
                }
            };
            init_logging(&general)?;
            commands::config::execute(args, config_path, loaded, &writer)
        }
        Commands::Run(args) => {
            let config = prepare(config_path, cli.log_level.as_deref()).await?;
            commands::run::execute(args, config, &writer).await
        }
        Commands::List => {
            let config = prepare(config_path, cli.log_level.as_deref()).await?;
            commands::list::execute(&config, &writer)
        }
    }
}

/// Loads the configuration and starts logging from it.
async fn prepare(
    config_path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<TfcheckConfig, CliError> {
    let config = load_config(config_path, log_level).await?;
    init_logging(&config.general)?;
    Ok(config)
}

/// Loads the effective configuration.
///
/// Layers are applied file, then env, then `--log-level`, and the result is
/// validated once. An explicit path must exist; the implicit `tfcheck.toml`
/// may be absent.
pub(crate) async fn load_config(
    path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<TfcheckConfig, CliError> {
    let mut config = match path {
        Some(path) => TfcheckConfig::from_file(path).await?,
        None => TfcheckConfig::from_file_or_default(DEFAULT_CONFIG_FILE).await?,
    };
    config.apply_env_overrides();
    if let Some(level) = log_level {
        config.general.log_level = level.to_owned();
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(general: &GeneralConfig) -> Result<(), CliError> {
    logging::init_tracing(general).map_err(|e| CliError::Config(e.to_string()))
}
