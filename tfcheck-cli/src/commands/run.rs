//! `tfcheck run` command handler

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tracing::info;

use tfcheck_core::config::TfcheckConfig;
use tfcheck_runner::{CleanupStatus, Outcome, ScenarioReport, Suite, SuiteReport};
use tfcheck_terraform::CliTerraform;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// The report is rendered before the result is returned, so a failing
/// suite still prints every scenario's outcome.
pub async fn execute(
    args: RunArgs,
    mut config: TfcheckConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    if let Some(binary) = args.terraform_binary {
        config.terraform.binary = binary.display().to_string();
    }

    let client = Arc::new(CliTerraform::new(
        config.terraform.binary.clone(),
        Duration::from_secs(config.terraform.command_timeout_secs),
    ));
    let mut suite = Suite::from_config(client, &config);
    suite.select(&args.scenarios)?;

    info!(
        binary = config.terraform.binary.as_str(),
        scenarios = suite.scenarios().len(),
        "running scenarios"
    );
    let report = suite.run().await;
    writer.render(&report)?;

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenarioFailed {
            failed: report.failed(),
            total: report.scenarios.len(),
        })
    }
}

impl Render for SuiteReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for scenario in &self.scenarios {
            render_scenario(scenario, w)?;
            writeln!(w)?;
        }

        let summary = format!("{} passed, {} failed", self.passed(), self.failed());
        if self.all_passed() {
            writeln!(w, "Result: {}", summary.green().bold())?;
        } else {
            writeln!(w, "Result: {}", summary.red().bold())?;
        }

        let leaked = self.leaked();
        if !leaked.is_empty() {
            writeln!(w, "{}", "Resources may have been left behind:".yellow().bold())?;
            for scenario in leaked {
                writeln!(w, "  {} ({})", scenario.name, scenario.directory)?;
            }
        }
        Ok(())
    }
}

fn render_scenario(scenario: &ScenarioReport, w: &mut dyn Write) -> std::io::Result<()> {
    let status = if scenario.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    writeln!(
        w,
        "{} {} ({}, {})",
        status,
        scenario.name.bold(),
        scenario.directory,
        format_duration(scenario.duration_ms)
    )?;

    for step in &scenario.steps {
        let mark = if step.success { "ok".green() } else { "failed".red() };
        write!(
            w,
            "  {:<18} {:<6} {:>8}",
            step.step.to_string(),
            mark,
            format_duration(step.duration_ms)
        )?;
        if step.attempts > 1 {
            write!(w, "  ({} attempts)", step.attempts)?;
        }
        if let Some(changes) = &step.changes {
            write!(w, "  {changes}")?;
        }
        writeln!(w)?;
    }

    if let Outcome::Failed { step, reason } = &scenario.outcome {
        match step {
            Some(step) => writeln!(w, "  {} at {}: {}", "error".red(), step, reason)?,
            None => writeln!(w, "  {}: {}", "error".red(), reason)?,
        }
    }

    match &scenario.cleanup {
        CleanupStatus::Destroyed { resources: Some(n) } => {
            writeln!(w, "  cleanup: destroyed {n} resources")?
        }
        CleanupStatus::Destroyed { resources: None } => writeln!(w, "  cleanup: destroyed")?,
        CleanupStatus::Failed { reason } => {
            writeln!(w, "  cleanup: {} {}", "FAILED".red().bold(), reason)?
        }
        CleanupStatus::Skipped => writeln!(w, "  cleanup: skipped")?,
    }
    Ok(())
}

fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1_000.0)
    }
}
