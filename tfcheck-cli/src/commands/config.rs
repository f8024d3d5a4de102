//! `tfcheck config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tfcheck_core::config::{ScenarioConfig, TfcheckConfig};

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
///
/// `config_path` is only used to label the report. `loaded` is the result of
/// loading the effective configuration; when `-c` was not given it falls back
/// to defaults if `tfcheck.toml` is absent.
pub fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    loaded: Result<TfcheckConfig, CliError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, loaded, writer),
        ConfigAction::Show { section } => execute_show(config_path, loaded, section, writer),
    }
}

/// Load and validate the configuration, reporting any error.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails.
fn execute_validate(
    config_path: Option<&Path>,
    loaded: Result<TfcheckConfig, CliError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = source_label(config_path);
    info!(source = source.as_str(), "validating configuration");

    let report = match loaded {
        Ok(config) => ConfigValidationReport {
            source,
            valid: true,
            scenarios: config.scenarios.len(),
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source,
            valid: false,
            scenarios: 0,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Config` if loading fails or `CliError::Command` if the
/// section name is unknown.
fn execute_show(
    config_path: Option<&Path>,
    loaded: Result<TfcheckConfig, CliError>,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = source_label(config_path);
    info!(source = source.as_str(), "showing configuration");

    let config = loaded?;

    let config_toml = match section.as_deref() {
        None => to_toml(&config),
        Some("general") => to_toml(&config.general),
        Some("terraform") => to_toml(&config.terraform),
        Some("scenarios") => to_toml(&ScenariosSection {
            scenarios: &config.scenarios,
        }),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, terraform, scenarios)"
            )));
        }
    };

    writer.render(&ConfigReport {
        source,
        section,
        config_toml,
    })
}

fn source_label(config_path: Option<&Path>) -> String {
    match config_path {
        Some(path) => path.display().to_string(),
        None => format!("{} (defaults if absent)", crate::DEFAULT_CONFIG_FILE),
    }
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {e})"))
}

/// TOML needs a table at the top level, so the scenario list is wrapped.
#[derive(Serialize)]
struct ScenariosSection<'a> {
    scenarios: &'a [ScenarioConfig],
}

/// Configuration display report.
///
/// `config_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Number of configured scenarios (0 if invalid)
    pub scenarios: usize,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
            writeln!(w, "  Scenarios: {}", self.scenarios)?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<T: Render>(payload: &T) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        payload.render_text(&mut buffer).expect("render succeeds");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_config_report_render_text_section() {
        let output = render(&ConfigReport {
            source: "tfcheck.toml".to_owned(),
            section: Some("terraform".to_owned()),
            config_toml: "binary = \"terraform\"\n".to_owned(),
        });
        assert!(output.contains("[terraform]"));
        assert!(output.contains("binary = \"terraform\""));
    }

    #[test]
    fn test_config_report_json_skips_toml() {
        let report = ConfigReport {
            source: "tfcheck.toml".to_owned(),
            section: None,
            config_toml: "x = 1".to_owned(),
        };
        let parsed = serde_json::to_value(&report).expect("serializes");
        assert_eq!(parsed["source"], "tfcheck.toml");
        assert!(parsed.get("section").is_none());
        assert!(parsed.get("config_toml").is_none());
    }

    #[test]
    fn test_validation_report_render_invalid() {
        let output = render(&ConfigValidationReport {
            source: "bad.toml".to_owned(),
            valid: false,
            scenarios: 0,
            errors: vec!["duplicate scenario name: cmk".to_owned()],
        });
        assert!(output.contains("INVALID"));
        assert!(output.contains("duplicate scenario name: cmk"));
    }

    #[test]
    fn test_scenarios_section_serializes_as_array_of_tables() {
        let config = TfcheckConfig::default();
        let toml = to_toml(&ScenariosSection {
            scenarios: &config.scenarios,
        });
        assert!(toml.contains("[[scenarios]]"), "got: {toml}");
        assert!(toml.contains("name = \"cmk\""));
    }

    #[test]
    fn test_full_config_serializes() {
        let toml = to_toml(&TfcheckConfig::default());
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[terraform]"));
        assert!(toml.contains("max_retries = 3"));
    }
}
