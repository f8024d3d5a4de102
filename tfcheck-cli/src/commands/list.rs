//! `tfcheck list` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use tfcheck_core::config::TfcheckConfig;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub fn execute(config: &TfcheckConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_listing(config);
    writer.render(&report)
}

fn build_listing(config: &TfcheckConfig) -> ScenarioListing {
    let scenarios = config
        .scenarios()
        .into_iter()
        .map(|s| ScenarioEntry {
            exists: s.directory.is_dir(),
            directory: s.directory.display().to_string(),
            vars: s.vars.len(),
            var_files: s.var_files.len(),
            name: s.name,
        })
        .collect();
    ScenarioListing { scenarios }
}

/// Configured scenarios.
#[derive(Serialize)]
pub struct ScenarioListing {
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    pub name: String,
    pub directory: String,
    /// Whether the directory currently exists
    pub exists: bool,
    pub vars: usize,
    pub var_files: usize,
}

impl Render for ScenarioListing {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{:<16} {:<8} Directory", "Name", "Exists")?;
        writeln!(w, "{}", "-".repeat(60))?;
        for entry in &self.scenarios {
            let exists = if entry.exists {
                "yes".green()
            } else {
                "no".red()
            };
            writeln!(w, "{:<16} {:<8} {}", entry.name, exists, entry.directory)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfcheck_core::config::ScenarioConfig;

    #[test]
    fn test_listing_marks_missing_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::create_dir(dir.path().join("default")).expect("mkdir");

        let mut config = TfcheckConfig::default();
        config.base_dir = dir.path().to_path_buf();
        config.scenarios = vec![
            ScenarioConfig::new("default", "default"),
            ScenarioConfig::new("cmk", "cmk"),
        ];

        let listing = build_listing(&config);
        assert_eq!(listing.scenarios.len(), 2);
        assert!(listing.scenarios[0].exists);
        assert!(!listing.scenarios[1].exists);
        assert!(listing.scenarios[1].directory.ends_with("cmk"));
    }

    #[test]
    fn test_listing_render_text() {
        colored::control::set_override(false);
        let listing = ScenarioListing {
            scenarios: vec![ScenarioEntry {
                name: "default".to_owned(),
                directory: "examples/default".to_owned(),
                exists: false,
                vars: 0,
                var_files: 0,
            }],
        };
        let mut buffer = Vec::new();
        listing.render_text(&mut buffer).expect("render succeeds");
        let output = String::from_utf8(buffer).expect("utf-8");
        assert!(output.contains("default"));
        assert!(output.contains("examples/default"));
        assert!(output.contains("no"));
    }
}
