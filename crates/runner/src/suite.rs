//! Suite -- runs every selected scenario concurrently.

use std::sync::Arc;

use tracing::{error, info};

use tfcheck_core::config::TfcheckConfig;
use tfcheck_core::error::ScenarioError;
use tfcheck_core::types::Scenario;
use tfcheck_terraform::TerraformClient;

use crate::report::{Outcome, ScenarioReport, SuiteReport};
use crate::runner::ScenarioRunner;

/// An ordered set of scenarios sharing one terraform client.
pub struct Suite<C: TerraformClient> {
    runner: ScenarioRunner<C>,
    scenarios: Vec<Scenario>,
}

impl<C: TerraformClient> Suite<C> {
    pub fn new(client: Arc<C>, scenarios: Vec<Scenario>) -> Self {
        Self {
            runner: ScenarioRunner::new(client),
            scenarios,
        }
    }

    /// Builds the suite from the scenarios declared in the configuration.
    pub fn from_config(client: Arc<C>, config: &TfcheckConfig) -> Self {
        Self::new(client, config.scenarios())
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Restricts the suite to the named scenarios, keeping configuration order.
    ///
    /// An empty selection keeps every scenario.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::Unknown` for the first name that is not configured.
    pub fn select(&mut self, names: &[String]) -> Result<(), ScenarioError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.scenarios.iter().any(|s| &s.name == *name))
        {
            return Err(ScenarioError::Unknown(unknown.clone()));
        }
        self.scenarios.retain(|s| names.contains(&s.name));
        Ok(())
    }

    /// Runs every scenario in its own task and waits for all of them.
    ///
    /// A failing scenario never cancels the others. Reports come back in
    /// configuration order regardless of completion order.
    pub async fn run(self) -> SuiteReport {
        info!(scenarios = self.scenarios.len(), "starting suite");

        let handles: Vec<_> = self
            .scenarios
            .into_iter()
            .map(|scenario| {
                let runner = self.runner.clone();
                let name = scenario.name.clone();
                let directory = scenario.directory.clone();
                let handle = tokio::spawn(async move { runner.run(scenario).await });
                (name, directory, handle)
            })
            .collect();

        let mut scenarios = Vec::with_capacity(handles.len());
        for (name, directory, handle) in handles {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    // only reachable if the runner itself panicked outside the step task
                    error!(scenario = name.as_str(), error = %e, "scenario task failed");
                    let mut report = ScenarioReport::not_started(&name, &directory, e.to_string());
                    report.outcome = Outcome::failed(None, format!("scenario task failed: {e}"));
                    report
                }
            };
            scenarios.push(report);
        }

        let report = SuiteReport { scenarios };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            leaked = report.leaked().len(),
            "suite finished"
        );
        report
    }
}
