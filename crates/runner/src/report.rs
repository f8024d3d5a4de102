//! Scenario and suite outcome reports.
//!
//! Reports are plain serialisable data so the CLI can render them as text
//! or JSON without knowing anything about how the run was executed.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use tfcheck_core::types::{ResourceChanges, Step};

/// Result of one lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub success: bool,
    pub duration_ms: u64,
    /// Number of tool invocations, including retries.
    pub attempts: u32,
    /// Resource changes reported by an apply step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<ResourceChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final outcome of a scenario's steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed {
        /// `None` when the scenario failed before any step ran.
        step: Option<Step>,
        reason: String,
    },
}

impl Outcome {
    pub fn failed(step: Option<Step>, reason: impl Into<String>) -> Self {
        Self::Failed {
            step,
            reason: reason.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// What happened to the scenario's provisioned resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupStatus {
    /// `destroy` succeeded.
    Destroyed {
        #[serde(skip_serializing_if = "Option::is_none")]
        resources: Option<u32>,
    },
    /// `destroy` failed; resources may be left behind.
    Failed { reason: String },
    /// No run context was created, so there was nothing to destroy.
    Skipped,
}

impl CleanupStatus {
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Full report for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub outcome: Outcome,
    pub steps: Vec<StepReport>,
    pub cleanup: CleanupStatus,
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Report for a scenario that never got a run context.
    pub fn not_started(name: &str, directory: &Path, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_owned(),
            directory: directory.display().to_string(),
            run_id: None,
            outcome: Outcome::failed(None, reason),
            steps: Vec::new(),
            cleanup: CleanupStatus::Skipped,
            duration_ms: 0,
        }
    }

    /// A scenario passes only when every step passed. Cleanup failures are
    /// reported separately and do not change the outcome.
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }

    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }
}

/// Reports for every scenario in a suite, in configuration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Scenarios whose cleanup failed and may have left resources behind.
    pub fn leaked(&self) -> Vec<&ScenarioReport> {
        self.scenarios
            .iter()
            .filter(|s| !s.cleanup.is_clean())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}
