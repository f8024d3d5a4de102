//! Scenario runner -- drives one scenario through the fixed lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! configure -> schedule cleanup -> init -> validate -> apply -> apply (expect no changes)
//!                    |                                                   |
//!                    +------------------- destroy <----------------------+
//!                              (always, exactly once)
//! ```
//!
//! The steps run in their own task. A panic inside a step therefore reaches
//! the runner as a `JoinError` instead of unwinding past the cleanup, and the
//! destroy is still awaited.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{Instrument, error, info, info_span};

use tfcheck_core::error::ScenarioError;
use tfcheck_core::metrics as m;
use tfcheck_core::types::{ResourceChanges, Scenario, Step};
use tfcheck_terraform::{Executed, TerraformClient, TerraformError, TerraformExecutor};

use crate::context::RunContext;
use crate::report::{Outcome, ScenarioReport, StepReport};

/// Runs scenarios against a shared terraform client.
pub struct ScenarioRunner<C: TerraformClient> {
    client: Arc<C>,
}

impl<C: TerraformClient> Clone for ScenarioRunner<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: TerraformClient> ScenarioRunner<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Runs one scenario to completion and reports what happened.
    ///
    /// Never returns an error: every failure, including a panic inside a
    /// step, is captured in the report.
    pub async fn run(&self, scenario: Scenario) -> ScenarioReport {
        let started = Instant::now();
        let name = scenario.name.clone();
        let directory = scenario.directory.clone();

        // 1. configure
        if !directory.is_dir() {
            let err = ScenarioError::DirectoryNotFound {
                name: name.clone(),
                directory: directory.display().to_string(),
            };
            error!(scenario = name.as_str(), error = %err, "scenario not started");
            record_result(false);
            return ScenarioReport::not_started(&name, &directory, err.to_string());
        }

        // 2. schedule cleanup
        let context = match RunContext::create(Arc::clone(&self.client), scenario) {
            Ok(context) => context,
            Err(e) => {
                error!(scenario = name.as_str(), error = %e, "scenario not started");
                record_result(false);
                return ScenarioReport::not_started(&name, &directory, e.to_string());
            }
        };
        let run_id = context.run_id();
        let span = info_span!("scenario", name = name.as_str(), run_id = %run_id);

        // 3-5. init, validate, apply and verify idempotent
        let journal = Arc::new(Mutex::new(Journal::default()));
        let task = tokio::spawn(
            run_steps(context.executor(), Arc::clone(&journal)).instrument(span.clone()),
        );
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                let step = lock(&journal).current;
                let err = ScenarioError::Panicked {
                    name: name.clone(),
                    reason: panic_reason(join_err),
                };
                error!(parent: &span, step = ?step, error = %err, "step task aborted");
                Outcome::failed(step, err.to_string())
            }
        };

        let cleanup = context.destroy().instrument(span.clone()).await;

        let steps = std::mem::take(&mut lock(&journal).steps);
        let passed = outcome.is_passed();
        record_result(passed);
        match &outcome {
            Outcome::Passed => info!(parent: &span, "scenario passed"),
            Outcome::Failed { step, reason } => {
                error!(parent: &span, step = ?step, reason = reason.as_str(), "scenario failed")
            }
        }

        ScenarioReport {
            name,
            directory: directory.display().to_string(),
            run_id: Some(run_id),
            outcome,
            steps,
            cleanup,
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Steps completed so far, plus the step in progress.
#[derive(Default)]
struct Journal {
    steps: Vec<StepReport>,
    current: Option<Step>,
}

async fn run_steps<C: TerraformClient>(
    executor: Arc<TerraformExecutor<C>>,
    journal: Arc<Mutex<Journal>>,
) -> Outcome {
    let recorder = Recorder { journal: &journal };

    if let Err(outcome) = recorder.step(Step::Init, executor.init()).await {
        return outcome;
    }
    if let Err(outcome) = recorder.step(Step::Validate, executor.validate()).await {
        return outcome;
    }
    if let Err(outcome) = recorder.step(Step::Apply, executor.apply(Step::Apply)).await {
        return outcome;
    }

    let step = Step::IdempotentApply;
    match recorder.reapply(executor.apply(step)).await {
        Ok(changes) if changes.is_empty() => Outcome::Passed,
        Ok(changes) => Outcome::failed(
            Some(step),
            format!("configuration is not idempotent: second apply reported {changes}"),
        ),
        Err(outcome) => outcome,
    }
}

struct Recorder<'a> {
    journal: &'a Mutex<Journal>,
}

impl Recorder<'_> {
    async fn step<F>(&self, step: Step, fut: F) -> Result<Executed, Outcome>
    where
        F: Future<Output = Result<Executed, TerraformError>>,
    {
        lock(self.journal).current = Some(step);
        let started = Instant::now();
        let result = fut.await;
        let report = match &result {
            Ok(executed) => StepReport {
                step,
                success: true,
                duration_ms: elapsed_ms(started),
                attempts: executed.attempts,
                // the first apply's summary is informational only
                changes: (step == Step::Apply)
                    .then(|| executed.apply_changes(step).ok())
                    .flatten(),
                error: None,
            },
            Err(e) => failed_step(step, started, e),
        };
        self.push(report);
        result.map_err(|e| Outcome::failed(Some(step), e.to_string()))
    }

    /// Second apply. Its summary must parse, otherwise the step fails.
    async fn reapply<F>(&self, fut: F) -> Result<ResourceChanges, Outcome>
    where
        F: Future<Output = Result<Executed, TerraformError>>,
    {
        let step = Step::IdempotentApply;
        lock(self.journal).current = Some(step);
        let started = Instant::now();
        let result = fut
            .await
            .and_then(|executed| Ok((executed.apply_changes(step)?, executed.attempts)));
        let report = match &result {
            Ok((changes, attempts)) => StepReport {
                step,
                success: true,
                duration_ms: elapsed_ms(started),
                attempts: *attempts,
                changes: Some(*changes),
                error: None,
            },
            Err(e) => failed_step(step, started, e),
        };
        self.push(report);
        result
            .map(|(changes, _)| changes)
            .map_err(|e| Outcome::failed(Some(step), e.to_string()))
    }

    fn push(&self, report: StepReport) {
        let mut journal = lock(self.journal);
        journal.steps.push(report);
        journal.current = None;
    }
}

fn failed_step(step: Step, started: Instant, err: &TerraformError) -> StepReport {
    let attempts = match err {
        TerraformError::RetriesExhausted { attempts, .. } => *attempts,
        _ => 1,
    };
    StepReport {
        step,
        success: false,
        duration_ms: elapsed_ms(started),
        attempts,
        changes: None,
        error: Some(err.to_string()),
    }
}

fn lock(journal: &Mutex<Journal>) -> MutexGuard<'_, Journal> {
    // steps recorded before a panic are still valid
    journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_reason(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "step task was cancelled".to_owned();
    }
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_owned()
            }
        }
        Err(err) => err.to_string(),
    }
}

fn record_result(passed: bool) {
    let result = if passed { "passed" } else { "failed" };
    metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_RESULT => result).increment(1);
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
