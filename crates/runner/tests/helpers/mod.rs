//! Shared test fixtures: a scripted terraform client and scenario directories.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Barrier;

use tfcheck_core::types::{RetrySettings, RetryableError, Scenario, Step};
use tfcheck_terraform::{CommandOutput, TerraformClient, TerraformCommand, TerraformError};

pub const APPLY_CREATED: &str = "azurerm_cognitive_account.this: Creating...\n\
    Apply complete! Resources: 3 added, 0 changed, 0 destroyed.";
pub const APPLY_NO_CHANGES: &str = "No changes. Your infrastructure matches the configuration.\n\
    Apply complete! Resources: 0 added, 0 changed, 0 destroyed.";
pub const APPLY_DRIFT: &str = "Apply complete! Resources: 0 added, 1 changed, 0 destroyed.";
pub const DESTROY_DONE: &str = "Destroy complete! Resources: 3 destroyed.";

#[derive(Clone)]
enum Response {
    Output(CommandOutput),
    Panic(String),
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub scenario: String,
    pub command: &'static str,
}

/// Terraform client that answers from per-scenario scripts.
///
/// Each `(scenario, command)` pair has a queue of responses; the last one
/// repeats once the queue is drained. Unscripted pairs behave like a healthy
/// configuration: the first apply creates resources and the second reports
/// no changes.
pub struct ScriptedTerraform {
    scripts: Mutex<HashMap<(String, &'static str), VecDeque<Response>>>,
    calls: Mutex<Vec<Call>>,
    init_barrier: Option<Arc<Barrier>>,
}

impl ScriptedTerraform {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            init_barrier: None,
        }
    }

    /// Queues a response for `command` in `scenario`.
    pub fn on(self, scenario: &str, command: TerraformCommand, output: CommandOutput) -> Self {
        self.push(scenario, command, Response::Output(output));
        self
    }

    /// Makes `command` in `scenario` panic when it is reached.
    pub fn panic_on(self, scenario: &str, command: TerraformCommand, message: &str) -> Self {
        self.push(scenario, command, Response::Panic(message.to_owned()));
        self
    }

    /// Every `init` waits until `parties` inits are in flight at once.
    pub fn with_init_barrier(mut self, parties: usize) -> Self {
        self.init_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    fn push(&self, scenario: &str, command: TerraformCommand, response: Response) {
        self.scripts
            .lock()
            .unwrap()
            .entry((scenario.to_owned(), command.name()))
            .or_default()
            .push_back(response);
    }

    /// Commands invoked for `scenario`, in order.
    pub fn calls_for(&self, scenario: &str) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.scenario == scenario)
            .map(|c| c.command)
            .collect()
    }

    pub fn count(&self, scenario: &str, command: TerraformCommand) -> usize {
        self.calls_for(scenario)
            .into_iter()
            .filter(|c| *c == command.name())
            .count()
    }

    fn next_response(&self, scenario: &str, command: TerraformCommand) -> Response {
        let mut scripts = self.scripts.lock().unwrap();
        let apply_count = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.scenario == scenario && c.command == "apply")
            .count();

        match scripts.get_mut(&(scenario.to_owned(), command.name())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Response::Output(healthy_output(command, apply_count)),
        }
    }
}

fn healthy_output(command: TerraformCommand, apply_count: usize) -> CommandOutput {
    match command {
        TerraformCommand::Init => CommandOutput::success("Terraform has been successfully initialized!"),
        TerraformCommand::Validate => CommandOutput::success("Success! The configuration is valid."),
        // apply_count includes the call in progress
        TerraformCommand::Apply if apply_count <= 1 => CommandOutput::success(APPLY_CREATED),
        TerraformCommand::Apply => CommandOutput::success(APPLY_NO_CHANGES),
        TerraformCommand::Destroy => CommandOutput::success(DESTROY_DONE),
    }
}

impl TerraformClient for ScriptedTerraform {
    async fn execute(
        &self,
        scenario: &Scenario,
        _step: Step,
        command: TerraformCommand,
    ) -> Result<CommandOutput, TerraformError> {
        self.calls.lock().unwrap().push(Call {
            scenario: scenario.name.clone(),
            command: command.name(),
        });

        if command == TerraformCommand::Init {
            if let Some(barrier) = &self.init_barrier {
                barrier.wait().await;
            }
        }

        // the locks are released before a scripted panic so cleanup can still record
        match self.next_response(&scenario.name, command) {
            Response::Output(output) => Ok(output),
            Response::Panic(message) => panic!("{message}"),
        }
    }
}

/// A scenario backed by a real (empty) directory under `root`.
pub fn scenario_in(root: &TempDir, name: &str) -> Scenario {
    let dir = root.path().join(name);
    std::fs::create_dir_all(&dir).unwrap();
    Scenario::new(name, dir).with_retry(fast_retry())
}

pub fn missing_scenario(root: &Path, name: &str) -> Scenario {
    Scenario::new(name, root.join("does-not-exist").join(name)).with_retry(fast_retry())
}

/// Registry outage retry policy with a short backoff.
pub fn fast_retry() -> RetrySettings {
    RetrySettings {
        retryable_errors: vec![RetryableError::new(
            ".*registry service is unreachable.*",
            "registry unreachable",
        )],
        max_retries: 2,
        time_between_retries: Duration::from_millis(5),
    }
}
