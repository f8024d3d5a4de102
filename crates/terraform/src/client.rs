//! terraform CLI abstraction for testability.
//!
//! The [`TerraformClient`] trait abstracts a single invocation of the
//! `terraform` binary, allowing production code to use [`CliTerraform`]
//! while tests substitute scripted clients.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │ TerraformExecutor │  (retry policy, logging, metrics)
//! └─────────┬─────────┘
//!           │
//!           ▼
//!   ┌─────────────────┐
//!   │ TerraformClient │ (trait)
//!   └─────────────────┘
//!        │        │
//!        ▼        ▼
//!   ┌────────┐ ┌──────┐
//!   │  Cli   │ │ Mock │
//!   └───┬────┘ └──────┘
//!       │
//!       ▼
//!   terraform binary
//! ```
//!
//! A client never interprets the exit code: a non-zero exit is returned as a
//! regular [`CommandOutput`]. Only failures to run the process at all (spawn
//! errors, timeouts) are reported as [`TerraformError`].

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

use tfcheck_core::types::{Scenario, Step};

use crate::command::{CommandOutput, TerraformCommand};
use crate::error::TerraformError;

/// Trait abstracting one `terraform` invocation.
///
/// The trait is `Send + Sync + 'static` so a single client can be shared
/// across scenario tasks behind an `Arc`.
pub trait TerraformClient: Send + Sync + 'static {
    /// Runs `command` inside the scenario directory.
    ///
    /// `step` identifies the lifecycle step for timeout errors and logs; the
    /// same command (`apply`) serves more than one step.
    ///
    /// # Errors
    ///
    /// - `TerraformError::Spawn`: the binary could not be started
    /// - `TerraformError::Timeout`: the process did not finish in time and was killed
    fn execute(
        &self,
        scenario: &Scenario,
        step: Step,
        command: TerraformCommand,
    ) -> impl Future<Output = Result<CommandOutput, TerraformError>> + Send;
}

/// Production client that spawns the `terraform` binary.
///
/// Each invocation runs with stdin closed, inherits the parent environment
/// plus the scenario's extra variables, and is killed if it exceeds the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct CliTerraform {
    binary: PathBuf,
    timeout: Duration,
}

impl CliTerraform {
    /// Creates a client for the given binary (name on `PATH` or absolute path).
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TerraformClient for CliTerraform {
    async fn execute(
        &self,
        scenario: &Scenario,
        step: Step,
        command: TerraformCommand,
    ) -> Result<CommandOutput, TerraformError> {
        let args = command.args(scenario);
        debug!(
            scenario = scenario.name.as_str(),
            step = step.as_str(),
            binary = %self.binary.display(),
            args = ?args,
            "spawning terraform"
        );

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(&args)
            .current_dir(&scenario.directory)
            .envs(&scenario.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| TerraformError::Spawn {
            binary: self.binary.display().to_string(),
            reason: e.to_string(),
        })?;

        // timeout 시 future가 drop되면서 kill_on_drop으로 프로세스가 종료됨
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_elapsed| TerraformError::Timeout {
                step,
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| TerraformError::Spawn {
                binary: self.binary.display().to_string(),
                reason: format!("failed to collect output: {e}"),
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// 테스트용 Mock terraform 클라이언트
///
/// 명령별로 미리 정해둔 출력을 순서대로 반환합니다.
/// 큐가 비면 마지막 출력을 반복합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockTerraform {
    responses: std::sync::Mutex<
        std::collections::HashMap<&'static str, std::collections::VecDeque<CommandOutput>>,
    >,
    timeouts: std::sync::Mutex<std::collections::HashSet<&'static str>>,
    calls: std::sync::Mutex<Vec<&'static str>>,
}

#[cfg(test)]
impl MockTerraform {
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령에 대한 응답을 큐에 추가합니다.
    pub fn respond(self, command: TerraformCommand, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.name())
            .or_default()
            .push_back(output);
        self
    }

    /// 명령이 항상 타임아웃되도록 설정합니다.
    pub fn time_out(self, command: TerraformCommand) -> Self {
        self.timeouts.lock().unwrap().insert(command.name());
        self
    }

    /// 지금까지 호출된 명령 이름 목록
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl TerraformClient for MockTerraform {
    async fn execute(
        &self,
        _scenario: &Scenario,
        step: Step,
        command: TerraformCommand,
    ) -> Result<CommandOutput, TerraformError> {
        self.calls.lock().unwrap().push(command.name());
        if self.timeouts.lock().unwrap().contains(command.name()) {
            return Err(TerraformError::Timeout {
                step,
                timeout_secs: 1,
            });
        }
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.entry(command.name()).or_default();
        let output = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_else(|| CommandOutput::success(""))
        };
        Ok(output)
    }
}
