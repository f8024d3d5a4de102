//! Run context -- a scenario's live handle with its cleanup already scheduled.
//!
//! A [`RunContext`] is armed the moment it is created: from then on the
//! scenario owns whatever `terraform apply` provisions, and the only way to
//! release the context is [`RunContext::destroy`], which consumes it. A
//! second destroy is therefore unrepresentable. A context that is dropped
//! while still armed logs the directory whose resources may have leaked.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use tfcheck_core::metrics as m;
use tfcheck_core::types::Scenario;
use tfcheck_terraform::{TerraformClient, TerraformError, TerraformExecutor, parse_destroyed_count};

use crate::report::CleanupStatus;

/// Live handle for one scenario run.
pub struct RunContext<C: TerraformClient> {
    run_id: Uuid,
    executor: Arc<TerraformExecutor<C>>,
    armed: bool,
}

impl<C: TerraformClient> RunContext<C> {
    /// Compiles the scenario's retry policy and arms cleanup.
    ///
    /// # Errors
    ///
    /// Returns `TerraformError::InvalidPattern` if a retry pattern does not compile.
    pub fn create(client: Arc<C>, scenario: Scenario) -> Result<Self, TerraformError> {
        let executor = TerraformExecutor::new(client, scenario)?;
        let run_id = Uuid::new_v4();
        info!(
            scenario = executor.scenario().name.as_str(),
            run_id = %run_id,
            directory = %executor.scenario().directory.display(),
            retry_patterns = executor.policy().len(),
            "run context created, cleanup scheduled"
        );
        Ok(Self {
            run_id,
            executor: Arc::new(executor),
            armed: true,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn scenario(&self) -> &Scenario {
        self.executor.scenario()
    }

    /// Shared executor for the step task.
    pub fn executor(&self) -> Arc<TerraformExecutor<C>> {
        Arc::clone(&self.executor)
    }

    /// Destroys everything the scenario provisioned.
    ///
    /// Runs `terraform destroy` even if no apply ever succeeded; destroying
    /// an empty state is a no-op for the tool. Failures are reported, never
    /// propagated, so they cannot mask the scenario's own outcome.
    pub async fn destroy(mut self) -> CleanupStatus {
        self.armed = false;
        let name = self.executor.scenario().name.clone();

        match self.executor.destroy().await {
            Ok(executed) => {
                let resources = parse_destroyed_count(&executed.output.stdout);
                info!(
                    scenario = name.as_str(),
                    run_id = %self.run_id,
                    resources = ?resources,
                    attempts = executed.attempts,
                    "scenario resources destroyed"
                );
                CleanupStatus::Destroyed { resources }
            }
            Err(e) => {
                error!(
                    scenario = name.as_str(),
                    run_id = %self.run_id,
                    error = %e,
                    "destroy failed, resources may be left behind"
                );
                metrics::counter!(m::CLEANUP_FAILURES_TOTAL, m::LABEL_SCENARIO => name)
                    .increment(1);
                CleanupStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl<C: TerraformClient> Drop for RunContext<C> {
    fn drop(&mut self) {
        if self.armed {
            error!(
                scenario = self.executor.scenario().name.as_str(),
                run_id = %self.run_id,
                directory = %self.executor.scenario().directory.display(),
                "run context dropped without destroy, resources may have leaked"
            );
        }
    }
}
