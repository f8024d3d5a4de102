//! 단계 실행기 -- 재시도 정책을 적용하여 terraform 명령을 실행합니다.
//!
//! [`TerraformExecutor`]는 시나리오 하나에 묶여 있으며, 각 단계 메서드는
//! 실패 출력이 [`RetryPolicy`]의 패턴에 매칭될 때만 재시도합니다.
//! 매칭되지 않는 실패와 클라이언트 에러(타임아웃, 실행 실패)는 즉시 반환됩니다.

use std::sync::Arc;

use tracing::{info, warn};

use tfcheck_core::metrics as m;
use tfcheck_core::types::{ResourceChanges, Scenario, Step};

use crate::client::TerraformClient;
use crate::command::{CommandOutput, TerraformCommand};
use crate::error::TerraformError;
use crate::output::parse_apply_changes;
use crate::retry::RetryPolicy;

/// 에러 메시지에 포함할 출력 줄 수
const ERROR_OUTPUT_LINES: usize = 20;

/// 성공한 단계 실행 결과
#[derive(Debug, Clone)]
pub struct Executed {
    /// 마지막 (성공한) 실행의 출력
    pub output: CommandOutput,
    /// 총 시도 횟수 (최초 시도 포함)
    pub attempts: u32,
}

impl Executed {
    /// apply 요약에서 리소스 변경 수를 추출합니다.
    pub fn apply_changes(&self, step: Step) -> Result<ResourceChanges, TerraformError> {
        parse_apply_changes(step, &self.output.stdout)
    }
}

/// 시나리오 하나에 대한 terraform 실행기
pub struct TerraformExecutor<C: TerraformClient> {
    /// terraform 클라이언트
    client: Arc<C>,
    /// 대상 시나리오
    scenario: Scenario,
    /// 컴파일된 재시도 정책
    policy: RetryPolicy,
}

impl<C: TerraformClient> TerraformExecutor<C> {
    /// 시나리오의 재시도 설정을 컴파일하여 실행기를 생성합니다.
    pub fn new(client: Arc<C>, scenario: Scenario) -> Result<Self, TerraformError> {
        let policy = RetryPolicy::compile(&scenario.retry)?;
        Ok(Self {
            client,
            scenario,
            policy,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `terraform init`
    pub async fn init(&self) -> Result<Executed, TerraformError> {
        self.run(Step::Init, TerraformCommand::Init).await
    }

    /// `terraform validate`
    pub async fn validate(&self) -> Result<Executed, TerraformError> {
        self.run(Step::Validate, TerraformCommand::Validate).await
    }

    /// `terraform apply`
    ///
    /// `step`은 첫 번째 apply(`Apply`)와 재적용(`IdempotentApply`)을 구분합니다.
    pub async fn apply(&self, step: Step) -> Result<Executed, TerraformError> {
        self.run(step, TerraformCommand::Apply).await
    }

    /// `terraform destroy`
    pub async fn destroy(&self) -> Result<Executed, TerraformError> {
        self.run(Step::Destroy, TerraformCommand::Destroy).await
    }

    /// 재시도 로직을 포함한 명령 실행
    async fn run(&self, step: Step, command: TerraformCommand) -> Result<Executed, TerraformError> {
        let started = std::time::Instant::now();
        let result = self.run_with_retry(step, command).await;
        metrics::histogram!(m::STEP_DURATION_SECONDS, m::LABEL_STEP => step.as_str())
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn run_with_retry(
        &self,
        step: Step,
        command: TerraformCommand,
    ) -> Result<Executed, TerraformError> {
        let max_attempts = self.policy.max_retries().saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(
                scenario = self.scenario.name.as_str(),
                step = step.as_str(),
                attempt = attempt,
                "running terraform {command}"
            );

            let output = self
                .client
                .execute(&self.scenario, step, command)
                .await?;

            if output.is_success() {
                return Ok(Executed {
                    output,
                    attempts: attempt,
                });
            }

            let combined = output.combined();
            let Some(matched) = self.policy.matching(&combined) else {
                return Err(TerraformError::CommandFailed {
                    step,
                    exit_code: output.exit_code,
                    output: output.tail(ERROR_OUTPUT_LINES),
                });
            };

            if attempt >= max_attempts {
                return Err(TerraformError::RetriesExhausted {
                    step,
                    attempts: attempt,
                    description: matched.description.clone(),
                    output: output.tail(ERROR_OUTPUT_LINES),
                });
            }

            let backoff = self.policy.time_between_retries();
            warn!(
                scenario = self.scenario.name.as_str(),
                step = step.as_str(),
                attempt = attempt,
                pattern = matched.pattern.as_str(),
                description = matched.description.as_str(),
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                "transient terraform error, retrying"
            );
            metrics::counter!(m::TERRAFORM_RETRIES_TOTAL, m::LABEL_STEP => step.as_str())
                .increment(1);
            tokio::time::sleep(backoff).await;
        }
    }
}
