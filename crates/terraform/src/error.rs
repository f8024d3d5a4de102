//! terraform 실행 에러 타입
//!
//! [`TerraformError`]는 terraform 프로세스 실행, 재시도, 출력 파싱 과정의
//! 모든 에러를 표현합니다. `From<TerraformError> for TfcheckError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use tfcheck_core::error::TfcheckError;
use tfcheck_core::types::Step;

/// terraform 실행 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum TerraformError {
    /// 프로세스 실행 실패 (바이너리 없음, 권한 오류 등)
    #[error("failed to spawn '{binary}': {reason}")]
    Spawn {
        /// 실행하려던 바이너리
        binary: String,
        /// 실패 사유
        reason: String,
    },

    /// 명령 타임아웃
    #[error("terraform {step} timed out after {timeout_secs}s")]
    Timeout {
        /// 실행 중이던 단계
        step: Step,
        /// 적용된 타임아웃 (초)
        timeout_secs: u64,
    },

    /// 재시도 대상이 아닌 실패
    #[error("terraform {step} failed (exit code {}): {output}", display_exit_code(.exit_code))]
    CommandFailed {
        /// 실패한 단계
        step: Step,
        /// 종료 코드 (시그널로 종료된 경우 None)
        exit_code: Option<i32>,
        /// 출력 끝부분
        output: String,
    },

    /// 재시도 대상 에러였으나 최대 재시도 횟수 초과
    #[error("terraform {step} failed after {attempts} attempts ({description}): {output}")]
    RetriesExhausted {
        /// 실패한 단계
        step: Step,
        /// 총 시도 횟수
        attempts: u32,
        /// 마지막으로 매칭된 패턴 설명
        description: String,
        /// 마지막 출력 끝부분
        output: String,
    },

    /// 재시도 패턴 컴파일 실패
    #[error("invalid retryable error pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// 문제가 된 패턴
        pattern: String,
        /// 컴파일 에러
        reason: String,
    },

    /// 요약 출력 파싱 실패
    #[error("could not parse terraform {step} output: {reason}")]
    UnparsableOutput {
        /// 대상 단계
        step: Step,
        /// 실패 사유
        reason: String,
    },
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none".to_owned(),
    }
}

impl From<TerraformError> for TfcheckError {
    fn from(err: TerraformError) -> Self {
        TfcheckError::Terraform(err.to_string())
    }
}
