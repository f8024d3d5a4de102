//! 일시적 provider 에러 재시도 정책
//!
//! [`RetryPolicy`]는 [`RetrySettings`]의 패턴을 미리 컴파일하여 보관하고,
//! 실패한 terraform 출력이 재시도 대상인지 판단합니다.

use std::time::Duration;

use regex::Regex;

use tfcheck_core::types::{RetrySettings, RetryableError};

use crate::error::TerraformError;

/// 컴파일된 재시도 정책
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// (컴파일된 패턴, 원본 정의)
    patterns: Vec<(Regex, RetryableError)>,
    /// 최대 재시도 횟수 (최초 시도 제외)
    max_retries: u32,
    /// 재시도 간 대기 시간
    time_between_retries: Duration,
}

impl RetryPolicy {
    /// 설정의 모든 패턴을 컴파일합니다.
    ///
    /// 하나라도 컴파일에 실패하면 [`TerraformError::InvalidPattern`]을 반환합니다.
    pub fn compile(settings: &RetrySettings) -> Result<Self, TerraformError> {
        let mut patterns = Vec::with_capacity(settings.retryable_errors.len());
        for err in &settings.retryable_errors {
            let regex = Regex::new(&err.pattern).map_err(|e| TerraformError::InvalidPattern {
                pattern: err.pattern.clone(),
                reason: e.to_string(),
            })?;
            patterns.push((regex, err.clone()));
        }
        Ok(Self {
            patterns,
            max_retries: settings.max_retries,
            time_between_retries: settings.time_between_retries,
        })
    }

    /// 재시도하지 않는 정책
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            max_retries: 0,
            time_between_retries: Duration::ZERO,
        }
    }

    /// 출력에 매칭되는 첫 번째 재시도 패턴을 반환합니다.
    pub fn matching(&self, output: &str) -> Option<&RetryableError> {
        self.patterns
            .iter()
            .find(|(regex, _)| regex.is_match(output))
            .map(|(_, err)| err)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn time_between_retries(&self) -> Duration {
        self.time_between_retries
    }

    /// 등록된 패턴 수
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
