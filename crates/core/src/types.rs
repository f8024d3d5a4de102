//! 워크스페이스 전역에서 사용되는 공통 도메인 타입
//!
//! [`Scenario`]는 하나의 terraform 예제 구성을 표현하며,
//! 생성 이후에는 변경되지 않습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 시나리오 생명주기 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// `terraform init`
    Init,
    /// `terraform validate`
    Validate,
    /// 첫 번째 `terraform apply`
    Apply,
    /// 두 번째 `terraform apply` (변경 없음 검증)
    IdempotentApply,
    /// `terraform destroy`
    Destroy,
}

impl Step {
    /// 메트릭 레이블 및 로그 필드용 고정 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Apply => "apply",
            Self::IdempotentApply => "idempotent_apply",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// terraform 요약 출력에서 추출한 리소스 변경 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChanges {
    /// 추가된 리소스 수
    pub added: u32,
    /// 변경된 리소스 수
    pub changed: u32,
    /// 삭제된 리소스 수
    pub destroyed: u32,
}

impl ResourceChanges {
    /// 모든 변경 수가 0이면 true
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.changed == 0 && self.destroyed == 0
    }
}

impl fmt::Display for ResourceChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} destroyed",
            self.added, self.changed, self.destroyed
        )
    }
}

/// 재시도 대상 에러 패턴
///
/// `pattern`은 terraform의 stdout+stderr 전체에 대해 매칭되는 정규식입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryableError {
    /// 정규식 패턴
    pub pattern: String,
    /// 사람이 읽을 수 있는 설명 (로그용)
    #[serde(default)]
    pub description: String,
}

impl RetryableError {
    pub fn new(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            description: description.into(),
        }
    }
}

/// 일시적 provider 에러에 대한 재시도 설정 (컴파일 전 형태)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// 재시도 대상 패턴 목록
    pub retryable_errors: Vec<RetryableError>,
    /// 최대 재시도 횟수 (최초 시도 제외)
    pub max_retries: u32,
    /// 재시도 간 대기 시간
    pub time_between_retries: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retryable_errors: default_retryable_errors(),
            max_retries: 3,
            time_between_retries: Duration::from_secs(5),
        }
    }
}

/// 기본 재시도 패턴 목록
///
/// registry 접근, 플러그인 핸드셰이크, 네트워크 계층의 일시적 실패만 포함합니다.
pub fn default_retryable_errors() -> Vec<RetryableError> {
    vec![
        RetryableError::new(
            ".*registry service is unreachable.*",
            "Failed to reach the Terraform registry",
        ),
        RetryableError::new(
            ".*Failed to query available provider packages.*",
            "Failed to retrieve provider packages due to transient network error",
        ),
        RetryableError::new(
            ".*Could not retrieve the list of available versions.*",
            "Failed to list provider versions due to transient network error",
        ),
        RetryableError::new(
            ".*could not query provider registry for.*",
            "Failed to query the provider registry",
        ),
        RetryableError::new(
            ".*Error installing provider.*",
            "Failed to install provider due to transient network error",
        ),
        RetryableError::new(
            ".*unable to verify signature.*",
            "Failed to verify provider signature due to transient network error",
        ),
        RetryableError::new(
            ".*unable to verify checksum.*",
            "Failed to verify provider checksum due to transient network error",
        ),
        RetryableError::new(
            ".*timeout while waiting for plugin to start.*",
            "Provider plugin did not start in time",
        ),
        RetryableError::new(
            ".*timed out waiting for server handshake.*",
            "Provider plugin handshake timed out",
        ),
        RetryableError::new(
            ".*connection reset by peer.*",
            "Connection reset by the remote endpoint",
        ),
        RetryableError::new(".*TLS handshake timeout.*", "TLS handshake timed out"),
        RetryableError::new(
            r".*Client\.Timeout exceeded while awaiting headers.*",
            "HTTP client timed out waiting for response headers",
        ),
    ]
}

/// 하나의 terraform 예제 구성
///
/// 시나리오당 한 번 생성되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// 시나리오 이름 (예: `"default"`, `"cmk"`)
    pub name: String,
    /// terraform 구성 디렉토리
    pub directory: PathBuf,
    /// 색상 출력 비활성화 여부 (`-no-color`)
    pub no_color: bool,
    /// 일시적 에러 재시도 설정
    pub retry: RetrySettings,
    /// 모든 호출에 전달할 추가 환경변수
    pub env: BTreeMap<String, String>,
    /// apply/destroy에 전달할 `-var` 값
    pub vars: BTreeMap<String, String>,
    /// apply/destroy에 전달할 `-var-file` 경로
    pub var_files: Vec<PathBuf>,
}

impl Scenario {
    /// 기본 재시도 설정과 색상 비활성화로 시나리오를 생성합니다.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            no_color: true,
            retry: RetrySettings::default(),
            env: BTreeMap::new(),
            vars: BTreeMap::new(),
            var_files: Vec::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}
