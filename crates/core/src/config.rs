//! tfcheck.toml 로딩 및 검증
//!
//! [`TfcheckConfig`]는 로깅, terraform 실행, 시나리오 목록을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TFCHECK_TERRAFORM_BINARY=/usr/local/bin/terraform` 형식)
//! 3. 설정 파일 (`tfcheck.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tfcheck_core::error::TfcheckError> {
//! use tfcheck_core::config::TfcheckConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = TfcheckConfig::load("tfcheck.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = TfcheckConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TfcheckError};
use crate::types::{RetrySettings, RetryableError, Scenario, default_retryable_errors};

/// tfcheck 통합 설정
///
/// `tfcheck.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfcheckConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// terraform 실행 설정
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// 시나리오 목록
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<ScenarioConfig>,
    /// 상대 경로 시나리오 디렉토리의 기준 경로 (설정 파일 위치)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for TfcheckConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            terraform: TerraformConfig::default(),
            scenarios: default_scenarios(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl TfcheckConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TfcheckError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값을 사용합니다.
    ///
    /// 기본 설정 파일 경로를 명시하지 않은 CLI 실행에서 사용됩니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, TfcheckError> {
        let mut config = Self::from_file_or_default(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값을 반환합니다 (오버라이드, 검증 없음).
    pub async fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, TfcheckError> {
        match Self::from_file(path).await {
            Err(TfcheckError::Config(ConfigError::FileNotFound { .. })) => Ok(Self::default()),
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    ///
    /// 검증은 모든 오버라이드가 적용된 뒤 호출자가 수행합니다.
    /// 상대 경로 시나리오 디렉토리는 설정 파일이 위치한 디렉토리를 기준으로 합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TfcheckError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TfcheckError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TfcheckError::Io(e)
            }
        })?;
        let mut config = Self::parse(&content)?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TfcheckError> {
        let mut config: Self = toml::from_str(toml_str).map_err(|e| {
            TfcheckError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })?;
        config.base_dir = PathBuf::from(".");
        Ok(config)
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TFCHECK_{SECTION}_{FIELD}`
    /// 예: `TFCHECK_TERRAFORM_MAX_RETRIES=5`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TFCHECK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TFCHECK_GENERAL_LOG_FORMAT");

        // Terraform
        override_string(&mut self.terraform.binary, "TFCHECK_TERRAFORM_BINARY");
        override_bool(&mut self.terraform.no_color, "TFCHECK_TERRAFORM_NO_COLOR");
        override_u32(
            &mut self.terraform.max_retries,
            "TFCHECK_TERRAFORM_MAX_RETRIES",
        );
        override_u64(
            &mut self.terraform.time_between_retries_secs,
            "TFCHECK_TERRAFORM_TIME_BETWEEN_RETRIES_SECS",
        );
        override_u64(
            &mut self.terraform.command_timeout_secs,
            "TFCHECK_TERRAFORM_COMMAND_TIMEOUT_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TfcheckError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.terraform.binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "terraform.binary".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.terraform.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "terraform.command_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        // 재시도 패턴은 실행 시점이 아니라 로딩 시점에 컴파일 가능 여부를 확인
        for (idx, err) in self.terraform.retryable_errors.iter().enumerate() {
            if let Err(e) = regex::Regex::new(&err.pattern) {
                return Err(ConfigError::InvalidValue {
                    field: format!("terraform.retryable_errors[{idx}].pattern"),
                    reason: e.to_string(),
                }
                .into());
            }
        }

        let mut seen = HashSet::new();
        for (idx, scenario) in self.scenarios.iter().enumerate() {
            if scenario.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("scenarios[{idx}].name"),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
            if scenario.directory.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("scenarios[{idx}].directory"),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("scenarios[{idx}].name"),
                    reason: format!("duplicate scenario name '{}'", scenario.name),
                }
                .into());
            }
        }

        Ok(())
    }

    /// 설정된 재시도 정책
    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            retryable_errors: self.terraform.retryable_errors.clone(),
            max_retries: self.terraform.max_retries,
            time_between_retries: Duration::from_secs(self.terraform.time_between_retries_secs),
        }
    }

    /// 설정된 모든 시나리오를 생성합니다.
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .map(|s| self.build_scenario(s))
            .collect()
    }

    /// 시나리오 설정 하나를 불변 [`Scenario`]로 변환합니다.
    pub fn build_scenario(&self, config: &ScenarioConfig) -> Scenario {
        let directory = if config.directory.is_absolute() {
            config.directory.clone()
        } else {
            self.base_dir.join(&config.directory)
        };
        let var_files = config
            .var_files
            .iter()
            .map(|f| {
                if f.is_absolute() {
                    f.clone()
                } else {
                    self.base_dir.join(f)
                }
            })
            .collect();

        Scenario {
            name: config.name.clone(),
            directory,
            no_color: self.terraform.no_color,
            retry: self.retry_settings(),
            env: config.env.clone(),
            vars: config.vars.clone(),
            var_files,
        }
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// terraform 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// terraform 실행 파일 경로 또는 이름
    pub binary: String,
    /// `-no-color` 전달 여부
    pub no_color: bool,
    /// 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 간 대기 시간 (초)
    pub time_between_retries_secs: u64,
    /// 명령 1회 실행 타임아웃 (초)
    pub command_timeout_secs: u64,
    /// 재시도 대상 에러 패턴
    pub retryable_errors: Vec<RetryableError>,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_owned(),
            no_color: true,
            max_retries: 3,
            time_between_retries_secs: 5,
            command_timeout_secs: 3600,
            retryable_errors: default_retryable_errors(),
        }
    }
}

/// 시나리오 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// 시나리오 이름
    pub name: String,
    /// terraform 구성 디렉토리
    pub directory: PathBuf,
    /// 추가 환경변수
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// `-var` 값
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    /// `-var-file` 경로
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub var_files: Vec<PathBuf>,
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            env: BTreeMap::new(),
            vars: BTreeMap::new(),
            var_files: Vec::new(),
        }
    }
}

/// 기본 시나리오: `default`, `cmk`
fn default_scenarios() -> Vec<ScenarioConfig> {
    vec![
        ScenarioConfig::new("default", "examples/default"),
        ScenarioConfig::new("cmk", "examples/cmk"),
    ]
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
