//! 에러 타입 (설정, 시나리오, 도메인 크레이트 공통)

/// tfcheck 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TfcheckError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// terraform 실행 에러 (상세 내용은 `tfcheck-terraform`에서 변환됨)
    #[error("terraform error: {0}")]
    Terraform(String),

    /// 시나리오 실행 에러
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 시나리오 구성/선택 에러
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// 설정에 없는 시나리오 이름
    #[error("unknown scenario: {0}")]
    Unknown(String),

    /// 시나리오 디렉토리가 존재하지 않음
    #[error("scenario '{name}': directory not found: {directory}")]
    DirectoryNotFound { name: String, directory: String },

    /// 단계 실행 중 패닉 발생
    #[error("scenario '{name}': step panicked: {reason}")]
    Panicked { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: TfcheckError = ConfigError::InvalidValue {
            field: "terraform.binary".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, TfcheckError::Config(_)));
        assert!(err.to_string().contains("terraform.binary"));
    }

    #[test]
    fn scenario_error_display_includes_directory() {
        let err = ScenarioError::DirectoryNotFound {
            name: "cmk".to_owned(),
            directory: "examples/cmk".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cmk"));
        assert!(msg.contains("examples/cmk"));
    }

    #[test]
    fn io_error_converts_to_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TfcheckError = io.into();
        assert!(matches!(err, TfcheckError::Io(_)));
    }
}
