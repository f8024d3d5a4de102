//! tfcheck.toml 통합 설정 테스트
//!
//! - tfcheck.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 / 상대 경로 해석 테스트

use std::path::PathBuf;
use std::time::Duration;

use tfcheck_core::config::TfcheckConfig;
use tfcheck_core::error::{ConfigError, TfcheckError};
use tfcheck_core::types::default_retryable_errors;

const EXAMPLE: &str = include_str!("../../../tfcheck.toml.example");

// =============================================================================
// tfcheck.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let config = TfcheckConfig::parse(EXAMPLE).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.terraform.binary, "terraform");
    assert_eq!(config.terraform.max_retries, 3);
    assert_eq!(config.terraform.retryable_errors.len(), 5);
}

#[test]
fn example_config_declares_both_scenarios() {
    let config = TfcheckConfig::parse(EXAMPLE).expect("should parse");
    let names: Vec<_> = config.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["default", "cmk"]);
    assert_eq!(config.scenarios[1].directory, PathBuf::from("examples/cmk"));
}

#[test]
fn example_config_matches_code_defaults() {
    let example = TfcheckConfig::parse(EXAMPLE).expect("should parse");
    let defaults = TfcheckConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.terraform.no_color, defaults.terraform.no_color);
    assert_eq!(
        example.terraform.time_between_retries_secs,
        defaults.terraform.time_between_retries_secs
    );
    assert_eq!(
        example.terraform.command_timeout_secs,
        defaults.terraform.command_timeout_secs
    );
    assert_eq!(example.retry_settings().time_between_retries, Duration::from_secs(5));
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_terraform_only_keeps_default_scenarios() {
    let config = TfcheckConfig::parse(
        r#"
[terraform]
binary = "/opt/terraform/bin/terraform"
"#,
    )
    .expect("should parse");

    assert_eq!(config.terraform.binary, "/opt/terraform/bin/terraform");
    assert_eq!(config.scenarios.len(), 2);
    assert_eq!(
        config.terraform.retryable_errors,
        default_retryable_errors()
    );
}

#[test]
fn scenario_inputs_are_parsed() {
    let config = TfcheckConfig::parse(
        r#"
[[scenarios]]
name = "cmk"
directory = "examples/cmk"
var_files = ["cmk.tfvars"]

[scenarios.vars]
location = "westeurope"

[scenarios.env]
ARM_SUBSCRIPTION_ID = "sub-123"
"#,
    )
    .expect("should parse");

    let scenario = &config.scenarios()[0];
    assert_eq!(scenario.vars.get("location").map(String::as_str), Some("westeurope"));
    assert_eq!(scenario.env.get("ARM_SUBSCRIPTION_ID").map(String::as_str), Some("sub-123"));
    assert_eq!(scenario.var_files, vec![PathBuf::from("./cmk.tfvars")]);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let original = std::env::var("TFCHECK_TERRAFORM_MAX_RETRIES").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("TFCHECK_TERRAFORM_MAX_RETRIES", "7");
    }

    let mut config = TfcheckConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();
    let result = config.terraform.max_retries;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TFCHECK_TERRAFORM_MAX_RETRIES", val),
            None => std::env::remove_var("TFCHECK_TERRAFORM_MAX_RETRIES"),
        }
    }

    assert_eq!(result, 7);
}

#[test]
#[serial_test::serial]
fn invalid_env_override_keeps_toml_value() {
    let original = std::env::var("TFCHECK_TERRAFORM_NO_COLOR").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("TFCHECK_TERRAFORM_NO_COLOR", "sometimes");
    }

    let mut config = TfcheckConfig::parse(EXAMPLE).expect("should parse");
    config.apply_env_overrides();
    let result = config.terraform.no_color;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TFCHECK_TERRAFORM_NO_COLOR", val),
            None => std::env::remove_var("TFCHECK_TERRAFORM_NO_COLOR"),
        }
    }

    assert!(result);
}

#[tokio::test]
#[serial_test::serial]
async fn env_override_repairs_invalid_file_value() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("tfcheck.toml");
    std::fs::write(&path, "[terraform]\ncommand_timeout_secs = 0\n").expect("should write config");

    let original = std::env::var("TFCHECK_TERRAFORM_COMMAND_TIMEOUT_SECS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("TFCHECK_TERRAFORM_COMMAND_TIMEOUT_SECS", "60");
    }

    let result = TfcheckConfig::load(&path).await;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TFCHECK_TERRAFORM_COMMAND_TIMEOUT_SECS", val),
            None => std::env::remove_var("TFCHECK_TERRAFORM_COMMAND_TIMEOUT_SECS"),
        }
    }

    let config = result.expect("env override should fix the timeout before validation");
    assert_eq!(config.terraform.command_timeout_secs, 60);
}

#[tokio::test]
#[serial_test::serial]
async fn invalid_file_value_without_override_fails_load() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("tfcheck.toml");
    std::fs::write(&path, "[terraform]\ncommand_timeout_secs = 0\n").expect("should write config");

    // from_file은 검증하지 않음
    let raw = TfcheckConfig::from_file(&path).await.expect("should read");
    assert_eq!(raw.terraform.command_timeout_secs, 0);

    let err = TfcheckConfig::load(&path).await.unwrap_err();
    assert!(err.to_string().contains("terraform.command_timeout_secs"));
}

#[tokio::test]
async fn from_file_or_default_skips_validation() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("tfcheck.toml");
    std::fs::write(&path, "[general]\nlog_level = \"loud\"\n").expect("should write config");

    let mut config = TfcheckConfig::from_file_or_default(&path)
        .await
        .expect("should read without validating");
    assert!(config.validate().is_err());

    config.general.log_level = "debug".to_owned();
    config.validate().expect("corrected level should validate");
}

// =============================================================================
// 에러 테스트
// =============================================================================

#[test]
fn malformed_toml_returns_parse_error() {
    let result = TfcheckConfig::parse("[terraform\nbinary = 1");
    assert!(matches!(
        result,
        Err(TfcheckError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let result = TfcheckConfig::parse("[terraform]\nmax_retries = \"three\"\n");
    assert!(result.is_err());
}

#[test]
fn invalid_retry_pattern_fails_validation() {
    let config = TfcheckConfig::parse(
        r#"
[[terraform.retryable_errors]]
pattern = "(unclosed"
"#,
    )
    .expect("should parse");

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("retryable_errors[0].pattern"));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = TfcheckConfig::from_file("/tmp/tfcheck_test_nonexistent_12345.toml").await;
    assert!(matches!(
        result,
        Err(TfcheckError::Config(ConfigError::FileNotFound { .. }))
    ));
}

#[tokio::test]
async fn relative_directories_resolve_against_config_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("tfcheck.toml");
    std::fs::write(&path, EXAMPLE).expect("should write config");

    let config = TfcheckConfig::from_file(&path).await.expect("should load");
    let scenarios = config.scenarios();

    assert_eq!(scenarios[0].directory, dir.path().join("examples/default"));
    assert_eq!(scenarios[1].directory, dir.path().join("examples/cmk"));
}

#[tokio::test]
#[serial_test::serial]
async fn load_or_default_without_file_uses_default_scenarios() {
    let config = TfcheckConfig::load_or_default("/tmp/tfcheck_test_absent_67890.toml")
        .await
        .expect("defaults should load");
    let names: Vec<_> = config.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["default", "cmk"]);
}

#[test]
fn serialize_and_reparse_roundtrip() {
    let original = TfcheckConfig::parse(EXAMPLE).expect("should parse");
    let toml_str = toml::to_string_pretty(&original).expect("should serialize");
    let parsed = TfcheckConfig::parse(&toml_str).expect("should reparse");
    parsed.validate().expect("reparsed should validate");

    assert_eq!(original.terraform.retryable_errors, parsed.terraform.retryable_errors);
    assert_eq!(original.scenarios.len(), parsed.scenarios.len());
}
