//! 메트릭 상수
//!
//! 모든 메트릭의 이름을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//! 레코더는 설치하지 않으므로 임베딩하는 쪽에서 선택적으로 수집합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tfcheck_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (passed, failed)
pub const LABEL_RESULT: &str = "result";

/// 단계 레이블 키 (init, validate, apply, idempotent_apply, destroy)
pub const LABEL_STEP: &str = "step";

/// 시나리오 레이블 키
pub const LABEL_SCENARIO: &str = "scenario";

// ─── 메트릭 이름 ────────────────────────────────────────────────────

/// 완료된 시나리오 수 (counter, label: result)
pub const SCENARIOS_TOTAL: &str = "tfcheck_scenarios_total";

/// 일시적 에러로 인한 terraform 재시도 수 (counter, label: step)
pub const TERRAFORM_RETRIES_TOTAL: &str = "tfcheck_terraform_retries_total";

/// terraform 단계 실행 시간 (histogram, 초, label: step)
pub const STEP_DURATION_SECONDS: &str = "tfcheck_step_duration_seconds";

/// destroy 실패 수 (counter, label: scenario)
pub const CLEANUP_FAILURES_TOTAL: &str = "tfcheck_cleanup_failures_total";
