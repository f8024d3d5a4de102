//! terraform 요약 출력 파싱
//!
//! `apply`의 `Apply complete! Resources: ...` 줄과 `destroy`의
//! `Destroy complete! Resources: ...` 줄에서 리소스 변경 수를 추출합니다.
//! 출력에 요약이 여러 번 나타나면 마지막 것을 사용합니다.

use std::sync::LazyLock;

use regex::Regex;

use tfcheck_core::types::{ResourceChanges, Step};

use crate::error::TerraformError;

static APPLY_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Apply complete! Resources: (?:\d+ imported, )?(\d+) added, (\d+) changed, (\d+) destroyed",
    )
    .expect("apply summary regex is valid")
});

static DESTROY_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Destroy complete! Resources: (\d+) destroyed").expect("destroy summary regex is valid")
});

/// `apply` 출력에서 변경 수를 추출합니다.
pub fn parse_apply_changes(step: Step, stdout: &str) -> Result<ResourceChanges, TerraformError> {
    last_triple(&APPLY_SUMMARY, stdout).ok_or_else(|| TerraformError::UnparsableOutput {
        step,
        reason: "no 'Apply complete!' summary found".to_owned(),
    })
}

/// `destroy` 출력에서 삭제된 리소스 수를 추출합니다.
pub fn parse_destroyed_count(stdout: &str) -> Option<u32> {
    DESTROY_SUMMARY
        .captures_iter(stdout)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn last_triple(regex: &Regex, text: &str) -> Option<ResourceChanges> {
    let caps = regex.captures_iter(text).last()?;
    let field = |idx: usize| -> Option<u32> { caps.get(idx)?.as_str().parse().ok() };
    Some(ResourceChanges {
        added: field(1)?,
        changed: field(2)?,
        destroyed: field(3)?,
    })
}
