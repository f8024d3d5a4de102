//! terraform 하위 명령 정의 및 인자 구성
//!
//! 각 명령은 비대화형 실행을 위한 고정 플래그를 가집니다.
//! `-var`/`-var-file`은 구성 입력이 필요한 `apply`/`destroy`에만 붙습니다.

use std::fmt;

use tfcheck_core::types::Scenario;

/// terraform 하위 명령
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformCommand {
    /// `terraform init`
    Init,
    /// `terraform validate`
    Validate,
    /// `terraform apply`
    Apply,
    /// `terraform destroy`
    Destroy,
}

impl TerraformCommand {
    /// 하위 명령 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
        }
    }

    /// 시나리오에 맞는 전체 인자 목록을 구성합니다.
    pub fn args(&self, scenario: &Scenario) -> Vec<String> {
        let mut args = vec![self.name().to_owned()];

        match self {
            Self::Init => {
                args.push("-upgrade=false".to_owned());
                args.push("-input=false".to_owned());
            }
            Self::Validate => {}
            Self::Apply | Self::Destroy => {
                args.push("-input=false".to_owned());
                args.push("-auto-approve".to_owned());
                args.push("-lock=false".to_owned());
            }
        }

        if scenario.no_color {
            args.push("-no-color".to_owned());
        }

        if matches!(self, Self::Apply | Self::Destroy) {
            for (key, value) in &scenario.vars {
                args.push("-var".to_owned());
                args.push(format!("{key}={value}"));
            }
            for file in &scenario.var_files {
                args.push(format!("-var-file={}", file.display()));
            }
        }

        args
    }
}

impl fmt::Display for TerraformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// terraform 1회 실행 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 종료 코드 (시그널 종료 시 None)
    pub exit_code: Option<i32>,
    /// 표준 출력
    pub stdout: String,
    /// 표준 에러
    pub stderr: String,
}

impl CommandOutput {
    /// 종료 코드 0으로 성공한 출력을 생성합니다.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// 주어진 종료 코드와 stderr로 실패한 출력을 생성합니다.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 재시도 패턴 매칭에 쓰이는 stdout + stderr
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        if self.stdout.is_empty() {
            return self.stderr.clone();
        }
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// 에러 메시지용 출력 끝부분 (최대 `max_lines`줄)
    pub fn tail(&self, max_lines: usize) -> String {
        let combined = self.combined();
        let lines: Vec<&str> = combined.trim_end().lines().collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join("\n")
    }
}
