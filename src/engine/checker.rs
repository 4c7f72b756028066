//! # Checker Chain Module / 检查器链模块
//!
//! A fixed, ordered chain of verifiers applied to a step's captured outcome:
//! exact match (return code, required files, expected output files), the external
//! special judge, and regex patterns. The chain stops at the first failing checker.
//!
//! 应用于步骤捕获结果的固定有序检查器链：精确匹配（返回码、必需文件、期望输出文件）、
//! 外部特殊评测程序以及正则模式。检查器链在第一个失败的检查器处停止。

use anyhow::{Context, Result, bail};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::engine::config::{CheckSpec, JudgeConfig};
use crate::engine::models::{CheckResult, StepOutcome};
use crate::engine::paths::PathResolver;
use crate::infra::command::{self, Captured};
use crate::infra::t;

/// Everything a checker may look at.
/// 检查器可以访问的全部信息。
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub spec: &'a CheckSpec,
    pub outcome: &'a StepOutcome,
    pub resolver: &'a PathResolver,
    /// The step's declared point value, zero when none
    pub max_score: f64,
    pub judge: &'a JudgeConfig,
}

/// One verification strategy of the chain.
/// 检查器链中的一种校验策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checker {
    ExactMatch,
    SpecialJudge,
    Pattern,
}

/// The order in which checkers are applied.
pub const CHECKER_CHAIN: [Checker; 3] = [Checker::ExactMatch, Checker::SpecialJudge, Checker::Pattern];

impl Checker {
    pub async fn check(self, ctx: &CheckContext<'_>) -> CheckResult {
        match self {
            Checker::ExactMatch => check_exact(ctx),
            Checker::SpecialJudge => check_special_judge(ctx).await,
            Checker::Pattern => check_patterns(ctx),
        }
    }
}

/// Runs the whole chain, short-circuiting on the first failure.
/// A score reported by a passing checker is carried into the final verdict.
///
/// 运行整个检查器链，在第一次失败时短路返回。
/// 通过的检查器给出的分数会带入最终判定。
pub async fn run_checks(ctx: &CheckContext<'_>) -> CheckResult {
    let mut score = None;
    for checker in CHECKER_CHAIN {
        let result = checker.check(ctx).await;
        if !result.passed {
            debug!(?checker, message = %result.message, "check failed");
            return result;
        }
        score = result.score.or(score);
    }
    CheckResult::pass(t!("check.all_passed")).with_score(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn check_exact(ctx: &CheckContext<'_>) -> CheckResult {
    let spec = ctx.spec;
    let outcome = ctx.outcome;

    if let Some(expected) = spec.return_code {
        if outcome.return_code != expected {
            return CheckResult::fail(t!(
                "check.return_code_mismatch",
                expected = expected,
                actual = outcome.return_code
            ));
        }
    }

    for file in &spec.files {
        if !ctx.resolver.resolve_path(file).exists() {
            return CheckResult::fail(t!("check.file_missing", path = file));
        }
    }

    if let Some(expected_file) = &spec.stdout {
        if let Some(failure) = compare_stream(ctx, expected_file, &outcome.stdout, Stream::Stdout) {
            return failure;
        }
    }
    if let Some(expected_file) = &spec.stderr {
        if let Some(failure) = compare_stream(ctx, expected_file, &outcome.stderr, Stream::Stderr) {
            return failure;
        }
    }

    CheckResult::pass(t!("check.exact_passed"))
}

fn compare_stream(
    ctx: &CheckContext<'_>,
    expected_file: &str,
    actual: &str,
    stream: Stream,
) -> Option<CheckResult> {
    let path = ctx.resolver.resolve_path(expected_file);
    let expected = match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            let message = match stream {
                Stream::Stdout => t!("check.expected_stdout_missing", path = expected_file),
                Stream::Stderr => t!("check.expected_stderr_missing", path = expected_file),
            };
            return Some(CheckResult::fail(message));
        }
    };

    if outputs_match(&expected, actual, ctx.spec.ignore_whitespace) {
        return None;
    }
    let message = match stream {
        Stream::Stdout => t!("check.stdout_mismatch"),
        Stream::Stderr => t!("check.stderr_mismatch"),
    };
    Some(CheckResult::fail(message).with_expected(expected))
}

/// Compares expected and actual output after trimming trailing whitespace.
/// With `ignore_whitespace`, every whitespace run is first collapsed to one space.
///
/// 去除末尾空白后比较期望输出与实际输出。
/// 启用 `ignore_whitespace` 时，先将所有连续空白合并为一个空格。
pub fn outputs_match(expected: &str, actual: &str, ignore_whitespace: bool) -> bool {
    if ignore_whitespace {
        collapse_whitespace(expected) == collapse_whitespace(actual)
    } else {
        expected.trim_end() == actual.trim_end()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// JSON object written to the judge's stdin.
#[derive(Debug, Serialize)]
struct JudgeRequest<'a> {
    stdout: &'a str,
    stderr: &'a str,
    return_code: i32,
    test_dir: String,
    max_score: f64,
}

/// JSON object the judge must print on stdout.
#[derive(Debug, Deserialize)]
struct JudgeVerdict {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

async fn check_special_judge(ctx: &CheckContext<'_>) -> CheckResult {
    let Some(judge) = &ctx.spec.special_judge else {
        return CheckResult::pass(t!("check.no_special_judge"));
    };

    let script = ctx.resolver.resolve_path(judge);
    if !script.is_file() {
        return CheckResult::fail(t!("check.judge_missing", path = judge));
    }

    match invoke_judge(ctx, &script).await {
        Ok(verdict) => {
            let message = verdict
                .message
                .unwrap_or_else(|| t!("check.judge_no_message").to_string());
            let score = verdict.score.map(|score| clamp_score(score, ctx.max_score));
            CheckResult {
                passed: verdict.success,
                message,
                score,
                expected: None,
            }
        }
        Err(e) => CheckResult::fail(t!("check.judge_failed", error = format!("{e:#}"))),
    }
}

async fn invoke_judge(ctx: &CheckContext<'_>, script: &Path) -> Result<JudgeVerdict> {
    let request = JudgeRequest {
        stdout: &ctx.outcome.stdout,
        stderr: &ctx.outcome.stderr,
        return_code: ctx.outcome.return_code,
        test_dir: ctx.resolver.test_dir().to_string_lossy().into_owned(),
        max_score: ctx.max_score,
    };
    let payload = serde_json::to_vec(&request)?;

    let mut cmd = judge_command(script, ctx.judge);
    cmd.current_dir(ctx.resolver.test_dir());
    let limit = ctx.judge.timeout();
    debug!(judge = %script.display(), "invoking special judge");

    let captured = command::run_with_timeout(cmd, Some(payload), limit)
        .await
        .with_context(|| format!("could not launch {}", script.display()))?;
    match captured {
        Captured::TimedOut { .. } => bail!("timed out after {}s", limit.as_secs_f64()),
        Captured::Exited { stdout, stderr, .. } => serde_json::from_str(stdout.trim())
            .with_context(|| {
                if stderr.trim().is_empty() {
                    "judge did not print a valid verdict".to_string()
                } else {
                    format!("judge did not print a valid verdict; stderr: {}", stderr.trim())
                }
            }),
    }
}

/// Python and shell judges run through their interpreter, anything else is executed directly.
fn judge_command(script: &Path, config: &JudgeConfig) -> Command {
    let interpreter = match script.extension().and_then(|ext| ext.to_str()) {
        Some("py") => Some(&config.python),
        Some("sh") => Some(&config.shell),
        _ => None,
    };
    match interpreter {
        Some(program) => {
            let mut cmd = Command::new(program);
            cmd.arg(script);
            cmd
        }
        None => Command::new(script),
    }
}

/// Clamps a judge-reported score into `[0, max_score]`.
pub fn clamp_score(score: f64, max_score: f64) -> f64 {
    score.min(max_score).max(0.0)
}

fn check_patterns(ctx: &CheckContext<'_>) -> CheckResult {
    let spec = ctx.spec;
    let streams = [
        (&spec.stdout_pattern, &ctx.outcome.stdout, Stream::Stdout),
        (&spec.stderr_pattern, &ctx.outcome.stderr, Stream::Stderr),
    ];

    for (pattern, haystack, stream) in streams {
        let Some(pattern) = pattern else {
            continue;
        };
        let regex = match RegexBuilder::new(pattern).multi_line(true).build() {
            Ok(regex) => regex,
            Err(e) => {
                return CheckResult::fail(t!(
                    "check.pattern_invalid",
                    pattern = pattern,
                    error = e.to_string()
                ));
            }
        };
        if !regex.is_match(haystack) {
            let message = match stream {
                Stream::Stdout => t!("check.stdout_pattern_mismatch", pattern = pattern),
                Stream::Stderr => t!("check.stderr_pattern_mismatch", pattern = pattern),
            };
            return CheckResult::fail(message);
        }
    }

    CheckResult::pass(t!("check.patterns_passed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_whitespace_is_ignored() {
        assert!(outputs_match("hello\n", "hello", false));
        assert!(outputs_match("hello", "hello  \n\n", false));
        assert!(!outputs_match("hello", " hello", false));
    }

    #[test]
    fn whitespace_runs_collapse_when_requested() {
        assert!(outputs_match("a  b\n\tc", "a b c", true));
        assert!(!outputs_match("a  b\n\tc", "a b c", false));
    }

    #[test]
    fn judge_scores_are_clamped() {
        assert_eq!(clamp_score(15.0, 10.0), 10.0);
        assert_eq!(clamp_score(-3.0, 10.0), 0.0);
        assert_eq!(clamp_score(4.5, 10.0), 4.5);
    }
}
