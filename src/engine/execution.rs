//! # Test Execution Engine Module / 测试执行引擎模块
//!
//! This module drives a test case: it resets the build directory, runs the steps
//! strictly in order, passes each outcome through the checker chain, stops at the
//! first required failure, and aggregates step scores into the final result.
//!
//! 此模块驱动测试用例的执行：重置构建目录，严格按顺序运行各步骤，
//! 将每个结果交给检查器链校验，在第一个必需步骤失败时停止，
//! 并将步骤得分汇总为最终结果。

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::engine::checker::{CheckContext, run_checks};
use crate::engine::config::{Project, Step, TestCase};
use crate::engine::executor::{ResolvedCommand, execute_step};
use crate::engine::models::{
    CaseState, CheckResult, ErrorDetails, StepOutcome, StepRun, StepScore, TestResult,
};
use crate::engine::paths::PathResolver;
use crate::infra::{fs, t};

/// Receives progress notifications while test cases run.
/// All methods default to doing nothing.
///
/// 在测试用例运行期间接收进度通知。所有方法默认不做任何事。
pub trait ExecutionObserver {
    fn on_state(&mut self, _case: &TestCase, _state: CaseState, _step: Option<&Step>) {}
    fn on_result(&mut self, _case: &TestCase, _result: &TestResult) {}
}

/// Observer that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ExecutionObserver for Silent {}

/// The main entry point for running a single test case.
///
/// Unexpected errors (for example an unwritable build directory) never escape:
/// they become a zero-score failed result.
///
/// # Arguments
/// * `case` - The test case to execute
/// * `project` - The project providing directory layout and judge settings
/// * `observer` - Receives state transitions and the final result
///
/// # Returns
/// The `TestResult` of the case
pub async fn run_test_case(
    case: &TestCase,
    project: &Project,
    observer: &mut dyn ExecutionObserver,
) -> TestResult {
    let start = Instant::now();
    observer.on_state(case, CaseState::NotStarted, None);
    info!(case = %case.id, steps = case.steps.len(), "running test case");

    let result = match run_steps(case, project, observer, start).await {
        Ok(result) => result,
        Err(e) => TestResult::aborted(
            case.max_score(),
            t!("run.unexpected_error", error = format!("{e:#}")),
            None,
            start.elapsed(),
        ),
    };

    observer.on_state(case, CaseState::from(result.status), None);
    observer.on_result(case, &result);
    result
}

async fn run_steps(
    case: &TestCase,
    project: &Project,
    observer: &mut dyn ExecutionObserver,
    start: Instant,
) -> anyhow::Result<TestResult> {
    fs::reset_build_dir(&case.path)?;
    let resolver = PathResolver::new(&case.path, &project.common_dir(), &project.root);
    let per_step = case.uses_step_scores();

    let mut earned_total = 0.0;
    let mut step_scores = Vec::new();

    for (i, step) in case.steps.iter().enumerate() {
        let index = i + 1;
        observer.on_state(case, CaseState::Running(index), Some(step));

        let resolved = ResolvedCommand::resolve(step, &resolver);
        let run = match execute_step(step, &resolved, &resolver).await {
            Ok(run) => run,
            Err(e) => {
                let message = e.to_string();
                return Ok(abort_with(case, index, step, &resolved, message, start));
            }
        };

        let outcome = match run {
            StepRun::Completed(outcome) => outcome,
            StepRun::TimedOut { limit, .. } => {
                return Ok(timeout_result(case, index, step, &resolved, limit, start));
            }
        };

        let verdict = match &step.check {
            Some(spec) if !spec.is_empty() => {
                let ctx = CheckContext {
                    spec,
                    outcome: &outcome,
                    resolver: &resolver,
                    max_score: step.max_score(),
                    judge: &project.config.judge,
                };
                run_checks(&ctx).await
            }
            _ => CheckResult::pass(t!("check.no_checks")),
        };

        if verdict.passed {
            let earned = verdict.score.unwrap_or_else(|| step.max_score());
            earned_total += earned;
            if step.max_score() > 0.0 {
                step_scores.push(StepScore::new(step.display_name(), earned, step.max_score()));
            }
        } else if step.must_pass {
            return Ok(failure_result(case, index, step, &resolved, &verdict, &outcome, start));
        } else {
            debug!(step = index, message = %verdict.message, "optional step failed, continuing");
            if step.max_score() > 0.0 {
                step_scores.push(StepScore::new(step.display_name(), 0.0, step.max_score()));
            }
        }
    }

    Ok(aggregate(case, per_step, earned_total, step_scores, start.elapsed()))
}

/// Computes the final result of a sequence that was not aborted.
///
/// Per-step scoring sums the earned step scores and caps them at the declared total,
/// out of the sum of the declared step scores. Atomic scoring awards the declared
/// total, since every required step passed.
///
/// 计算未被中止的步骤序列的最终结果。
/// 分步计分将各步骤得分求和并以声明的总分为上限，满分为各步骤声明分数之和；
/// 整体计分在所有必需步骤通过时给予声明的总分。
pub fn aggregate(
    case: &TestCase,
    per_step: bool,
    earned_total: f64,
    step_scores: Vec<StepScore>,
    duration: Duration,
) -> TestResult {
    let max_score = case.max_score();
    if per_step {
        let earned = earned_total.min(case.meta.score);
        TestResult::completed(earned, max_score, Some(step_scores), duration)
    } else {
        TestResult::completed(max_score, max_score, None, duration)
    }
}

fn timeout_result(
    case: &TestCase,
    index: usize,
    step: &Step,
    resolved: &ResolvedCommand,
    limit: Duration,
    start: Instant,
) -> TestResult {
    let message = t!(
        "run.step_timed_out",
        index = index,
        name = step.display_name(),
        timeout = limit.as_secs_f64()
    )
    .to_string();
    let details = ErrorDetails {
        step: index,
        step_name: step.display_name().to_string(),
        error_message: message.clone(),
        command: Some(resolved.command_line()),
        ..ErrorDetails::default()
    };
    TestResult::aborted(case.max_score(), message, Some(details), start.elapsed())
}

fn failure_result(
    case: &TestCase,
    index: usize,
    step: &Step,
    resolved: &ResolvedCommand,
    verdict: &CheckResult,
    outcome: &StepOutcome,
    start: Instant,
) -> TestResult {
    let details = ErrorDetails {
        step: index,
        step_name: step.display_name().to_string(),
        error_message: verdict.message.clone(),
        command: Some(resolved.command_line()),
        stdout: non_empty(&outcome.stdout),
        stderr: non_empty(&outcome.stderr),
        expected_output: verdict.expected.clone(),
        return_code: Some(outcome.return_code),
    };
    let message = t!(
        "run.step_failed",
        index = index,
        name = step.display_name(),
        message = &verdict.message
    );
    TestResult::aborted(case.max_score(), message, Some(details), start.elapsed())
}

fn abort_with(
    case: &TestCase,
    index: usize,
    step: &Step,
    resolved: &ResolvedCommand,
    error: String,
    start: Instant,
) -> TestResult {
    let message = t!(
        "run.step_failed",
        index = index,
        name = step.display_name(),
        message = &error
    );
    let details = ErrorDetails {
        step: index,
        step_name: step.display_name().to_string(),
        error_message: error,
        command: Some(resolved.command_line()),
        ..ErrorDetails::default()
    };
    TestResult::aborted(case.max_score(), message, Some(details), start.elapsed())
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}
