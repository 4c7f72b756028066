//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures produced while grading: raw step
//! outcomes, checker verdicts, per-step score entries, structured error details
//! and the final per-test result with its derived status.
//!
//! 此模块定义评分过程中产生的数据结构：原始步骤结果、检查器判定、
//! 分步得分条目、结构化错误详情，以及带有派生状态的最终测试结果。

use crate::engine::config::TestCase;
use crate::infra::t;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Derived status of a finished test case.
/// 已完成测试用例的派生状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// Achieved score equals the maximum / 得分等于满分
    Pass,
    /// Some, but not all, points were earned / 获得了部分分数
    Partial,
    /// No points were earned / 未获得任何分数
    Fail,
}

impl TestStatus {
    /// Derives the status from the achieved and maximum score.
    /// This is a pure function of the two values.
    ///
    /// 根据得分与满分派生状态。这是这两个值的纯函数。
    pub fn from_scores(score: f64, max_score: f64) -> Self {
        if score >= max_score {
            TestStatus::Pass
        } else if score <= 0.0 {
            TestStatus::Fail
        } else {
            TestStatus::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Partial => "PARTIAL",
            TestStatus::Fail => "FAIL",
        }
    }

    /// Gets the localized label of the status for display.
    /// 获取用于显示的本地化状态标签。
    pub fn label(&self, locale: &str) -> String {
        match self {
            TestStatus::Pass => t!("report.status_pass", locale = locale).to_string(),
            TestStatus::Partial => t!("report.status_partial", locale = locale).to_string(),
            TestStatus::Fail => t!("report.status_fail", locale = locale).to_string(),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a test case while the sequencer drives it.
/// 序列器驱动测试用例时的生命周期。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    NotStarted,
    /// 1-based index of the step currently running
    Running(usize),
    Passed,
    PartiallyPassed,
    Failed,
}

impl From<TestStatus> for CaseState {
    fn from(status: TestStatus) -> Self {
        match status {
            TestStatus::Pass => CaseState::Passed,
            TestStatus::Partial => CaseState::PartiallyPassed,
            TestStatus::Fail => CaseState::Failed,
        }
    }
}

/// Captured result of a step process that ran to completion.
/// 运行完成的步骤进程的捕获结果。
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub duration: Duration,
}

/// How a step process terminated.
/// 步骤进程的终止方式。
#[derive(Debug, Clone, PartialEq)]
pub enum StepRun {
    /// The process exited on its own.
    Completed(StepOutcome),
    /// The process exceeded its limit and was killed.
    TimedOut { elapsed: Duration, limit: Duration },
}

/// Verdict produced by a checker, or by the whole chain.
/// 检查器（或整个检查器链）产生的判定。
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    /// Score that replaces the step's declared point value
    pub score: Option<f64>,
    /// Expected content, reported on exact-match failures
    pub expected: Option<String>,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            score: None,
            expected: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            score: None,
            expected: None,
        }
    }

    pub fn with_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}

/// One `(step name, achieved, step maximum)` entry of the score breakdown.
/// Serialized as a three-element array.
///
/// 分数明细中的一条 `(步骤名, 得分, 步骤满分)` 记录，序列化为三元素数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepScore(pub String, pub f64, pub f64);

impl StepScore {
    pub fn new(name: impl Into<String>, score: f64, max_score: f64) -> Self {
        Self(name.into(), score, max_score)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn score(&self) -> f64 {
        self.1
    }

    pub fn max_score(&self) -> f64 {
        self.2
    }
}

/// Structured description of the step that ended a test case.
/// 结束测试用例的步骤的结构化描述。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// 1-based index of the failing step / 失败步骤的序号（从 1 开始）
    pub step: usize,
    pub step_name: String,
    pub error_message: String,
    /// Resolved command line of the failing step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
}

/// Final result of running one test case.
/// 运行一个测试用例的最终结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub success: bool,
    pub status: TestStatus,
    pub message: String,
    #[serde(rename = "time", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub score: f64,
    pub max_score: f64,
    pub step_scores: Option<Vec<StepScore>>,
    pub error_details: Option<ErrorDetails>,
}

impl TestResult {
    /// Builds the result of a sequence that ran to the end.
    /// The achieved score is clamped into `[0, max_score]`.
    pub fn completed(
        score: f64,
        max_score: f64,
        step_scores: Option<Vec<StepScore>>,
        duration: Duration,
    ) -> Self {
        let score = score.min(max_score).max(0.0);
        let status = TestStatus::from_scores(score, max_score);
        let message = if status == TestStatus::Fail {
            t!("run.some_steps_failed").to_string()
        } else {
            t!("run.all_steps_completed").to_string()
        };
        Self {
            success: status != TestStatus::Fail,
            status,
            message,
            duration,
            score,
            max_score,
            step_scores,
            error_details: None,
        }
    }

    /// Builds the zero-score result of an aborted test case.
    pub fn aborted(
        max_score: f64,
        message: impl Into<String>,
        error_details: Option<ErrorDetails>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            status: TestStatus::Fail,
            message: message.into(),
            duration,
            score: 0.0,
            max_score,
            step_scores: None,
            error_details,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == TestStatus::Fail
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// A test case paired with the result of running it.
/// 测试用例及其运行结果。
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub case: TestCase,
    pub result: TestResult,
}
