//! # Run Summary Module / 运行摘要模块
//!
//! Aggregates the results of every executed test case into the run report that the
//! console, JSON and HTML renderers share, and writes the optional result file.
//!
//! 将所有已执行测试用例的结果汇总为运行报告，供控制台、JSON 与 HTML 渲染器共享，
//! 并写入可选的结果文件。

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::models::{CaseOutcome, ErrorDetails, StepScore, TestStatus};

/// File receiving the overall percentage when `--write-result` is given.
pub const RESULT_FILE_NAME: &str = ".autograder_result";

/// Report entry of a single test case.
/// 单个测试用例的报告条目。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub success: bool,
    pub status: TestStatus,
    pub message: String,
    #[serde(serialize_with = "round_2")]
    pub time: f64,
    #[serde(serialize_with = "round_1")]
    pub score: f64,
    #[serde(serialize_with = "round_1")]
    pub max_score: f64,
    pub step_scores: Option<Vec<StepScore>>,
    pub error_details: Option<ErrorDetails>,
}

/// Aggregate report of one invocation.
/// 一次调用的汇总报告。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(serialize_with = "round_1")]
    pub total_score: f64,
    #[serde(serialize_with = "round_1")]
    pub max_score: f64,
    #[serde(serialize_with = "round_1")]
    pub percentage: f64,
    pub tests: Vec<TestReport>,
}

impl RunReport {
    /// Builds the report from the outcomes, preserving their order.
    pub fn build(outcomes: &[CaseOutcome]) -> Self {
        let tests: Vec<TestReport> = outcomes
            .iter()
            .map(|outcome| TestReport {
                id: outcome.case.id.clone(),
                name: outcome.case.meta.name.clone(),
                success: outcome.result.success,
                status: outcome.result.status,
                message: outcome.result.message.clone(),
                time: outcome.result.duration.as_secs_f64(),
                score: outcome.result.score,
                max_score: outcome.result.max_score,
                step_scores: outcome.result.step_scores.clone(),
                error_details: outcome.result.error_details.clone(),
            })
            .collect();

        let total_score = tests.iter().map(|t| t.score).sum();
        let max_score = tests.iter().map(|t| t.max_score).sum();
        Self {
            total_score,
            max_score,
            percentage: percentage(total_score, max_score),
            tests,
        }
    }

    /// The run counts as passing as soon as any point was earned.
    pub fn is_passing(&self) -> bool {
        self.percentage > 0.0
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.tests.iter().filter(|t| t.status == status).count()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize the run report")
    }

    /// Writes the percentage, formatted with two decimals, into `dir/.autograder_result`.
    pub fn write_result_file(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(RESULT_FILE_NAME);
        fs::write(&path, format!("{:.2}", self.percentage))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Percentage of `max_score` earned, zero when nothing could be earned.
pub fn percentage(total_score: f64, max_score: f64) -> f64 {
    if max_score > 0.0 {
        total_score / max_score * 100.0
    } else {
        0.0
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn round_1<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 1))
}

fn round_2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}
