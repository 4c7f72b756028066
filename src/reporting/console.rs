//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the display of grading progress and results in the console.
//! It provides functionality for printing colorful, formatted summaries, the details
//! of failed test cases and discovery errors, with internationalization support.
//!
//! 此模块处理评分进度与结果在控制台中的显示。
//! 它提供打印彩色格式化摘要、失败测试用例详情和发现错误的功能，支持国际化。

use colored::*;

use crate::engine::config::{Step, TestCase};
use crate::engine::execution::ExecutionObserver;
use crate::engine::models::{CaseState, ErrorDetails, TestResult, TestStatus};
use crate::engine::planner::DiscoveryError;
use crate::infra::t;
use crate::reporting::summary::RunReport;

/// Prints per-case progress while the run is in flight.
/// 在运行过程中打印每个用例的进度。
#[derive(Debug)]
pub struct ConsoleProgress {
    locale: String,
    total: usize,
    started: usize,
}

impl ConsoleProgress {
    pub fn new(locale: &str, total: usize) -> Self {
        Self {
            locale: locale.to_string(),
            total,
            started: 0,
        }
    }
}

impl ExecutionObserver for ConsoleProgress {
    fn on_state(&mut self, case: &TestCase, state: CaseState, step: Option<&Step>) {
        match (state, step) {
            (CaseState::NotStarted, _) => {
                self.started += 1;
                println!(
                    "{} {} ({})",
                    format!("[{}/{}]", self.started, self.total).bold(),
                    case.meta.name.cyan(),
                    case.id.dimmed()
                );
            }
            (CaseState::Running(index), Some(step)) => {
                println!(
                    "    {}",
                    t!(
                        "run.step_started",
                        locale = &self.locale,
                        index = index,
                        name = step.display_name()
                    )
                    .dimmed()
                );
            }
            _ => {}
        }
    }

    fn on_result(&mut self, case: &TestCase, result: &TestResult) {
        println!(
            "    {} {} {}",
            colored_status(result.status, &self.locale),
            format!("{:.1}/{:.1}", result.score, result.max_score).bold(),
            format!("({:.2}s)", result.duration.as_secs_f64()).dimmed()
        );
        for entry in result.step_scores.iter().flatten() {
            let line = format!("- {}: {:.1}/{:.1}", entry.name(), entry.score(), entry.max_score());
            if entry.score() < entry.max_score() {
                println!("      {}", line.yellow());
            } else {
                println!("      {}", line.dimmed());
            }
        }
        if let Some(details) = &result.error_details {
            print_failure_details(&case.meta.name, details, &self.locale);
        } else if result.is_failure() {
            println!("    {}", result.message.red());
        }
    }
}

fn colored_status(status: TestStatus, locale: &str) -> ColoredString {
    let label = status.label(locale);
    match status {
        TestStatus::Pass => label.green().bold(),
        TestStatus::Partial => label.yellow().bold(),
        TestStatus::Fail => label.red().bold(),
    }
}

/// Prints why a test case failed: the step, its command, the checker message,
/// and the captured output next to the expected one.
///
/// 打印测试用例失败的原因：失败的步骤、其命令、检查器消息，以及捕获的输出与期望输出。
pub fn print_failure_details(case_name: &str, details: &ErrorDetails, locale: &str) {
    println!("{}", "-".repeat(80).dimmed());
    println!(
        "{} '{}'",
        t!("report.failure_header", locale = locale).red().bold(),
        case_name.cyan()
    );
    println!(
        "  {}",
        t!(
            "report.failed_step",
            locale = locale,
            index = details.step,
            name = &details.step_name
        )
    );
    if let Some(command) = &details.command {
        println!("  {} {}", t!("report.command", locale = locale).bold(), command);
    }
    println!("  {} {}", t!("report.error", locale = locale).bold(), details.error_message.red());
    if let Some(code) = details.return_code {
        println!("  {} {}", t!("report.return_code", locale = locale).bold(), code);
    }

    let sections = [
        (t!("report.expected_output", locale = locale), &details.expected_output),
        (t!("report.actual_stdout", locale = locale), &details.stdout),
        (t!("report.actual_stderr", locale = locale), &details.stderr),
    ];
    for (header, content) in sections {
        if let Some(content) = content {
            println!("\n  --- {} ---", header.yellow());
            println!("{}", content.trim_end());
        }
    }
    println!("{}", "-".repeat(80).dimmed());
}

/// Prints the results table of the run.
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Status   | Test                                     |       Time |        Score
///   - PASS     | Hello World (1_hello)                    |      0.12s |    10.0/10.0
///   - PARTIAL  | Arrays (2_arrays)                        |      0.40s |     5.0/10.0
/// ```
pub fn print_summary(report: &RunReport, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());
    println!(
        "  - {:<8} | {:<40} | {:>10} | {:>12}",
        t!("report.header_status", locale = locale),
        t!("report.header_test", locale = locale),
        t!("report.header_time", locale = locale),
        t!("report.header_score", locale = locale)
    );

    for test in &report.tests {
        let label = format!("{:<8}", test.status.label(locale));
        let status = match test.status {
            TestStatus::Pass => label.green(),
            TestStatus::Partial => label.yellow(),
            TestStatus::Fail => label.red(),
        };
        let name = format!("{} ({})", test.name, test.id);
        println!(
            "  - {} | {:<40} | {:>9.2}s | {:>12}",
            status,
            name,
            test.time,
            format!("{:.1}/{:.1}", test.score, test.max_score)
        );
    }

    print_total(report, locale);
}

/// Prints the overall score line, colored by how much was earned.
pub fn print_total(report: &RunReport, locale: &str) {
    let line = t!(
        "report.total",
        locale = locale,
        score = format!("{:.1}", report.total_score),
        max = format!("{:.1}", report.max_score),
        percentage = format!("{:.1}", report.percentage)
    );
    let line = if report.max_score > 0.0 && report.total_score >= report.max_score {
        line.green().bold()
    } else if report.is_passing() {
        line.yellow().bold()
    } else {
        line.red().bold()
    };
    println!("\n{line}");
}

/// Localized one-line description of a discovery error.
/// 发现错误的本地化单行描述。
pub fn discovery_error_message(error: &DiscoveryError, locale: &str) -> String {
    match error {
        DiscoveryError::MissingCasesDir(path) => {
            t!("discovery.missing_cases_dir", locale = locale, path = path.display()).to_string()
        }
        DiscoveryError::NoCases(path) => {
            t!("discovery.no_cases", locale = locale, path = path.display()).to_string()
        }
        DiscoveryError::NotFound { query, numeric: true } => {
            t!("discovery.not_found_numeric", locale = locale, query = query).to_string()
        }
        DiscoveryError::NotFound { query, numeric: false } => {
            t!("discovery.not_found_prefix", locale = locale, query = query).to_string()
        }
        DiscoveryError::Ambiguous { query, numeric: true, .. } => {
            t!("discovery.ambiguous_numeric", locale = locale, query = query).to_string()
        }
        DiscoveryError::Ambiguous { query, numeric: false, .. } => {
            t!("discovery.ambiguous_prefix", locale = locale, query = query).to_string()
        }
        DiscoveryError::UnknownGroup(group) => {
            t!("discovery.unknown_group", locale = locale, group = group).to_string()
        }
        DiscoveryError::EmptyGroup(group) => {
            t!("discovery.empty_group", locale = locale, group = group).to_string()
        }
    }
}

/// Prints a discovery error. Ambiguous queries list every candidate.
pub fn print_discovery_error(error: &DiscoveryError, locale: &str) {
    let message = discovery_error_message(error, locale);
    match error {
        DiscoveryError::Ambiguous { candidates, .. } => {
            println!("{} {}", t!("report.warning", locale = locale).yellow().bold(), message);
            for candidate in candidates {
                println!("  - {}: {}", candidate.id.cyan(), candidate.name);
            }
            println!("{}", t!("discovery.be_more_specific", locale = locale));
        }
        _ => println!("{} {}", t!("report.error_prefix", locale = locale).red().bold(), message),
    }
}
