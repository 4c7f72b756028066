//! # HTML Reporting Module / HTML 报告模块
//!
//! This module handles the generation of HTML grading reports.
//! It creates a self-contained, styled HTML file with score statistics, a results
//! table and collapsible failure details for every failed test case.
//!
//! 此模块处理 HTML 评分报告的生成。
//! 它创建一个独立的样式化 HTML 文件，包含分数统计、结果表格，
//! 以及每个失败测试用例可折叠的失败详情。

use anyhow::{Context, Result};
use chrono::Local;
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::Path;

use crate::engine::models::{ErrorDetails, TestStatus};
use crate::infra::t;
use crate::reporting::summary::{RunReport, TestReport};

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2em; color: #24292f; }
h1 { margin-bottom: 0.2em; }
.generated { color: #57606a; margin-bottom: 1.5em; }
.summary-container { display: flex; gap: 1.5em; margin-bottom: 1.5em; }
.summary-item { border: 1px solid #d0d7de; border-radius: 6px; padding: 0.8em 1.2em; text-align: center; }
.summary-item .count { display: block; font-size: 1.6em; font-weight: 600; }
.summary-item .label { color: #57606a; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #d0d7de; padding: 0.5em; text-align: left; vertical-align: top; }
.numeric { text-align: right; white-space: nowrap; }
.pass { color: #1a7f37; font-weight: 600; }
.partial { color: #9a6700; font-weight: 600; }
.fail { color: #cf222e; font-weight: 600; }
pre { background: #f6f8fa; padding: 0.8em; overflow-x: auto; }
"#;

/// Generates an HTML report from the run report and saves it to `output_path`.
///
/// 从运行报告生成 HTML 报告并保存到 `output_path`。
///
/// # Arguments / 参数
/// * `report` - The aggregated run report / 汇总的运行报告
/// * `output_path` - The file path where the HTML report will be saved / 保存 HTML 报告的文件路径
/// * `locale` - The locale to use for internationalization / 用于国际化的语言环境
///
/// # Errors / 错误
/// Returns an error if the output file cannot be written.
/// 无法写入输出文件时返回错误。
pub fn generate_html_report(report: &RunReport, output_path: &Path, locale: &str) -> Result<()> {
    let markup = render(report, locale);
    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))
}

/// Renders the complete report document.
pub fn render(report: &RunReport, locale: &str) -> Markup {
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (maud::PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale)) }
                p.generated { (t!("html_report.generated_at", locale = locale, time = &generated)) }
                (summary(report, locale))
                (results_table(report, locale))
                (failure_sections(report, locale))
            }
        }
    }
}

fn summary(report: &RunReport, locale: &str) -> Markup {
    let score = format!("{:.1}/{:.1}", report.total_score, report.max_score);
    let percentage = format!("{:.1}%", report.percentage);
    let items = [
        (report.tests.len().to_string(), t!("html_report.summary.total", locale = locale), ""),
        (report.count(TestStatus::Pass).to_string(), t!("html_report.summary.passed", locale = locale), "pass"),
        (report.count(TestStatus::Partial).to_string(), t!("html_report.summary.partial", locale = locale), "partial"),
        (report.count(TestStatus::Fail).to_string(), t!("html_report.summary.failed", locale = locale), "fail"),
        (score, t!("html_report.summary.score", locale = locale), ""),
        (percentage, t!("html_report.summary.percentage", locale = locale), ""),
    ];
    html! {
        div.summary-container {
            @for (count, label, class) in &items {
                div.summary-item {
                    span class=(format!("count {class}")) { (count) }
                    span.label { (label) }
                }
            }
        }
    }
}

fn status_class(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Pass => "pass",
        TestStatus::Partial => "partial",
        TestStatus::Fail => "fail",
    }
}

fn results_table(report: &RunReport, locale: &str) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { (t!("html_report.table.header.id", locale = locale)) }
                    th { (t!("html_report.table.header.name", locale = locale)) }
                    th { (t!("html_report.table.header.status", locale = locale)) }
                    th.numeric { (t!("html_report.table.header.duration", locale = locale)) }
                    th.numeric { (t!("html_report.table.header.score", locale = locale)) }
                    th { (t!("html_report.table.header.message", locale = locale)) }
                }
            }
            tbody {
                @for test in &report.tests {
                    tr {
                        td { code { (test.id) } }
                        td { (test.name) }
                        td class=(status_class(test.status)) { (test.status.label(locale)) }
                        td.numeric { (format!("{:.2}s", test.time)) }
                        td.numeric { (format!("{:.1}/{:.1}", test.score, test.max_score)) }
                        td { (test.message) }
                    }
                }
            }
        }
    }
}

fn failure_sections(report: &RunReport, locale: &str) -> Markup {
    let failed: Vec<(&TestReport, &ErrorDetails)> = report
        .tests
        .iter()
        .filter_map(|test| test.error_details.as_ref().map(|details| (test, details)))
        .collect();
    html! {
        @if !failed.is_empty() {
            h2 { (t!("html_report.failures_header", locale = locale)) }
            @for (test, details) in &failed {
                details {
                    summary {
                        strong { (test.name) }
                        " "
                        (t!("report.failed_step", locale = locale, index = details.step, name = &details.step_name))
                    }
                    p { (details.error_message) }
                    @if let Some(command) = &details.command {
                        p { (t!("report.command", locale = locale)) " " code { (command) } }
                    }
                    @if let Some(code) = details.return_code {
                        p { (t!("report.return_code", locale = locale)) " " (code) }
                    }
                    @if let Some(expected) = &details.expected_output {
                        h4 { (t!("report.expected_output", locale = locale)) }
                        pre { (expected) }
                    }
                    @if let Some(stdout) = &details.stdout {
                        h4 { (t!("report.actual_stdout", locale = locale)) }
                        pre { (stdout) }
                    }
                    @if let Some(stderr) = &details.stderr {
                        h4 { (t!("report.actual_stderr", locale = locale)) }
                        pre { (stderr) }
                    }
                }
            }
        }
    }
}
