//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of grading reports in multiple formats.
//! It provides the aggregated run report, colorful console output, the JSON report
//! and styled HTML reports, all with internationalization support.
//!
//! 此模块处理多种格式的评分报告生成和显示。
//! 它提供汇总的运行报告、彩色控制台输出、JSON 报告和样式化 HTML 报告，均支持国际化。

pub mod console;
pub mod html;
pub mod summary;

// Re-export common reporting functions
pub use console::{ConsoleProgress, print_discovery_error, print_summary};
pub use html::generate_html_report;
pub use summary::{RunReport, TestReport};
