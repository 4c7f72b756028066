//! # Autograder Library / 自动评分库
//!
//! This library provides the core functionality for the Autograder tool,
//! a configuration-driven grader that runs ordered command steps against
//! expected behavior and computes a weighted score.
//!
//! 此库为 Autograder 工具提供核心功能，
//! 这是一个配置驱动的评分器，按顺序执行命令步骤、校验其行为并计算加权得分。
//!
//! ## Modules / 模块
//!
//! - `engine` - Test case model, step execution, checker chain and score aggregation
//! - `infra` - Infrastructure services like process capture and file system operations
//! - `reporting` - Console, JSON and HTML result rendering
//! - `cli` / `commands` - Command-line interface and its commands
//!
//! - `engine` - 测试用例模型、步骤执行、检查器链与分数汇总
//! - `infra` - 基础设施服务，如进程输出捕获和文件系统操作
//! - `reporting` - 控制台、JSON 和 HTML 结果呈现
//! - `cli` / `commands` - 命令行接口及其命令

pub mod cli;
pub mod commands;
pub mod engine;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::engine::{checker, config, execution, models, planner};

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "AUTOGRADER_LOG";

/// Initializes the application's internationalization (i18n).
///
/// An explicitly requested language wins; otherwise the system locale is used.
/// It attempts to match the full locale (e.g., "zh-CN"), then just the language
/// code (e.g., "en"), and finally falls back to the default language ("en").
/// Returns the locale that was activated.
pub fn init(requested: Option<&str>) -> String {
    let locale = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale.as_str()) {
        locale.as_str()
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

/// Installs the global `tracing` subscriber.
///
/// Diagnostics go to stderr so that `--json` output on stdout stays machine readable.
/// The filter is read from `AUTOGRADER_LOG` and defaults to `warn`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
