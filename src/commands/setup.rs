//! # Setup Phase Module / 准备阶段模块
//!
//! Runs the project's setup commands once, at the project root, before any test case
//! is discovered or executed. The first failing command aborts the invocation.
//!
//! 在发现或执行任何测试用例之前，于项目根目录运行一次项目的准备命令。
//! 第一个失败的命令会中止本次调用。

use anyhow::{Result, bail};
use colored::*;
use tokio::process::Command;
use tracing::debug;

use crate::engine::config::{Project, SetupStep};
use crate::infra::command::{self, Captured};
use crate::infra::t;

/// Runs every configured setup step in order.
///
/// # Arguments
/// * `project` - The project providing the steps and the working directory
/// * `quiet` - Suppresses progress messages, used for JSON output
/// * `locale` - The language locale to use for messages
///
/// # Errors
/// Returns an error describing the first step that could not be spawned,
/// timed out or exited with a non-zero status.
pub async fn run_setup_steps(project: &Project, quiet: bool, locale: &str) -> Result<()> {
    for step in &project.config.setup.steps {
        run_setup_step(project, step, quiet, locale).await?;
    }
    Ok(())
}

async fn run_setup_step(project: &Project, step: &SetupStep, quiet: bool, locale: &str) -> Result<()> {
    if !quiet {
        if let Some(message) = &step.message {
            println!("{}", message.bold());
        }
    }

    let command_line = command::format_command_line(&step.command, &step.args);
    debug!(command = %command_line, "running setup step");
    let mut cmd = Command::new(&step.command);
    cmd.args(&step.args).current_dir(&project.root);

    let captured = match command::run_with_timeout(cmd, None, step.timeout()).await {
        Ok(captured) => captured,
        Err(e) => bail!("{}", t!(
            "setup.spawn_failed",
            locale = locale,
            command = &command_line,
            error = e
        )),
    };

    match captured {
        Captured::Exited { status, .. } if status.success() => {
            if !quiet {
                if let Some(message) = &step.success_message {
                    println!("{} {}", "✓".green(), message);
                }
            }
            Ok(())
        }
        Captured::Exited { status, stderr, .. } => {
            let code = command::exit_code(&status);
            if !quiet && !stderr.trim().is_empty() {
                eprintln!("{}", stderr.trim_end());
            }
            bail!("{}", t!(
                "setup.command_failed",
                locale = locale,
                command = &command_line,
                code = code
            ))
        }
        Captured::TimedOut { .. } => bail!("{}", t!(
            "setup.timed_out",
            locale = locale,
            command = &command_line,
            timeout = step.timeout().as_secs_f64()
        )),
    }
}
