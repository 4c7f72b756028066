//! # Step Executor Module / 步骤执行模块
//!
//! Runs a single step as a subprocess inside its test directory, with resolved
//! command and arguments, optional stdin content and a bounded wall-clock time.
//!
//! 在测试目录中以子进程方式运行单个步骤，使用解析后的命令与参数、
//! 可选的标准输入内容以及有限的墙钟时间。

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::engine::config::Step;
use crate::engine::models::{StepOutcome, StepRun};
use crate::engine::paths::PathResolver;
use crate::infra::command::{self, Captured};

/// Failures that prevent a step from producing an outcome at all.
/// 导致步骤完全无法产生结果的失败。
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Input file {0} not found")]
    StdinNotFound(String),

    #[error("Failed to read input file {path}: {source}")]
    StdinRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// A step with every placeholder substituted, ready to be spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ResolvedCommand {
    pub fn resolve(step: &Step, resolver: &PathResolver) -> Self {
        Self {
            program: resolver.resolve(&step.command),
            args: step.args.iter().map(|arg| resolver.resolve(arg)).collect(),
        }
    }

    pub fn command_line(&self) -> String {
        command::format_command_line(&self.program, &self.args)
    }

    /// Relative programs containing a separator are anchored at the test directory,
    /// bare names are looked up on `PATH`.
    fn program_path(&self, test_dir: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            test_dir.join(program)
        } else {
            program.to_path_buf()
        }
    }
}

/// Executes `step` with its already resolved command line and reports whether it
/// completed or timed out.
///
/// # Errors
/// Returns [`ExecError`] when the declared stdin file is missing or the process
/// cannot be spawned.
///
/// 使用已解析的命令行执行 `step`，并报告其是正常完成还是超时。
pub async fn execute_step(
    step: &Step,
    resolved: &ResolvedCommand,
    resolver: &PathResolver,
) -> Result<StepRun, ExecError> {
    let stdin = load_stdin(step, resolver)?;
    let limit = step.timeout();
    debug!(command = %resolved.command_line(), timeout = ?limit, "spawning step");

    let mut cmd = Command::new(resolved.program_path(resolver.test_dir()));
    cmd.args(&resolved.args).current_dir(resolver.test_dir());

    let captured = command::run_with_timeout(cmd, stdin, limit)
        .await
        .map_err(|source| ExecError::Spawn {
            command: resolved.program.clone(),
            source,
        })?;

    Ok(match captured {
        Captured::Exited {
            status,
            stdout,
            stderr,
            elapsed,
        } => {
            let return_code = command::exit_code(&status);
            debug!(return_code, elapsed = ?elapsed, "step exited");
            StepRun::Completed(StepOutcome {
                stdout,
                stderr,
                return_code,
                duration: elapsed,
            })
        }
        Captured::TimedOut { elapsed } => {
            debug!(elapsed = ?elapsed, "step timed out");
            StepRun::TimedOut { elapsed, limit }
        }
    })
}

fn load_stdin(step: &Step, resolver: &PathResolver) -> Result<Option<Vec<u8>>, ExecError> {
    let Some(stdin) = &step.stdin else {
        return Ok(None);
    };
    let path = resolver.resolve_path(stdin);
    if !path.is_file() {
        return Err(ExecError::StdinNotFound(stdin.clone()));
    }
    std::fs::read(&path)
        .map(Some)
        .map_err(|source| ExecError::StdinRead {
            path: stdin.clone(),
            source,
        })
}
