//! # Process Capture Module / 进程捕获模块
//!
//! Spawns a command with optional stdin content, captures stdout and stderr
//! separately and enforces a wall-clock limit, killing the child on expiry.
//!
//! 启动命令（可选地写入标准输入），分别捕获标准输出和标准错误，
//! 并强制执行墙钟时间限制，超时时终止子进程。

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};

use crate::infra::t;

/// What happened to a captured process.
/// 被捕获进程的结束情况。
#[derive(Debug)]
pub enum Captured {
    /// The process exited within its limit.
    Exited {
        status: ExitStatus,
        stdout: String,
        stderr: String,
        elapsed: Duration,
    },
    /// The limit expired and the process was killed.
    TimedOut { elapsed: Duration },
}

/// Spawns `cmd`, feeds it `stdin`, and captures both output streams.
///
/// The process receives a null stdin when `stdin` is `None`. Output is decoded
/// lossily as UTF-8. Waiting and reading happen concurrently so a child that fills
/// its pipe buffers cannot deadlock against us.
///
/// # Returns
/// `Err` only when the process could not be spawned or awaited.
///
/// 启动 `cmd`，写入 `stdin`，并捕获两个输出流。
/// 等待与读取并发进行，避免子进程写满管道缓冲区造成死锁。
pub async fn run_with_timeout(
    mut cmd: Command,
    stdin: Option<Vec<u8>>,
    limit: Duration,
) -> io::Result<Captured> {
    let start = Instant::now();
    let mut child = cmd
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other(t!("command.capture_stdout_failed").to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other(t!("command.capture_stderr_failed").to_string()))?;
    let stdin_pipe = child.stdin.take();

    let collect = async {
        let (_, status, stdout, stderr) = tokio::join!(
            feed_stdin(stdin_pipe, stdin),
            child.wait(),
            read_stream(stdout),
            read_stream(stderr),
        );
        Ok::<_, io::Error>((status?, stdout?, stderr?))
    };

    let waited = tokio::time::timeout(limit, collect).await;
    match waited {
        Ok(result) => {
            let (status, stdout, stderr) = result?;
            Ok(Captured::Exited {
                status,
                stdout,
                stderr,
                elapsed: start.elapsed(),
            })
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill timed out process");
            }
            Ok(Captured::TimedOut {
                elapsed: start.elapsed(),
            })
        }
    }
}

async fn feed_stdin(pipe: Option<ChildStdin>, data: Option<Vec<u8>>) {
    if let (Some(mut pipe), Some(data)) = (pipe, data) {
        // A child that exits without reading its input closes the pipe early.
        if let Err(e) = pipe.write_all(&data).await {
            tracing::debug!(error = %e, "stdin was not fully consumed");
        }
        // Dropping the handle sends EOF.
    }
}

async fn read_stream<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<String> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Maps an exit status to a return code.
/// Processes killed by a signal report the negated signal number on Unix.
///
/// 将退出状态映射为返回码。在 Unix 上，被信号终止的进程返回信号编号的相反数。
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Renders a program and its arguments as a copy-pasteable shell command line.
///
/// 将程序及其参数渲染为可直接复制粘贴的 shell 命令行。
pub fn format_command_line(program: &str, args: &[String]) -> String {
    let words = std::iter::once(program).chain(args.iter().map(String::as_str));
    shlex::try_join(words.clone()).unwrap_or_else(|_| words.collect::<Vec<_>>().join(" "))
}
