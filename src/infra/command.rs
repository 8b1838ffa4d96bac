//! # Command Execution Module / 命令执行模块
//!
//! This module spawns the external test runner and exposes its combined
//! stdout/stderr as a single stream of lines. The orchestrator parses the
//! stream incrementally, so output is forwarded line by line instead of
//! being collected into one string.
//!
//! 此模块启动外部测试运行器，并将其合并后的 stdout/stderr
//! 作为单一的行流暴露出来。编排器会增量解析该流，
//! 因此输出按行转发，而不是收集为一个字符串。

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Spawns a command and returns the child handle together with a receiver
/// yielding its stdout and stderr lines, merged in arrival order.
///
/// Both pipes are drained by background tasks; when the process exits (or
/// is killed) the pipes close, the tasks finish, the senders drop and the
/// receiver reports end of stream. Killing the process therefore unblocks
/// a reader awaiting the next line.
///
/// 启动一个命令，返回子进程句柄和一个接收器，
/// 该接收器按到达顺序产出合并后的 stdout 和 stderr 行。
///
/// 两个管道由后台任务读取；当进程退出（或被终止）时管道关闭，
/// 任务结束，发送端被丢弃，接收器报告流结束。
/// 因此终止进程会解除等待下一行的读取方的阻塞。
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
pub fn spawn_line_stream(
    mut cmd: Command,
) -> std::io::Result<(Child, mpsc::UnboundedReceiver<String>)> {
    let mut child = cmd
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            return Err(std::io::Error::other("Failed to capture stdout"));
        }
    };
    let stderr = match child.stderr.take() {
        Some(stderr) => stderr,
        None => {
            return Err(std::io::Error::other("Failed to capture stderr"));
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();

    // Drain stdout line by line.
    // 逐行读取 stdout。
    let stdout_tx = tx.clone();
    tokio::spawn(async move {
        let reader = BufReader::new(stdout);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if stdout_tx.send(line).is_err() {
                break;
            }
        }
    });

    // Drain stderr into the same channel for single-stream parsing.
    // 将 stderr 读入同一通道，实现单流解析。
    tokio::spawn(async move {
        let reader = BufReader::new(stderr);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    Ok((child, rx))
}
