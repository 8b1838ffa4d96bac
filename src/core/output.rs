//! # Output Stream Parsing Module / 输出流解析模块
//!
//! This module incrementally parses the external runner's combined
//! stdout/stderr stream. Two line shapes carry signal: per-class summary
//! lines with run/failure/error/skip counts, and "Running <class>" markers.
//! The counts parsed here are cumulative best-effort roll-ups; the post-run
//! report reconciliation supersedes them.
//!
//! 此模块增量解析外部运行器合并后的 stdout/stderr 流。
//! 两种行形态携带信息：带有运行/失败/错误/跳过计数的按类汇总行，
//! 以及 "Running <class>" 标记。这里解析出的计数是累计的尽力估算；
//! 运行后的报告对账会取代它们。

use once_cell::sync::Lazy;
use regex::Regex;

static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Tests run:\s*(\d+),\s*Failures:\s*(\d+),\s*Errors:\s*(\d+),\s*Skipped:\s*(\d+)")
        .expect("valid summary pattern")
});

static RUNNING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Running\s+([A-Za-z_][A-Za-z0-9_.$]*)\s*$").expect("valid running pattern")
});

/// A parsed signal from one output line.
/// 从一行输出解析出的信号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A completed class's roll-up counts.
    /// 一个已完成类的汇总计数。
    ClassSummary {
        run: usize,
        failures: usize,
        errors: usize,
        skipped: usize,
    },
    /// The runner announced it is executing a class.
    /// 运行器宣布正在执行某个类。
    RunningClass(String),
}

impl OutputEvent {
    /// Tests that passed within this summary.
    pub fn passed(&self) -> usize {
        match self {
            OutputEvent::ClassSummary {
                run,
                failures,
                errors,
                skipped,
            } => run.saturating_sub(failures + errors + skipped),
            OutputEvent::RunningClass(_) => 0,
        }
    }
}

/// Parses one line of runner output. Returns `None` for lines carrying no
/// progress signal. The runner's final aggregate line matches the same
/// shape as per-class lines and may briefly double-count; reconciliation
/// recomputes every total from the report files afterwards.
///
/// 解析一行运行器输出。不携带进度信号的行返回 `None`。
/// 运行器最终的总计行与按类行形态相同，可能短暂地重复计数；
/// 之后的对账会根据报告文件重新计算所有总数。
pub fn parse_line(line: &str) -> Option<OutputEvent> {
    if let Some(caps) = SUMMARY_RE.captures(line) {
        return Some(OutputEvent::ClassSummary {
            run: caps[1].parse().unwrap_or(0),
            failures: caps[2].parse().unwrap_or(0),
            errors: caps[3].parse().unwrap_or(0),
            skipped: caps[4].parse().unwrap_or(0),
        });
    }
    if let Some(caps) = RUNNING_RE.captures(line) {
        return Some(OutputEvent::RunningClass(caps[1].to_string()));
    }
    None
}
