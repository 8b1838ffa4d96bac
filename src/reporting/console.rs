//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles the console rendering of coverage maps and test run
//! results. It provides colorful, formatted output with internationalization
//! support.
//!
//! 此模块处理覆盖率映射和测试运行结果的控制台渲染。
//! 它提供彩色格式化输出，支持国际化。

use crate::core::models::{ExecutionJob, MethodCoverageEntry, TestCaseStatus};
use crate::infra::t;
use colored::*;

/// Prints the coverage map as a table: one row per production method with
/// its matched test count and test names.
///
/// 将覆盖率映射打印为表格：每个生产方法一行，
/// 包含匹配的测试数量和测试名称。
///
/// # Output Format / 输出格式
/// ```text
/// --- Coverage: AddressService ---
///   - createAddress       |  3 | createAddress_Ok, createAddress_Invalid, ...
///   - deleteAddress       |  0 | (none)
/// ```
pub fn print_coverage(entries: &[MethodCoverageEntry], locale: &str) {
    let mut current_service = "";
    for entry in entries {
        if entry.service_name != current_service {
            current_service = &entry.service_name;
            println!(
                "\n{}",
                t!("coverage.banner", locale = locale, service = current_service).bold()
            );
        }

        let count = entry.test_count();
        let tests = if entry.is_covered() {
            entry
                .matched_tests
                .iter()
                .map(|m| m.method_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            t!("coverage.none", locale = locale).to_string()
        };

        let method = if entry.is_covered() {
            entry.production_method_name.green()
        } else {
            entry.production_method_name.red()
        };
        println!("  - {:<28} | {:>2} | {}", method, count, tests);
    }

    let covered = entries.iter().filter(|e| e.is_covered()).count();
    println!(
        "\n{}",
        t!(
            "coverage.summary",
            locale = locale,
            covered = covered,
            total = entries.len()
        )
        .bold()
    );
}

/// Prints a one-line progress update for a running job.
/// 为运行中的任务打印一行进度更新。
pub fn print_progress(job: &ExecutionJob, smoothed_completed: usize, locale: &str) {
    println!(
        "{}",
        t!(
            "run.progress",
            locale = locale,
            done = smoothed_completed,
            total = job.expected_total,
            passed = job.passed,
            failed = job.failed
        )
        .cyan()
    );
}

/// Prints a formatted summary of a finished run: final status, counters
/// and per-test rows, color coded by outcome.
///
/// 打印已结束运行的格式化摘要：最终状态、计数器和每个测试的行，
/// 按结果着色。
pub fn print_run_summary(job: &ExecutionJob, locale: &str) {
    println!("\n{}", t!("run.summary_banner", locale = locale).bold());

    for result in &job.results {
        let status_colored = match result.status {
            TestCaseStatus::Passed => t!("report.status_passed", locale = locale).green(),
            TestCaseStatus::Failed => t!("report.status_failed", locale = locale).red(),
            TestCaseStatus::Skipped => t!("report.status_skipped", locale = locale).dimmed(),
        };
        println!(
            "  - {:<10} | {:<50} | {:>8.3}s",
            status_colored, result.test_name, result.duration_secs
        );
    }

    println!(
        "{}",
        t!(
            "run.totals",
            locale = locale,
            status = job.status.get_status_str(locale),
            passed = job.passed,
            failed = job.failed,
            skipped = job.skipped,
            total = job.results.len()
        )
        .bold()
    );
}

/// Prints detailed information about failed tests: message and stack
/// excerpt for each failure, plus the orchestration error if the job
/// itself failed.
///
/// 打印失败测试的详细信息：每个失败的消息和堆栈摘录，
/// 以及任务本身失败时的编排错误。
pub fn print_failure_details(job: &ExecutionJob, locale: &str) {
    if let Some(error) = &job.error_message {
        println!(
            "\n{} {}",
            t!("run.orchestration_error", locale = locale).red().bold(),
            error
        );
    }

    for result in job
        .results
        .iter()
        .filter(|r| r.status == TestCaseStatus::Failed)
    {
        println!(
            "\n{}",
            t!("run.failure_detail_banner", locale = locale, name = result.test_name)
                .red()
                .bold()
        );
        if let Some(message) = &result.message {
            println!("  {}", message);
        }
        if let Some(stack) = &result.stack_excerpt {
            for line in stack.lines().take(20) {
                println!("    {}", line.dimmed());
            }
        }
    }
}
