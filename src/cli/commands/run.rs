//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command for the Coverage Runner CLI:
//! it submits one test execution to the orchestrator and polls the job
//! registry until the run reaches a terminal state, smoothing the progress
//! line with the time-based estimator while output parsing lags.
//!
//! 此模块实现 Coverage Runner CLI 的 `run` 命令：
//! 向编排器提交一次测试执行，并轮询任务注册表直到运行达到终止状态，
//! 在输出解析滞后时用基于时间的估算器平滑进度行。

use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, path::PathBuf};

use crate::{
    core::{
        config,
        models::{ExecutionRequest, ExecutionStatus},
        orchestrator::ExecutionOrchestrator,
        progress,
        registry::JobRegistry,
        store::MemoryStore,
    },
    infra::t,
    reporting::console::{print_failure_details, print_progress, print_run_summary},
};

/// How often the job registry is polled for a status snapshot.
/// 轮询任务注册表获取状态快照的间隔。
const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Executes the run command with the provided arguments.
///
/// # Arguments
/// * `config` - Path to the runner configuration file
/// * `project_dir` - Directory the project root search starts from
/// * `service` - Service whose tests should run
/// * `method` - Single production method to resolve into tests
/// * `tests` - Explicit test identifiers
/// * `all` - Run every known service's tests
/// * `json` - Emit the final job snapshot as JSON instead of a summary
///
/// # Returns
/// A Result indicating success or failure of the command execution
pub async fn execute(
    config: PathBuf,
    project_dir: PathBuf,
    service: Option<String>,
    method: Option<String>,
    tests: Vec<String>,
    all: bool,
    json: bool,
) -> Result<()> {
    let config_path = fs::canonicalize(&config)
        .with_context(|| t!("config_read_failed_path", path = config.display()))?;
    let runner_config = config::load_runner_config(&config_path)
        .with_context(|| t!("config_parse_failed"))?;
    let locale = runner_config.language.clone();
    rust_i18n::set_locale(&locale);

    let project_dir = fs::canonicalize(&project_dir)
        .with_context(|| t!("project_dir_not_found", path = project_dir.display()))?;

    println!(
        "{}",
        t!("project_dir_detected", locale = &locale, path = project_dir.display())
    );

    let progress_config = runner_config.progress;
    let registry = Arc::new(JobRegistry::new());
    let store = Arc::new(MemoryStore::new());
    let orchestrator = ExecutionOrchestrator::new(runner_config, project_dir, registry, store);

    let request = ExecutionRequest {
        run_all: all,
        service,
        method,
        tests,
        triggered_by_id: None,
        triggered_by_name: env::var("USER").ok(),
        client_id: None,
        environment: None,
    };

    let submitted = orchestrator
        .submit(request)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!(
        "{}",
        t!(
            "run.submitted",
            locale = &locale,
            id = submitted.execution_id,
            expected = submitted.expected_total
        )
    );

    // Poll until terminal. The snapshot sequence never shows a terminal
    // status without completed_at, and the result list never shrinks.
    let mut last_reported = 0usize;
    let job = loop {
        let job = orchestrator
            .status(submitted.execution_id)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        if job.is_terminal() {
            break job;
        }

        if job.status == ExecutionStatus::Running && job.expected_total > 0 {
            let elapsed_ms = (Utc::now() - job.started_at).num_milliseconds().max(0) as u64;
            let smoothed = progress::estimate(
                job.confirmed_completed,
                job.expected_total,
                elapsed_ms,
                &progress_config,
            );
            if smoothed > last_reported {
                last_reported = smoothed;
                print_progress(&job, smoothed, &locale);
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_run_summary(&job, &locale);
    }

    match job.status {
        ExecutionStatus::Completed => {
            println!("\n{}", t!("run.all_passed", locale = &locale).green().bold());
            Ok(())
        }
        ExecutionStatus::CompletedWithFailures => {
            if !json {
                print_failure_details(&job, &locale);
            }
            anyhow::bail!(t!("run.completed_with_failures_bail", locale = &locale))
        }
        _ => {
            if !json {
                print_failure_details(&job, &locale);
            }
            anyhow::bail!(t!(
                "run.failed_bail",
                locale = &locale,
                error = job.error_message.as_deref().unwrap_or("unknown error")
            ))
        }
    }
}
