//! # Execution Orchestrator Module / 执行编排模块
//!
//! The top-level coordinator for asynchronous test runs. A submission is
//! validated synchronously, registered as a job, and handed to a background
//! worker that launches the external runner, streams its output through the
//! incremental parser, reconciles against the XML reports after exit, and
//! persists the final results. Failures after submission are only ever
//! visible through the job's status — the submitter has already returned.
//!
//! 异步测试运行的顶层协调器。提交会被同步校验、注册为任务，
//! 然后交给后台工作任务：启动外部运行器、将其输出流经增量解析器、
//! 退出后与 XML 报告对账、并持久化最终结果。
//! 提交之后的失败只能通过任务状态观察到 —— 提交方早已返回。

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::config::RunnerConfig;
use crate::core::coverage::CoverageService;
use crate::core::error::ApiError;
use crate::core::models::{
    DiscoveredTestMethod, ExecutionJob, ExecutionRequest, ExecutionScope, ExecutionStatus,
    LatestTestResult, TestRun, TestRunResult,
};
use crate::core::matcher;
use crate::core::output::{self, OutputEvent};
use crate::core::registry::{JobRegistry, ProcessHandle};
use crate::core::selector::{self, TestSelector};
use crate::core::store::ResultStore;
use crate::infra::{command, fs as infra_fs, reports};

/// How often the worker polls the reaped process for its exit status once
/// the output stream has ended.
/// 输出流结束后，工作任务轮询进程退出状态的间隔。
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A validated submission, resolved down to scope, selection and expected
/// totals before any subprocess exists.
/// 校验后的提交，在任何子进程出现之前已解析出范围、选择和预期总数。
#[derive(Debug, Clone)]
struct ResolvedRequest {
    scope: ExecutionScope,
    expected_total: usize,
    /// `None` means "run everything" — no selection argument is passed.
    selector: Option<TestSelector>,
    /// Set when the submission named a single production method.
    production_method: Option<String>,
    /// Scanner output for the targeted class, reused for display-name
    /// enrichment when persisting. Empty for run-all submissions.
    discovered: Vec<DiscoveredTestMethod>,
}

/// Top-level coordinator. Constructed once with its collaborators injected;
/// cheap to clone handles out of via `Arc`.
/// 顶层协调器。构造一次并注入协作对象。
pub struct ExecutionOrchestrator {
    config: RunnerConfig,
    project_dir: PathBuf,
    registry: Arc<JobRegistry>,
    store: Arc<dyn ResultStore>,
    coverage: CoverageService,
}

impl ExecutionOrchestrator {
    pub fn new(
        config: RunnerConfig,
        project_dir: PathBuf,
        registry: Arc<JobRegistry>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        let coverage = CoverageService::new(config.clone(), project_dir.clone());
        Self {
            config,
            project_dir,
            registry,
            store,
            coverage,
        }
    }

    pub fn coverage(&self) -> &CoverageService {
        &self.coverage
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Validates and submits an execution. Returns a snapshot of the job
    /// (`PENDING` or already `RUNNING`); execution continues on a
    /// background worker and is observed by polling `status`.
    ///
    /// 校验并提交一次执行。返回任务快照（`PENDING` 或已是 `RUNNING`）；
    /// 执行在后台工作任务上继续，通过轮询 `status` 观察。
    pub async fn submit(&self, request: ExecutionRequest) -> Result<ExecutionJob, ApiError> {
        let resolved = self.resolve_request(&request)?;

        let job = ExecutionJob::new(resolved.scope.clone(), resolved.expected_total);
        let execution_id = self.registry.create(job);

        let worker = ExecutionWorker {
            config: self.config.clone(),
            project_dir: self.project_dir.clone(),
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            execution_id,
            resolved,
            request,
        };
        tokio::spawn(async move { worker.run().await });

        self.registry.snapshot(execution_id)
    }

    /// The polling boundary: a snapshot of the job's current state.
    /// 轮询边界：任务当前状态的快照。
    pub fn status(&self, execution_id: Uuid) -> Result<ExecutionJob, ApiError> {
        self.registry.snapshot(execution_id)
    }

    /// Request validation and scope resolution, performed synchronously at
    /// submission time so caller errors surface before any subprocess is
    /// started.
    /// 请求校验和范围解析，在提交时同步执行，
    /// 使调用方错误在启动任何子进程之前暴露。
    fn resolve_request(&self, request: &ExecutionRequest) -> Result<ResolvedRequest, ApiError> {
        if request.run_all {
            let entries = self
                .coverage
                .coverage_all()
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            return Ok(ResolvedRequest {
                scope: ExecutionScope::All,
                expected_total: CoverageService::expected_total(&entries),
                selector: None,
                production_method: None,
                discovered: Vec::new(),
            });
        }

        let service_name = request
            .service
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("no execution scope given".to_string()))?;
        let service = self
            .config
            .service(service_name)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("unknown service: {}", service_name))
            })?
            .clone();
        let outer_class = service.test_class_name();

        if let Some(method) = request.method.as_deref() {
            let discovered = self
                .coverage
                .scan_service(&service)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            let matched = matcher::matching_tests(method, &discovered);
            if matched.is_empty() {
                return Err(ApiError::BadRequest(format!(
                    "no tests found for method: {}",
                    method
                )));
            }
            let tests: Vec<String> = matched.iter().map(|t| t.method_name.clone()).collect();
            let sel = selector::for_tests(&tests, &outer_class, &discovered);
            return Ok(ResolvedRequest {
                scope: ExecutionScope::Tests {
                    service: service.name.clone(),
                    tests: tests.clone(),
                },
                expected_total: tests.len(),
                selector: Some(sel),
                production_method: Some(method.to_string()),
                discovered,
            });
        }

        if !request.tests.is_empty() {
            let discovered = self
                .coverage
                .scan_service(&service)
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            let sel = selector::for_tests(&request.tests, &outer_class, &discovered);
            return Ok(ResolvedRequest {
                scope: ExecutionScope::Tests {
                    service: service.name.clone(),
                    tests: request.tests.clone(),
                },
                // Exact by definition: the caller named the tests.
                expected_total: request.tests.len(),
                selector: Some(sel),
                production_method: None,
                discovered,
            });
        }

        let entries = self
            .coverage
            .coverage_for_service(&service)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let discovered = self
            .coverage
            .scan_service(&service)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(ResolvedRequest {
            scope: ExecutionScope::Service {
                service: service.name.clone(),
            },
            expected_total: CoverageService::expected_total(&entries),
            selector: Some(selector::for_class(&outer_class)),
            production_method: None,
            discovered,
        })
    }
}

/// The background worker owning one execution's entire lifecycle. By
/// construction it is the only writer of the job's counters and results.
/// 拥有一次执行完整生命周期的后台工作任务。
/// 按构造约定，它是该任务计数器和结果的唯一写入方。
struct ExecutionWorker {
    config: RunnerConfig,
    project_dir: PathBuf,
    registry: Arc<JobRegistry>,
    store: Arc<dyn ResultStore>,
    execution_id: Uuid,
    resolved: ResolvedRequest,
    request: ExecutionRequest,
}

impl ExecutionWorker {
    /// Runs the execution, converting any unexpected error into a terminal
    /// `FAILED` on the job. Nothing escapes the worker.
    /// 运行执行过程，任何意外错误都转换为任务上的终态 `FAILED`。
    /// 不会有错误逃出工作任务。
    async fn run(self) {
        let execution_id = self.execution_id;
        if let Err(e) = self.execute().await {
            eprintln!("Execution {} failed: {:#}", execution_id, e);
            self.registry.update(execution_id, |job| {
                if !job.is_terminal() {
                    job.status = ExecutionStatus::Failed;
                    job.error_message = Some(format!("{:#}", e));
                    job.completed_at = Some(Utc::now());
                }
            });
            self.registry.detach_process(execution_id);
        }
    }

    async fn execute(&self) -> Result<()> {
        let execution_id = self.execution_id;
        self.registry.update(execution_id, |job| {
            if job.status == ExecutionStatus::Pending {
                job.status = ExecutionStatus::Running;
            }
        });

        let project_root = infra_fs::locate_project_root(&self.project_dir, &self.config)?;
        let cmd = self.build_command(&project_root)?;

        let (child, mut lines) =
            command::spawn_line_stream(cmd).context("Failed to launch test runner")?;
        let handle: ProcessHandle = Arc::new(Mutex::new(child));
        self.registry
            .attach_process(execution_id, Arc::clone(&handle));

        // Stream until the pipes close. Killing the process (cancellation)
        // also ends this loop.
        while let Some(line) = lines.recv().await {
            match output::parse_line(&line) {
                Some(OutputEvent::ClassSummary {
                    run,
                    failures,
                    errors,
                    skipped,
                }) => {
                    let passed = run.saturating_sub(failures + errors + skipped);
                    self.registry.update(execution_id, |job| {
                        job.confirmed_completed += run;
                        job.passed += passed;
                        job.failed += failures + errors;
                        job.skipped += skipped;
                    });
                }
                Some(OutputEvent::RunningClass(_)) => {
                    // Defensive: the status is already RUNNING, but this
                    // guards against a submission/display race.
                    self.registry.update(execution_id, |job| {
                        if !job.is_terminal() {
                            job.status = ExecutionStatus::Running;
                        }
                    });
                }
                None => {}
            }
        }

        let status = self.reap_exit_status(&handle).await?;
        self.registry.detach_process(execution_id);

        // A cancellation may have marked the job terminal while we streamed;
        // terminal states are final, so stop without touching it further.
        if self
            .registry
            .snapshot(execution_id)
            .map(|job| job.is_terminal())
            .unwrap_or(true)
        {
            return Ok(());
        }

        self.reconcile_reports(&project_root);

        let captured = self
            .registry
            .snapshot(execution_id)
            .map(|job| job.results.len())
            .unwrap_or(0);
        let exit_code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "terminated by signal".to_string());
        let final_status = if status.success() {
            ExecutionStatus::Completed
        } else if captured > 0 {
            ExecutionStatus::CompletedWithFailures
        } else {
            ExecutionStatus::Failed
        };

        self.registry.update(execution_id, |job| {
            if !job.is_terminal() {
                job.status = final_status;
                job.completed_at = Some(Utc::now());
                if final_status == ExecutionStatus::Failed {
                    job.error_message = Some(format!(
                        "test runner exited with status {} and no results were captured",
                        exit_code
                    ));
                }
            }
        });

        let snapshot = self.registry.snapshot(execution_id)?;
        if matches!(
            snapshot.status,
            ExecutionStatus::Completed | ExecutionStatus::CompletedWithFailures
        ) {
            self.persist(&snapshot)
                .context("Failed to persist run results")?;
        }
        Ok(())
    }

    /// Builds the runner invocation: the default Maven command with batch
    /// mode and unbuffered, untrimmed Surefire output, or the configured
    /// custom command (shell-expanded and split). The `-Dtest` selection is
    /// appended for scoped runs either way.
    ///
    /// 构建运行器调用：默认的 Maven 命令（批处理模式、
    /// 不缓冲且不截断的 Surefire 输出），或配置的自定义命令
    /// （shell 展开并拆分）。限定范围的运行无论哪种方式都会附加
    /// `-Dtest` 选择参数。
    fn build_command(&self, project_root: &Path) -> Result<Command> {
        let mut cmd = match &self.config.runner.command {
            Some(custom) => {
                let expanded = shellexpand::full(custom)
                    .with_context(|| format!("Failed to expand command: {custom}"))?
                    .to_string();
                let parts = shlex::split(&expanded).ok_or_else(|| {
                    anyhow::anyhow!("Failed to parse runner command: {}", expanded)
                })?;
                if parts.is_empty() {
                    return Err(anyhow::anyhow!("Empty runner command after parsing."));
                }
                let mut cmd = Command::new(&parts[0]);
                cmd.args(&parts[1..]);
                cmd
            }
            None => {
                let mut cmd = Command::new("mvn");
                cmd.arg("-B")
                    .arg("test")
                    .arg("-Dsurefire.useFile=false")
                    .arg("-DtrimStackTrace=false")
                    .arg("-DfailIfNoTests=false");
                cmd
            }
        };

        if let Some(sel) = &self.resolved.selector {
            cmd.arg(format!("-Dtest={}", sel.as_argument()));
        }
        cmd.kill_on_drop(true).current_dir(project_root);
        Ok(cmd)
    }

    /// Waits for the child to exit. The handle is shared with the registry
    /// for cancellation, so the lock is only held per poll, never across
    /// the whole wait.
    /// 等待子进程退出。句柄与注册表共享以支持取消，
    /// 因此锁只在每次轮询时短暂持有，绝不跨越整个等待过程。
    async fn reap_exit_status(&self, handle: &ProcessHandle) -> Result<std::process::ExitStatus> {
        loop {
            {
                let mut child = handle.lock().await;
                if let Some(status) = child
                    .try_wait()
                    .context("Failed to wait for test runner")?
                {
                    return Ok(status);
                }
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    /// The authoritative pass: per-test records from the report files are
    /// appended (deduplicated by test identifier) and every aggregate is
    /// recomputed from the completed result list, superseding the streamed
    /// estimates.
    ///
    /// 权威环节：报告文件中的单测记录被追加（按测试标识符去重），
    /// 所有聚合值根据完整的结果列表重新计算，取代流式估算。
    fn reconcile_reports(&self, project_root: &Path) {
        let report_dir = project_root.join(&self.config.runner.report_dir);
        if !report_dir.is_dir() {
            return;
        }

        let scope_class = self.scope_class();
        let files = match reports::collect_report_files(&report_dir) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("Failed to list report files: {:#}", e);
                return;
            }
        };

        for file in files {
            if let Some(class) = scope_class.as_deref() {
                let file_name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                // Scoped runs only reconcile against their own class's
                // reports; stale files from earlier runs stay out.
                if !file_name.contains(class) {
                    continue;
                }
            }
            match reports::parse_report_file(&file) {
                Ok(records) => {
                    self.registry.update(self.execution_id, |job| {
                        for record in records {
                            job.add_result(record);
                        }
                    });
                }
                Err(e) => eprintln!("Failed to parse report {}: {:#}", file.display(), e),
            }
        }

        self.registry
            .update(self.execution_id, |job| job.recompute_counts());
    }

    /// The outer test class this run is scoped to, when it is scoped.
    fn scope_class(&self) -> Option<String> {
        match &self.resolved.scope {
            ExecutionScope::All => None,
            ExecutionScope::Service { service } | ExecutionScope::Tests { service, .. } => self
                .config
                .service(service)
                .map(|s| s.test_class_name()),
        }
    }

    /// Emits the persisted records for a completed run: the `TestRun`
    /// aggregate, one `TestRunResult` per executed test, and the
    /// latest-result upsert per `(client, service, test class, test
    /// method)` key.
    ///
    /// 为已完成的运行产出持久化记录：`TestRun` 聚合、
    /// 每个已执行测试一条 `TestRunResult`，
    /// 以及按 `(client, service, test class, test method)` 键的最新结果
    /// upsert。
    fn persist(&self, job: &ExecutionJob) -> Result<()> {
        let completed_at = job.completed_at.unwrap_or_else(Utc::now);
        let run = TestRun {
            id: Uuid::new_v4(),
            service: job.scope.service().map(str::to_string),
            run_type: job.scope.run_type().to_string(),
            triggered_by_id: self.request.triggered_by_id.clone(),
            triggered_by_name: self.request.triggered_by_name.clone(),
            client_id: self.request.client_id.clone(),
            environment: self.request.environment.clone(),
            started_at: job.started_at,
            completed_at,
            total: job.results.len(),
            passed: job.passed,
            failed: job.failed,
            skipped: job.skipped,
            status: job.status,
        };
        self.store.record_run(&run)?;

        let client_id = self
            .request
            .client_id
            .clone()
            .unwrap_or_else(|| "default".to_string());

        let mut rows = Vec::with_capacity(job.results.len());
        for result in &job.results {
            // Prefer the exact expanded entry so a parameterized invocation
            // keeps its own indexed display name.
            let display_name = self
                .resolved
                .discovered
                .iter()
                .find(|d| d.method_name == result.test_name)
                .or_else(|| {
                    self.resolved.discovered.iter().find(|d| {
                        d.base_name() == selector::strip_invocation_suffix(&result.test_name)
                    })
                })
                .and_then(|d| d.display_name.clone());
            rows.push(TestRunResult {
                id: Uuid::new_v4(),
                run_id: run.id,
                service: Some(self.service_for_class(&result.class_name)),
                production_method: self.resolved.production_method.clone(),
                test_class: result.class_name.clone(),
                test_method: result.test_name.clone(),
                display_name,
                status: result.status,
                duration_secs: result.duration_secs,
                error_message: result.message.clone(),
                stack_excerpt: result.stack_excerpt.clone(),
                recorded_at: completed_at,
            });
        }
        self.store.record_results(&rows)?;

        for row in &rows {
            self.store.upsert_latest(&LatestTestResult {
                client_id: client_id.clone(),
                service: row.service.clone().unwrap_or_default(),
                test_class: row.test_class.clone(),
                test_method: row.test_method.clone(),
                status: row.status,
                duration_secs: row.duration_secs,
                error_message: row.error_message.clone(),
                recorded_at: row.recorded_at,
            })?;
        }
        Ok(())
    }

    /// Resolves the service a reported class belongs to: the scoped service
    /// when there is one, otherwise the configured service whose test class
    /// matches, otherwise the class's simple name without its `Test` suffix.
    /// 解析报告类所属的服务：有范围服务时用它，
    /// 否则匹配配置中测试类一致的服务，
    /// 否则取类的简单名去掉 `Test` 后缀。
    fn service_for_class(&self, class_name: &str) -> String {
        if let Some(service) = self.resolved.scope.service() {
            return service.to_string();
        }

        let simple = class_name
            .rsplit('.')
            .next()
            .unwrap_or(class_name)
            .split('$')
            .next()
            .unwrap_or(class_name);
        if let Some(service) = self
            .config
            .services
            .iter()
            .find(|s| s.test_class_name() == simple)
        {
            return service.name.clone();
        }
        simple.strip_suffix("Test").unwrap_or(simple).to_string()
    }
}
