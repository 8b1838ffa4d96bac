//! # Data Models Module / 数据模型模块
//!
//! This module defines the core data structures used throughout the coverage
//! runner. It includes models for discovered test methods, coverage entries,
//! execution jobs and the records handed to the result store.
//!
//! 此模块定义了整个覆盖率运行器中使用的核心数据结构。
//! 它包括已发现的测试方法、覆盖率条目、执行任务以及交给结果存储的记录的模型。

use crate::infra::t;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One test method found by statically scanning a test source file.
/// 通过静态扫描测试源文件发现的单个测试方法。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredTestMethod {
    /// The method identifier as written in source. Parameterized tests are
    /// expanded into one entry per invocation, named the way Surefire names
    /// them, e.g. `check(String)[2]`.
    /// 源码中书写的方法标识符。参数化测试会按 Surefire 的命名方式
    /// 展开为每次调用一个条目，例如 `check(String)[2]`。
    pub method_name: String,
    /// The human-readable label from a `@DisplayName` annotation, if any.
    /// 来自 `@DisplayName` 注解的人类可读标签（如果有）。
    pub display_name: Option<String>,
    /// The fully qualified class selector this method is declared under:
    /// either the outer test class name, or `Outer$Nested` for methods
    /// inside a `@Nested` block.
    /// 此方法声明所在的完全限定类选择器：外层测试类名，
    /// 或对于 `@Nested` 块内的方法为 `Outer$Nested`。
    pub declaring_scope: String,
}

impl DiscoveredTestMethod {
    /// Returns the declared method name with any parameterized invocation
    /// suffix (`(...)[n]`) removed.
    /// 返回去除参数化调用后缀（`(...)[n]`）后的声明方法名。
    pub fn base_name(&self) -> &str {
        match self.method_name.find('(') {
            Some(idx) => &self.method_name[..idx],
            None => &self.method_name,
        }
    }
}

/// A production method paired with the tests that exercise it, derived
/// purely from naming convention.
/// 一个生产方法与覆盖它的测试的配对，纯粹由命名约定推导。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCoverageEntry {
    /// The service the production method belongs to.
    /// 该生产方法所属的服务。
    pub service_name: String,
    /// The production method being reported on.
    /// 被报告的生产方法。
    pub production_method_name: String,
    /// The matched tests, in scan order.
    /// 匹配到的测试，按扫描顺序排列。
    pub matched_tests: Vec<DiscoveredTestMethod>,
}

impl MethodCoverageEntry {
    /// Whether at least one test exercises this method.
    pub fn is_covered(&self) -> bool {
        !self.matched_tests.is_empty()
    }

    pub fn test_count(&self) -> usize {
        self.matched_tests.len()
    }
}

/// The lifecycle state of an execution job. Transitions are one-directional:
/// `Pending -> Running -> {Completed, CompletedWithFailures, Failed}` and
/// terminal states are final.
///
/// 执行任务的生命周期状态。状态转换是单向的：
/// `Pending -> Running -> {Completed, CompletedWithFailures, Failed}`，
/// 且终止状态不可再变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Constructed, subprocess not yet launched.
    /// 已构造，子进程尚未启动。
    Pending,
    /// Subprocess launched and being streamed.
    /// 子进程已启动，正在读取输出。
    Running,
    /// Runner exited with code 0.
    /// 运行器以退出码 0 结束。
    Completed,
    /// Runner exited nonzero but at least one result was captured;
    /// individual tests failed, the orchestration itself did not.
    /// 运行器以非零码退出但至少捕获了一条结果；
    /// 是单个测试失败，而非编排本身失败。
    CompletedWithFailures,
    /// The orchestration failed: spawn error, interruption or a nonzero
    /// exit with zero captured results.
    /// 编排失败：启动错误、中断或非零退出且未捕获任何结果。
    Failed,
}

impl ExecutionStatus {
    /// Terminal states are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed
                | ExecutionStatus::CompletedWithFailures
                | ExecutionStatus::Failed
        )
    }

    /// Gets the status as a localized string for display.
    /// 以本地化字符串形式获取状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            ExecutionStatus::Pending => t!("status.pending", locale = locale).to_string(),
            ExecutionStatus::Running => t!("status.running", locale = locale).to_string(),
            ExecutionStatus::Completed => t!("status.completed", locale = locale).to_string(),
            ExecutionStatus::CompletedWithFailures => {
                t!("status.completed_with_failures", locale = locale).to_string()
            }
            ExecutionStatus::Failed => t!("status.failed", locale = locale).to_string(),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::CompletedWithFailures => "COMPLETED_WITH_FAILURES",
            ExecutionStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// The outcome of one executed test case.
/// 单个已执行测试用例的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestCaseStatus {
    Passed,
    Failed,
    Skipped,
}

/// A per-test outcome record, collected from streamed output and the
/// post-run report files.
/// 单个测试的结果记录，由流式输出和运行后的报告文件收集。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// The test method name as the runner reports it, including any
    /// parameterized invocation suffix.
    /// 运行器报告的测试方法名，包括参数化调用后缀。
    pub test_name: String,
    /// The fully qualified class the test ran in.
    /// 该测试运行所在的完全限定类。
    pub class_name: String,
    pub status: TestCaseStatus,
    /// Elapsed time in seconds, as reported by the runner.
    /// 运行器报告的耗时（秒）。
    pub duration_secs: f64,
    /// The failure message, for failed tests.
    /// 失败消息（针对失败的测试）。
    pub message: Option<String>,
    /// A stack excerpt, for failed tests.
    /// 堆栈摘录（针对失败的测试）。
    pub stack_excerpt: Option<String>,
}

/// What a submitted execution should run.
/// 提交的执行应当运行的范围。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionScope {
    /// Every known service's tests.
    /// 所有已知服务的测试。
    All,
    /// All tests for one service's test class.
    /// 单个服务测试类的所有测试。
    Service { service: String },
    /// An explicit set of test identifiers within one service.
    /// 单个服务内的一组显式测试标识符。
    Tests { service: String, tests: Vec<String> },
}

impl ExecutionScope {
    /// A short label used in persisted run records and console output.
    pub fn run_type(&self) -> &'static str {
        match self {
            ExecutionScope::All => "ALL",
            ExecutionScope::Service { .. } => "SERVICE",
            ExecutionScope::Tests { .. } => "SELECTION",
        }
    }

    /// The service this scope targets, when it targets exactly one.
    pub fn service(&self) -> Option<&str> {
        match self {
            ExecutionScope::All => None,
            ExecutionScope::Service { service } => Some(service),
            ExecutionScope::Tests { service, .. } => Some(service),
        }
    }
}

/// An execution request as submitted by a caller. Either `run_all` is set,
/// or a service with an explicit test list, or a service with a single
/// production method to resolve through the coverage map.
///
/// 调用方提交的执行请求。要么设置 `run_all`，要么给出服务及显式测试列表，
/// 要么给出服务及单个待通过覆盖率映射解析的生产方法。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRequest {
    #[serde(default)]
    pub run_all: bool,
    #[serde(default)]
    pub service: Option<String>,
    /// A production method name to resolve into its matched tests.
    /// 要解析为其匹配测试的生产方法名。
    #[serde(default)]
    pub method: Option<String>,
    /// Explicit test identifiers; parameterized suffixes are tolerated.
    /// 显式测试标识符；允许带参数化后缀。
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub triggered_by_id: Option<String>,
    #[serde(default)]
    pub triggered_by_name: Option<String>,
    /// The tenant on whose behalf the run executes.
    /// 本次运行所代表的租户。
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

/// One asynchronous test-run job. The registry owns the canonical copy;
/// callers only ever see snapshots.
/// 单个异步测试运行任务。注册表持有规范副本；调用方只会看到快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionJob {
    /// Opaque unique token identifying this execution.
    /// 标识此次执行的不透明唯一令牌。
    pub execution_id: Uuid,
    pub scope: ExecutionScope,
    pub status: ExecutionStatus,
    /// How many tests this run is expected to execute, computed at
    /// submission time from the coverage map (exact for explicit lists).
    /// 本次运行预计执行的测试数量，提交时由覆盖率映射计算
    /// （显式列表时为精确值）。
    pub expected_total: usize,
    /// Tests confirmed completed so far by parsed runner output.
    /// 目前已由解析的运行器输出确认完成的测试数。
    pub confirmed_completed: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    /// Stamped exactly once, together with the terminal transition.
    /// 恰好在终止转换时写入一次。
    pub completed_at: Option<DateTime<Utc>>,
    /// Per-test outcomes, deduplicated by test identifier, in the order
    /// they were first observed.
    /// 每个测试的结果，按测试标识符去重，按首次观察到的顺序排列。
    pub results: Vec<TestCaseResult>,
    /// Set only on orchestration-level failure, never for a single test
    /// failing.
    /// 仅在编排级失败时设置，单个测试失败不会设置。
    pub error_message: Option<String>,
}

impl ExecutionJob {
    /// Creates a job in the `Pending` state.
    pub fn new(scope: ExecutionScope, expected_total: usize) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            scope,
            status: ExecutionStatus::Pending,
            expected_total,
            confirmed_completed: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
            error_message: None,
        }
    }

    pub fn has_result(&self, test_name: &str) -> bool {
        self.results.iter().any(|r| r.test_name == test_name)
    }

    /// Appends a result unless one with the same test identifier is already
    /// present. Returns whether the record was added.
    /// 除非已存在相同测试标识符的结果，否则追加该结果。
    /// 返回是否新增了记录。
    pub fn add_result(&mut self, result: TestCaseResult) -> bool {
        if self.has_result(&result.test_name) {
            return false;
        }
        self.results.push(result);
        true
    }

    /// Recomputes every aggregate counter from the result list. Called after
    /// report reconciliation, superseding the streamed estimates.
    /// 根据结果列表重新计算所有聚合计数。
    /// 在报告对账之后调用，取代流式估算值。
    pub fn recompute_counts(&mut self) {
        self.passed = self
            .results
            .iter()
            .filter(|r| r.status == TestCaseStatus::Passed)
            .count();
        self.failed = self
            .results
            .iter()
            .filter(|r| r.status == TestCaseStatus::Failed)
            .count();
        self.skipped = self
            .results
            .iter()
            .filter(|r| r.status == TestCaseStatus::Skipped)
            .count();
        self.confirmed_completed = self.results.len();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One persisted test-run aggregate, emitted when a run completes.
/// 运行完成时产出的一条持久化测试运行聚合记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: Uuid,
    pub service: Option<String>,
    /// `ALL`, `SERVICE` or `SELECTION`.
    pub run_type: String,
    pub triggered_by_id: Option<String>,
    pub triggered_by_name: Option<String>,
    pub client_id: Option<String>,
    pub environment: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub status: ExecutionStatus,
}

/// One persisted per-test outcome row belonging to a `TestRun`.
/// 隶属于某个 `TestRun` 的一条持久化单测结果行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRunResult {
    pub id: Uuid,
    pub run_id: Uuid,
    pub service: Option<String>,
    /// The production method this test was resolved from, when the run was
    /// submitted for a single method.
    /// 当运行是针对单个方法提交时，该测试解析自的生产方法。
    pub production_method: Option<String>,
    pub test_class: String,
    pub test_method: String,
    pub display_name: Option<String>,
    pub status: TestCaseStatus,
    pub duration_secs: f64,
    pub error_message: Option<String>,
    pub stack_excerpt: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// The newest outcome per unique `(client, service, test class, test
/// method)` key, independent of run history. Used for dashboarding.
/// 按唯一键 `(client, service, test class, test method)` 记录的最新结果，
/// 与运行历史无关。用于仪表盘展示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestTestResult {
    pub client_id: String,
    pub service: String,
    pub test_class: String,
    pub test_method: String,
    pub status: TestCaseStatus,
    pub duration_secs: f64,
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LatestTestResult {
    /// The upsert key: exactly these four fields.
    /// upsert 键：恰好这四个字段。
    pub fn key(&self) -> (String, String, String, String) {
        (
            self.client_id.clone(),
            self.service.clone(),
            self.test_class.clone(),
            self.test_method.clone(),
        )
    }
}
