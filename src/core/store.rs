//! # Result Store Module / 结果存储模块
//!
//! The persistence boundary for completed runs. The orchestrator emits one
//! `TestRun` aggregate, one `TestRunResult` row per executed test, and
//! upserts one `LatestTestResult` per distinct
//! `(client, service, test class, test method)` key. The store is expected
//! to provide its own transactional guarantees; the orchestrator treats the
//! persistence step as at-least-once.
//!
//! 已完成运行的持久化边界。编排器产出一条 `TestRun` 聚合记录、
//! 每个已执行测试一条 `TestRunResult` 行，
//! 并按不同的 `(client, service, test class, test method)` 键
//! upsert 一条 `LatestTestResult`。存储应自行提供事务保证；
//! 编排器将持久化步骤视为至少一次。

use crate::core::models::{LatestTestResult, TestRun, TestRunResult};
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// The persistence boundary consumed by the orchestrator.
/// 编排器消费的持久化边界。
pub trait ResultStore: Send + Sync {
    fn record_run(&self, run: &TestRun) -> Result<()>;

    fn record_results(&self, results: &[TestRunResult]) -> Result<()>;

    /// Updates the record matching the latest-result key in place, or
    /// inserts it if absent.
    /// 原地更新与最新结果键匹配的记录，不存在则插入。
    fn upsert_latest(&self, latest: &LatestTestResult) -> Result<()>;
}

/// In-memory store used by the CLI and by tests. Run history lives in
/// vectors; latest results in a keyed concurrent map so the upsert is a
/// single operation.
/// CLI 和测试使用的内存存储。运行历史保存在向量中；
/// 最新结果保存在按键索引的并发映射中，使 upsert 成为单一操作。
#[derive(Debug, Default)]
pub struct MemoryStore {
    runs: Mutex<Vec<TestRun>>,
    results: Mutex<Vec<TestRunResult>>,
    latest: DashMap<(String, String, String, String), LatestTestResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<TestRun> {
        self.runs.lock().expect("store lock poisoned").clone()
    }

    pub fn results_for_run(&self, run_id: Uuid) -> Vec<TestRunResult> {
        self.results
            .lock()
            .expect("store lock poisoned")
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect()
    }

    pub fn latest_results(&self) -> Vec<LatestTestResult> {
        self.latest.iter().map(|e| e.value().clone()).collect()
    }

    pub fn latest_for(
        &self,
        client_id: &str,
        service: &str,
        test_class: &str,
        test_method: &str,
    ) -> Option<LatestTestResult> {
        self.latest
            .get(&(
                client_id.to_string(),
                service.to_string(),
                test_class.to_string(),
                test_method.to_string(),
            ))
            .map(|e| e.value().clone())
    }
}

impl ResultStore for MemoryStore {
    fn record_run(&self, run: &TestRun) -> Result<()> {
        self.runs.lock().expect("store lock poisoned").push(run.clone());
        Ok(())
    }

    fn record_results(&self, results: &[TestRunResult]) -> Result<()> {
        self.results
            .lock()
            .expect("store lock poisoned")
            .extend_from_slice(results);
        Ok(())
    }

    fn upsert_latest(&self, latest: &LatestTestResult) -> Result<()> {
        self.latest.insert(latest.key(), latest.clone());
        Ok(())
    }
}
