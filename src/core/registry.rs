//! # Job Registry Module / 任务注册表模块
//!
//! This module owns the canonical `ExecutionJob` objects for the lifetime
//! of the process, plus the running subprocess handles kept in a separate
//! map so cancellation never contends with job bookkeeping. It is an
//! explicit service object constructed once and injected into the
//! orchestrator, not ambient global state.
//!
//! 此模块在进程生命周期内持有规范的 `ExecutionJob` 对象，
//! 以及保存在独立映射中的运行中子进程句柄，
//! 使取消操作永远不会与任务记账争用。
//! 它是一个构造一次并注入编排器的显式服务对象，而非全局环境状态。

use crate::core::error::ApiError;
use crate::core::models::{ExecutionJob, ExecutionStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A shared handle to a running subprocess. The worker only locks it
/// briefly (`try_wait` polling), so cancellation can always get in to kill.
/// 运行中子进程的共享句柄。工作任务只会短暂锁定它（轮询 `try_wait`），
/// 因此取消操作总能获得锁来终止进程。
pub type ProcessHandle = Arc<Mutex<Child>>;

/// Process-wide registry mapping execution ids to jobs and to running
/// subprocess handles.
///
/// Concurrency discipline: exactly one background worker mutates a given
/// job's counters and result list; the registry only serializes map access.
/// Callers receive deep snapshots, never live references.
///
/// 进程级注册表，将执行 ID 映射到任务和运行中的子进程句柄。
///
/// 并发纪律：每个任务的计数器和结果列表只由其唯一的后台工作任务修改；
/// 注册表仅串行化映射访问。调用方得到的是深拷贝快照，绝不是活引用。
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: DashMap<Uuid, ExecutionJob>,
    processes: DashMap<Uuid, ProcessHandle>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            processes: DashMap::new(),
        }
    }

    /// Registers a freshly constructed job and returns its execution id.
    /// 注册一个新构造的任务并返回其执行 ID。
    pub fn create(&self, job: ExecutionJob) -> Uuid {
        let id = job.execution_id;
        self.jobs.insert(id, job);
        id
    }

    /// Returns a deep snapshot of the job, or `NotFound` for an unknown id.
    /// 返回任务的深拷贝快照；未知 ID 返回 `NotFound`。
    pub fn snapshot(&self, execution_id: Uuid) -> Result<ExecutionJob, ApiError> {
        self.jobs
            .get(&execution_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ApiError::NotFound(execution_id.to_string()))
    }

    /// Read-modify-write on the owned job object. Returns whether the job
    /// exists.
    /// 对持有的任务对象执行读-改-写。返回该任务是否存在。
    pub fn update<F>(&self, execution_id: Uuid, mutator: F) -> bool
    where
        F: FnOnce(&mut ExecutionJob),
    {
        match self.jobs.get_mut(&execution_id) {
            Some(mut entry) => {
                mutator(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Attaches the handle of the job's running subprocess.
    pub fn attach_process(&self, execution_id: Uuid, handle: ProcessHandle) {
        self.processes.insert(execution_id, handle);
    }

    /// Drops the subprocess handle once the process has been reaped.
    pub fn detach_process(&self, execution_id: Uuid) {
        self.processes.remove(&execution_id);
    }

    /// Cancels a running execution: the job transitions to `FAILED` with a
    /// "cancelled" message and the subprocess is killed, which unblocks the
    /// worker's output reader. Terminal jobs are left untouched.
    ///
    /// 取消一个运行中的执行：任务转换为 `FAILED` 并带有"已取消"消息，
    /// 随后终止子进程，从而解除工作任务输出读取的阻塞。
    /// 已终止的任务不受影响。
    pub async fn cancel(&self, execution_id: Uuid) -> Result<(), ApiError> {
        let known = self.update(execution_id, |job| {
            if !job.is_terminal() {
                job.status = ExecutionStatus::Failed;
                job.error_message = Some("cancelled by request".to_string());
                job.completed_at = Some(Utc::now());
            }
        });
        if !known {
            return Err(ApiError::NotFound(execution_id.to_string()));
        }

        if let Some((_, handle)) = self.processes.remove(&execution_id) {
            let mut child = handle.lock().await;
            // Best effort; the process may already have exited.
            let _ = child.start_kill();
        }
        Ok(())
    }

    /// Number of registered jobs, mostly for diagnostics.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
