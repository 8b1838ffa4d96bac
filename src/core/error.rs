//! # Error Types Module / 错误类型模块
//!
//! The synchronous error taxonomy of the submit/poll surface. Failures
//! inside a running job are never surfaced through these types — they are
//! recorded on the job itself (`FAILED` status plus `error_message`),
//! because the submitter has already returned by the time they happen.
//!
//! 提交/轮询接口的同步错误分类。运行中任务内部的失败不会通过这些类型
//! 暴露 —— 它们被记录在任务自身上（`FAILED` 状态加 `error_message`），
//! 因为失败发生时提交方早已返回。

use thiserror::Error;

/// Errors surfaced synchronously at the request boundary.
/// 在请求边界同步暴露的错误。
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is missing or unresolvable: neither "run all" nor an
    /// explicit selection was given, or a named method resolves to zero
    /// tests. Reported before any subprocess is started.
    /// 请求缺失或无法解析：既没有"运行全部"也没有显式选择，
    /// 或按方法名解析不到任何测试。在启动任何子进程之前报告。
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The polled execution id was never registered.
    /// 轮询的执行 ID 从未注册过。
    #[error("execution not found: {0}")]
    NotFound(String),

    /// The coverage map could not be computed at submission time, e.g. an
    /// unreadable test source file. Not a caller error, but still surfaced
    /// synchronously since no job exists yet.
    /// 提交时无法计算覆盖率映射，例如测试源文件不可读。
    /// 并非调用方错误，但由于任务尚不存在，仍会同步暴露。
    #[error("internal error: {0}")]
    Internal(String),
}
