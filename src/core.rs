//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Coverage Runner,
//! including data models, configuration, test-source scanning, coverage
//! mapping and the asynchronous test execution engine.
//!
//! 此模块包含 Coverage Runner 的核心功能，
//! 包括数据模型、配置、测试源码扫描、覆盖率映射和异步测试执行引擎。

pub mod config;
pub mod coverage;
pub mod error;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod scanner;
pub mod selector;
pub mod store;

// Re-exports
pub use error::ApiError;
pub use models::{ExecutionJob, ExecutionStatus};
pub use registry::JobRegistry;
