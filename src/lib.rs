//! # Coverage Runner Library / Coverage Runner 库
//!
//! This library provides the core functionality for the Coverage Runner tool,
//! a coverage-mapping and test-execution engine for JUnit/Maven projects.
//! It discovers which production methods are exercised by which tests through
//! static test-source scanning, and orchestrates asynchronous Maven test runs
//! with live progress tracking.
//!
//! 此库为 Coverage Runner 工具提供核心功能，
//! 这是一个面向 JUnit/Maven 项目的覆盖率映射与测试执行引擎。
//! 它通过静态扫描测试源码来发现生产方法与测试的对应关系，
//! 并编排带有实时进度跟踪的异步 Maven 测试运行。
//!
//! ## Modules / 模块
//!
//! - `core` - Coverage mapping, job models and the test execution engine
//! - `infra` - Infrastructure services like subprocess handling and file lookup
//! - `reporting` - Console rendering of coverage maps and run results
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 覆盖率映射、任务模型和测试执行引擎
//! - `infra` - 基础设施服务，如子进程处理和文件查找
//! - `reporting` - 覆盖率映射与运行结果的控制台渲染
//! - `cli` - 命令行接口和命令

pub mod core;
pub mod infra;
pub mod reporting;
pub mod cli;

// Re-export commonly used items
pub use crate::core::models;
pub use crate::core::orchestrator;
pub use crate::core::registry;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    // Detect system locale and set it for i18n.
    // Fallback to "en" if detection fails.
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    // Try to match the full locale first (e.g., "zh-CN")
    // Then try to match the language part only (e.g., "en" from "en-US")
    // Finally, fall back to "en"
    let lang = if available_locales.contains(&locale.as_str()) {
        &locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
