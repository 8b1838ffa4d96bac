//! # Reporting Module / 报告模块
//!
//! This module handles the console rendering of coverage maps and test run
//! results. It provides colorful, formatted output with internationalization
//! support.
//!
//! 此模块处理覆盖率映射和测试运行结果的控制台渲染。
//! 它提供彩色格式化输出，支持国际化。

pub mod console;

// Re-export common reporting functions
pub use console::{print_coverage, print_failure_details, print_run_summary};
