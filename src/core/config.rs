//! # Configuration Module / 配置模块
//!
//! This module defines the runner configuration, loaded from a TOML file
//! (`CoverageRunner.toml` by default). The configuration names the project
//! layout, the external runner invocation, the progress heuristic constants
//! and the per-service production method lists to report coverage on.
//!
//! 此模块定义运行器配置，从 TOML 文件（默认 `CoverageRunner.toml`）加载。
//! 配置描述项目布局、外部运行器调用方式、进度启发式常量，
//! 以及按服务列出的需要报告覆盖率的生产方法。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Project layout settings used when locating the build descriptor and
/// test source files.
/// 定位构建描述文件和测试源文件时使用的项目布局设置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// The build descriptor whose presence marks a project root.
    /// 标记项目根目录的构建描述文件。
    #[serde(default = "default_build_descriptor")]
    pub build_descriptor: String,
    /// A known project subdirectory probed when the working directory is
    /// not itself the project root (e.g. a repo with a `backend/` module).
    /// 当工作目录本身不是项目根目录时探测的已知子目录
    /// （例如带有 `backend/` 模块的仓库）。
    #[serde(default = "default_subdirectory")]
    pub subdirectory: String,
    /// The Java package the test classes live in, dotted form.
    /// 测试类所在的 Java 包，点分形式。
    #[serde(default)]
    pub package: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            build_descriptor: default_build_descriptor(),
            subdirectory: default_subdirectory(),
            package: None,
        }
    }
}

/// External runner invocation settings.
/// 外部运行器调用设置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSection {
    /// An optional custom command replacing the default Maven invocation.
    /// The command is shell-expanded and split; the `-Dtest=...` selection
    /// argument is still appended for scoped runs.
    /// 可选的自定义命令，替换默认的 Maven 调用。
    /// 该命令会进行 shell 展开并拆分；限定范围的运行仍会附加
    /// `-Dtest=...` 选择参数。
    #[serde(default)]
    pub command: Option<String>,
    /// Where the runner writes its per-class XML reports, relative to the
    /// project root.
    /// 运行器写入按类划分的 XML 报告的位置，相对于项目根目录。
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
    /// Test-source roots tried in order: the primary layout first, then the
    /// legacy layout.
    /// 按顺序尝试的测试源根目录：先主布局，后遗留布局。
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            command: None,
            report_dir: default_report_dir(),
            source_roots: default_source_roots(),
        }
    }
}

/// Constants for the time-based progress smoothing heuristic. These are a
/// guessed calibration, not derived from historical run data, which is why
/// they are configurable rather than hard-coded.
/// 基于时间的进度平滑启发式常量。它们是猜测的校准值，
/// 并非来自历史运行数据，因此做成可配置而不是硬编码。
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ProgressConfig {
    /// Fixed startup overhead assumed for any run, in milliseconds.
    /// 假定任何运行都有的固定启动开销（毫秒）。
    #[serde(default = "default_base_overhead_ms")]
    pub base_overhead_ms: u64,
    /// Assumed cost per test, in milliseconds.
    /// 假定的每个测试的开销（毫秒）。
    #[serde(default = "default_per_test_ms")]
    pub per_test_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            base_overhead_ms: default_base_overhead_ms(),
            per_test_ms: default_per_test_ms(),
        }
    }
}

/// One service to report coverage on: its name and the injected list of
/// public production method names. Reflection over production code is out
/// of scope; the list arrives resolved.
/// 要报告覆盖率的单个服务：其名称和注入的公共生产方法名列表。
/// 对生产代码的反射不在范围内；列表以已解析的形式提供。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    /// The test class for this service. Defaults to `<name>Test`.
    /// 该服务的测试类。默认为 `<name>Test`。
    #[serde(default)]
    pub test_class: Option<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl ServiceConfig {
    /// The outer test class name for this service.
    pub fn test_class_name(&self) -> String {
        self.test_class
            .clone()
            .unwrap_or_else(|| format!("{}Test", self.name))
    }
}

/// The entire runner configuration, loaded from a TOML file.
/// 从 TOML 文件加载的完整运行器配置。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// The language for the runner's output messages (e.g. "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub runner: RunnerSection,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            project: ProjectConfig::default(),
            runner: RunnerSection::default(),
            progress: ProgressConfig::default(),
            services: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Looks up a configured service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Loads and parses a runner configuration file.
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// The parsed `RunnerConfig`, or an error describing what failed
pub fn load_runner_config(path: &Path) -> Result<RunnerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: RunnerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

fn default_language() -> String {
    "en".to_string()
}

fn default_build_descriptor() -> String {
    "pom.xml".to_string()
}

fn default_subdirectory() -> String {
    "backend".to_string()
}

fn default_report_dir() -> String {
    "target/surefire-reports".to_string()
}

fn default_source_roots() -> Vec<String> {
    vec!["src/test/java".to_string(), "test/java".to_string()]
}

fn default_base_overhead_ms() -> u64 {
    crate::core::progress::BASE_OVERHEAD_MS
}

fn default_per_test_ms() -> u64 {
    crate::core::progress::PER_TEST_MS
}
