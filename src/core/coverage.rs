//! # Coverage Mapping Module / 覆盖率映射模块
//!
//! This module builds the coverage map: for each service, the injected list
//! of public production methods is paired with the test methods discovered
//! by scanning the service's test class. Method enumeration itself is an
//! external capability (reflection over production code is out of scope);
//! the default implementation reads the configured method lists.
//!
//! 此模块构建覆盖率映射：对每个服务，
//! 将注入的公共生产方法列表与扫描该服务测试类发现的测试方法配对。
//! 方法枚举本身是外部能力（对生产代码的反射不在范围内）；
//! 默认实现读取配置中的方法列表。

use crate::core::config::{RunnerConfig, ServiceConfig};
use crate::core::matcher;
use crate::core::models::{DiscoveredTestMethod, MethodCoverageEntry};
use crate::core::scanner;
use crate::infra::fs as infra_fs;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Supplies, per service, the list of public production method names to
/// report on.
/// 按服务提供需要报告的公共生产方法名列表。
pub trait MethodEnumerator: Send + Sync {
    fn list_public_methods(&self, service: &str) -> Vec<String>;
}

/// The default enumerator: method lists come from `[[services]]` entries in
/// the runner configuration.
/// 默认枚举器：方法列表来自运行器配置中的 `[[services]]` 条目。
#[derive(Debug, Clone)]
pub struct ConfigMethodEnumerator {
    services: Vec<ServiceConfig>,
}

impl ConfigMethodEnumerator {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            services: config.services.clone(),
        }
    }
}

impl MethodEnumerator for ConfigMethodEnumerator {
    fn list_public_methods(&self, service: &str) -> Vec<String> {
        self.services
            .iter()
            .find(|s| s.name == service)
            .map(|s| s.methods.clone())
            .unwrap_or_default()
    }
}

/// Builds coverage entries and expected-total sums over the configured
/// services.
/// 针对配置的服务构建覆盖率条目和预期总数。
pub struct CoverageService {
    config: RunnerConfig,
    project_dir: PathBuf,
    enumerator: Arc<dyn MethodEnumerator>,
}

impl CoverageService {
    pub fn new(config: RunnerConfig, project_dir: PathBuf) -> Self {
        let enumerator = Arc::new(ConfigMethodEnumerator::new(&config));
        Self {
            config,
            project_dir,
            enumerator,
        }
    }

    /// Replaces the method enumeration capability, e.g. with one backed by
    /// a build-time index instead of the static config.
    pub fn with_enumerator(mut self, enumerator: Arc<dyn MethodEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Scans the service's test class source. A missing source file yields
    /// an empty scan — coverage silently undercounts rather than failing,
    /// consistent with the scanner's best-effort contract.
    /// 扫描服务测试类的源码。源文件缺失时返回空扫描结果 ——
    /// 覆盖率宁可少算也不失败，与扫描器的尽力而为契约一致。
    pub fn scan_service(&self, service: &ServiceConfig) -> Result<Vec<DiscoveredTestMethod>> {
        let class_name = service.test_class_name();
        let source_path = match infra_fs::locate_test_source(
            &self.project_dir,
            &self.config,
            &class_name,
        ) {
            Some(path) => path,
            None => return Ok(Vec::new()),
        };
        let source_text = fs::read_to_string(&source_path)
            .with_context(|| format!("Failed to read test source: {}", source_path.display()))?;
        Ok(scanner::scan(&source_text, &class_name))
    }

    /// The coverage map for one service: every enumerated production method
    /// paired with its matched tests, in enumeration order.
    /// 单个服务的覆盖率映射：每个枚举出的生产方法与其匹配的测试配对，
    /// 按枚举顺序排列。
    pub fn coverage_for_service(
        &self,
        service: &ServiceConfig,
    ) -> Result<Vec<MethodCoverageEntry>> {
        let discovered = self.scan_service(service)?;
        let methods = self.enumerator.list_public_methods(&service.name);

        Ok(methods
            .iter()
            .map(|method| MethodCoverageEntry {
                service_name: service.name.clone(),
                production_method_name: method.clone(),
                matched_tests: matcher::matching_tests(method, &discovered),
            })
            .collect())
    }

    /// The coverage map across every configured service.
    pub fn coverage_all(&self) -> Result<Vec<MethodCoverageEntry>> {
        let mut entries = Vec::new();
        for service in &self.config.services {
            entries.extend(self.coverage_for_service(service)?);
        }
        Ok(entries)
    }

    /// Sum of matched test counts over a set of coverage entries — the
    /// expected-total heuristic for class-scoped and run-all executions.
    /// 一组覆盖率条目的匹配测试数之和 ——
    /// 类范围和全量执行的预期总数启发式。
    pub fn expected_total(entries: &[MethodCoverageEntry]) -> usize {
        entries.iter().map(|e| e.test_count()).sum()
    }

    /// Resolves the directory the coverage scan is anchored at.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }
}
