//! # Coverage Command Module / 覆盖率命令模块
//!
//! This module implements the `coverage` command, which prints the mapping
//! from production methods to the tests that exercise them, per service.
//!
//! 此模块实现 `coverage` 命令，按服务打印生产方法到覆盖它们的测试的映射。

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::{
    core::{config, coverage::CoverageService},
    infra::t,
    reporting::console::print_coverage,
};

/// Executes the coverage command.
///
/// # Arguments
/// * `config` - Path to the runner configuration file
/// * `project_dir` - Directory the source lookup is anchored at
/// * `service` - Optional single service to report on
/// * `json` - Emit the coverage map as JSON instead of a table
pub async fn execute(
    config: PathBuf,
    project_dir: PathBuf,
    service: Option<String>,
    json: bool,
) -> Result<()> {
    let config_path = fs::canonicalize(&config)
        .with_context(|| t!("config_read_failed_path", path = config.display()))?;
    let runner_config = config::load_runner_config(&config_path)
        .with_context(|| t!("config_parse_failed"))?;
    let locale = runner_config.language.clone();
    rust_i18n::set_locale(&locale);

    let project_dir = fs::canonicalize(&project_dir)
        .with_context(|| t!("project_dir_not_found", path = project_dir.display()))?;

    let coverage = CoverageService::new(runner_config.clone(), project_dir);

    let entries = match service {
        Some(name) => {
            let service_config = runner_config
                .service(&name)
                .with_context(|| t!("unknown_service", locale = &locale, name = &name))?;
            coverage.coverage_for_service(service_config)?
        }
        None => coverage.coverage_all()?,
    };

    if entries.is_empty() {
        println!("{}", t!("coverage.empty", locale = &locale));
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_coverage(&entries, &locale);
    }
    Ok(())
}
