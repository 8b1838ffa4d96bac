//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides file system lookup for the runner: locating the
//! project root by its build descriptor and locating test source files
//! across the candidate layouts.
//!
//! 此模块为运行器提供文件系统查找：
//! 通过构建描述文件定位项目根目录，并在候选布局中定位测试源文件。

use crate::core::config::RunnerConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Locates the project root near `start_dir`. Candidates are tried in
/// order — the directory itself, the configured known subdirectory, then
/// the parent directory — and the first one containing the build
/// descriptor wins.
///
/// 在 `start_dir` 附近定位项目根目录。按顺序尝试候选目录 ——
/// 目录本身、配置的已知子目录、父目录 ——
/// 第一个包含构建描述文件的目录胜出。
pub fn locate_project_root(start_dir: &Path, config: &RunnerConfig) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = vec![
        start_dir.to_path_buf(),
        start_dir.join(&config.project.subdirectory),
    ];
    if let Some(parent) = start_dir.parent() {
        candidates.push(parent.to_path_buf());
    }

    for candidate in &candidates {
        if candidate.join(&config.project.build_descriptor).is_file() {
            return Ok(candidate.clone());
        }
    }

    anyhow::bail!(
        "No project root containing '{}' found near {}",
        config.project.build_descriptor,
        start_dir.display()
    )
}

/// Locates the source file of a test class. For each base directory (the
/// starting directory, the configured subdirectory, the parent) and each
/// configured source root (primary first, then legacy), the candidate
/// `base/root/<package>/<Class>.java` is tried, followed by a variant with
/// lower-cased directory segments to tolerate case-mismatched filesystems.
/// The first existing file wins.
///
/// 定位测试类的源文件。对每个基目录（起始目录、配置的子目录、父目录）
/// 和每个配置的源根目录（先主布局后遗留布局），
/// 依次尝试候选路径 `base/root/<package>/<Class>.java`，
/// 再尝试目录段小写的变体以容忍大小写不匹配的文件系统。
/// 第一个存在的文件胜出。
pub fn locate_test_source(
    start_dir: &Path,
    config: &RunnerConfig,
    class_name: &str,
) -> Option<PathBuf> {
    let package_path = config
        .project
        .package
        .as_deref()
        .map(|p| p.replace('.', "/"))
        .unwrap_or_default();
    let file_name = format!("{}.java", class_name);

    let mut bases: Vec<PathBuf> = vec![
        start_dir.to_path_buf(),
        start_dir.join(&config.project.subdirectory),
    ];
    if let Some(parent) = start_dir.parent() {
        bases.push(parent.to_path_buf());
    }

    for base in &bases {
        for root in &config.runner.source_roots {
            let relative = if package_path.is_empty() {
                PathBuf::from(root).join(&file_name)
            } else {
                PathBuf::from(root).join(&package_path).join(&file_name)
            };

            let candidate = base.join(&relative);
            if candidate.is_file() {
                return Some(candidate);
            }

            let normalized = base.join(lowercase_dir_segments(&relative));
            if normalized.is_file() {
                return Some(normalized);
            }
        }
    }

    None
}

/// Lower-cases every directory segment of a relative path, leaving the
/// file name itself untouched.
/// 将相对路径的每个目录段小写化，文件名本身保持不变。
fn lowercase_dir_segments(relative: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    let components: Vec<_> = relative.components().collect();
    for (i, component) in components.iter().enumerate() {
        let segment = component.as_os_str().to_string_lossy();
        if i + 1 == components.len() {
            result.push(segment.as_ref());
        } else {
            result.push(segment.to_lowercase());
        }
    }
    result
}

/// Gets the absolute path from a potentially relative path.
///
/// # Arguments
/// * `path` - Path to canonicalize
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}
