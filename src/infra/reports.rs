//! # Report Parsing Module / 报告解析模块
//!
//! This module extracts per-test records from the runner's XML report files
//! (one `TEST-<class>.xml` per executed test class). The report subset we
//! consume is fixed and flat, so this is a lightweight pattern extractor
//! over the text rather than a general XML parser; unrecognized content is
//! skipped.
//!
//! 此模块从运行器的 XML 报告文件（每个已执行测试类一个
//! `TEST-<class>.xml`）中提取单测记录。
//! 我们消费的报告子集是固定且扁平的，
//! 因此这是对文本的轻量模式提取器，而不是通用 XML 解析器；
//! 无法识别的内容会被跳过。

use crate::core::models::{TestCaseResult, TestCaseStatus};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Stack excerpts are capped so a deep framework trace does not bloat the
/// persisted row.
/// 堆栈摘录有长度上限，避免深层框架堆栈撑大持久化行。
const STACK_EXCERPT_MAX: usize = 2000;

/// Lists the report files in a report directory, sorted by file name for
/// deterministic processing order.
/// 列出报告目录中的报告文件，按文件名排序以保证处理顺序确定。
pub fn collect_report_files(report_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(report_dir)
        .with_context(|| format!("Failed to read report directory: {}", report_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("TEST-") && name.ends_with(".xml") {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Reads and parses one report file.
pub fn parse_report_file(path: &Path) -> Result<Vec<TestCaseResult>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;
    Ok(parse_report(&content))
}

/// Extracts every `testcase` record from report text: name, class, elapsed
/// time, and the optional nested failure/error/skipped marker with its
/// message attribute and inline stack text.
///
/// 从报告文本中提取每条 `testcase` 记录：名称、类、耗时，
/// 以及可选的嵌套 failure/error/skipped 标记及其消息属性和内联堆栈文本。
pub fn parse_report(content: &str) -> Vec<TestCaseResult> {
    let mut results = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = content[search_from..].find("<testcase") {
        let tag_start = search_from + rel;
        let tag_end = match content[tag_start..].find('>') {
            Some(idx) => tag_start + idx,
            // Truncated file; stop here with what we have.
            None => break,
        };
        let tag = &content[tag_start..tag_end + 1];

        let name = attribute(tag, "name").unwrap_or_default();
        let class_name = attribute(tag, "classname").unwrap_or_default();
        let duration_secs = attribute(tag, "time")
            .map(|t| t.replace(',', ""))
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(0.0);

        let self_closing = tag.trim_end_matches('>').ends_with('/');
        let (status, message, stack_excerpt, next_from) = if self_closing {
            (TestCaseStatus::Passed, None, None, tag_end + 1)
        } else {
            let body_start = tag_end + 1;
            let body_end = content[body_start..]
                .find("</testcase>")
                .map(|idx| body_start + idx)
                .unwrap_or(content.len());
            let body = &content[body_start..body_end];
            let (status, message, stack) = classify_body(body);
            (status, message, stack, body_end)
        };

        if !name.is_empty() {
            results.push(TestCaseResult {
                test_name: name,
                class_name,
                status,
                duration_secs,
                message,
                stack_excerpt,
            });
        }
        search_from = next_from;
    }

    results
}

/// Determines the outcome from a `testcase` element body: a nested
/// `failure` or `error` marker means FAILED, `skipped` means SKIPPED, and
/// an unmarked body means the test passed.
/// 根据 `testcase` 元素主体判定结果：嵌套的 `failure` 或 `error`
/// 标记表示失败，`skipped` 表示跳过，无标记的主体表示测试通过。
fn classify_body(body: &str) -> (TestCaseStatus, Option<String>, Option<String>) {
    for marker in ["failure", "error"] {
        if let Some(tag_start) = find_element(body, marker) {
            let tag_end = body[tag_start..]
                .find('>')
                .map(|idx| tag_start + idx)
                .unwrap_or(body.len().saturating_sub(1));
            let tag = &body[tag_start..=tag_end.min(body.len() - 1)];
            let message = attribute(tag, "message");

            let close = format!("</{}>", marker);
            let stack = if tag.trim_end_matches('>').ends_with('/') {
                None
            } else {
                body[tag_end + 1..]
                    .find(&close)
                    .map(|idx| excerpt(&body[tag_end + 1..tag_end + 1 + idx]))
                    .filter(|s| !s.is_empty())
            };
            return (TestCaseStatus::Failed, message, stack);
        }
    }

    if let Some(tag_start) = find_element(body, "skipped") {
        let tag_end = body[tag_start..]
            .find('>')
            .map(|idx| tag_start + idx)
            .unwrap_or(body.len().saturating_sub(1));
        let tag = &body[tag_start..=tag_end.min(body.len() - 1)];
        return (TestCaseStatus::Skipped, attribute(tag, "message"), None);
    }

    (TestCaseStatus::Passed, None, None)
}

/// Finds the start of `<name ` or `<name>` or `<name/>` in the body.
fn find_element(body: &str, name: &str) -> Option<usize> {
    let mut search_from = 0;
    let needle = format!("<{}", name);
    while let Some(rel) = body[search_from..].find(&needle) {
        let start = search_from + rel;
        let after = body[start + needle.len()..].chars().next();
        match after {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return Some(start),
            _ => search_from = start + needle.len(),
        }
    }
    None
}

/// Extracts an attribute value from an element's opening tag, unescaping
/// the XML entities the runner writes.
/// 从元素的开始标签中提取属性值，并反转义运行器写入的 XML 实体。
fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{}=\"", name);
    let mut search_from = 0;
    while let Some(rel) = tag[search_from..].find(&needle) {
        let start = search_from + rel;
        // Reject matches inside a longer attribute name, e.g. `name` in
        // `classname`.
        let boundary = start == 0
            || tag[..start]
                .chars()
                .next_back()
                .map(|c| !c.is_alphanumeric() && c != '_')
                .unwrap_or(true);
        let value_start = start + needle.len();
        if boundary {
            let value_end = tag[value_start..].find('"')? + value_start;
            return Some(unescape(&tag[value_start..value_end]));
        }
        search_from = value_start;
    }
    None
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#10;", "\n")
        .replace("&amp;", "&")
}

fn excerpt(stack: &str) -> String {
    let trimmed = unescape(stack.trim());
    if trimmed.len() > STACK_EXCERPT_MAX {
        let mut cut = STACK_EXCERPT_MAX;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        trimmed[..cut].to_string()
    } else {
        trimmed
    }
}
