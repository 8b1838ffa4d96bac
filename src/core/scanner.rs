//! # Test Source Scanner Module / 测试源码扫描模块
//!
//! This module statically discovers test methods in JUnit test source files.
//! It is a deliberately approximate, line-based scanner — an explicit state
//! machine over brace depth, open class scopes and pending annotations —
//! not a full Java grammar. Methods that never resolve (e.g. EOF inside a
//! block) are simply not emitted; coverage undercounts rather than erroring.
//!
//! 此模块静态发现 JUnit 测试源文件中的测试方法。
//! 它是一个刻意近似的、基于行的扫描器 —— 针对花括号深度、
//! 打开的类作用域和待处理注解的显式状态机，而不是完整的 Java 语法解析。
//! 无法解析的方法（例如块内遇到 EOF）不会被输出；
//! 覆盖率宁可少算也不报错。

use crate::core::models::DiscoveredTestMethod;
use once_cell::sync::Lazy;
use regex::Regex;

static CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid class pattern"));

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:public|protected|private|static|final|synchronized)\s+)*void\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(")
        .expect("valid method pattern")
});

static DISPLAY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@DisplayName\s*\(\s*"([^"]*)""#).expect("valid display pattern"));

/// One open class scope on the scanner's stack.
/// 扫描器栈上的一个打开的类作用域。
#[derive(Debug, Clone)]
struct ScopeFrame {
    name: String,
    /// The brace depth at which this scope's body opened.
    /// 此作用域主体打开时的花括号深度。
    open_depth: i32,
}

/// A class declaration seen but whose body brace has not been consumed yet.
/// 已看到但其主体花括号尚未消费的类声明。
#[derive(Debug, Clone)]
struct PendingClass {
    name: String,
    /// The depth at the declaration line; the body commits at `decl_depth + 1`.
    /// 声明行处的深度；主体在 `decl_depth + 1` 处提交。
    decl_depth: i32,
}

/// Scans a test source file's text and returns the discovered test methods
/// in source order.
///
/// The scanner tracks nested test-grouping classes so each method carries
/// its declaring scope (`Outer` or `Outer$Nested`), expands parameterized
/// tests into one entry per literal value, and attaches display names.
/// Annotations may appear in any order relative to each other; all pending
/// annotation state is consumed and reset exactly once per emitted method.
///
/// 扫描测试源文件文本，按源码顺序返回发现的测试方法。
///
/// 扫描器跟踪嵌套的测试分组类，使每个方法携带其声明作用域
/// （`Outer` 或 `Outer$Nested`），将参数化测试按字面值展开为多个条目，
/// 并附加显示名称。注解之间的出现顺序不限；
/// 每输出一个方法，所有待处理注解状态恰好被消费并重置一次。
///
/// # Arguments
/// * `source_text` - The full text of the test source file
/// * `outer_class_name` - The outer test class the file declares
pub fn scan(source_text: &str, outer_class_name: &str) -> Vec<DiscoveredTestMethod> {
    let mut discovered = Vec::new();

    let mut depth: i32 = 0;
    let mut scope_stack: Vec<ScopeFrame> = Vec::new();
    let mut pending_class: Option<PendingClass> = None;
    let mut pending_display: Option<String> = None;
    let mut in_test_block = false;
    let mut parameterized = false;
    let mut value_count: usize = 0;
    // Buffer for a values-source annotation spanning multiple lines.
    // 跨多行的值来源注解的缓冲区。
    let mut values_buffer: Option<String> = None;

    for line in source_text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") {
            continue;
        }

        // A values-source annotation already being collected takes the whole
        // line until its closing brace arrives.
        if let Some(mut buffer) = values_buffer.take() {
            buffer.push(' ');
            buffer.push_str(trimmed);
            if buffer.contains('}') {
                value_count = count_value_literals(&buffer);
            } else {
                values_buffer = Some(buffer);
            }
            continue;
        }

        if let Some(start) = find_values_annotation(trimmed) {
            let fragment = &trimmed[start..];
            if fragment.contains('}') {
                value_count = count_value_literals(fragment);
            } else if fragment.contains('{') {
                values_buffer = Some(fragment.to_string());
            } else {
                // Single-value form without braces, e.g. `@ValueSource(strings = "x")`.
                value_count = 1;
            }
        }

        if let Some(caps) = DISPLAY_NAME_RE.captures(trimmed) {
            pending_display = Some(caps[1].to_string());
        }

        if has_annotation(trimmed, "ParameterizedTest") {
            in_test_block = true;
            parameterized = true;
        }
        if has_annotation(trimmed, "Test") {
            in_test_block = true;
        }

        if let Some(caps) = CLASS_RE.captures(trimmed) {
            pending_class = Some(PendingClass {
                name: caps[1].to_string(),
                decl_depth: depth,
            });
        }

        if in_test_block {
            if let Some(caps) = METHOD_RE.captures(trimmed) {
                let base_name = caps[1].to_string();
                let params_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
                let param_types = extract_param_types(&trimmed[params_start..]);
                let scope = declaring_scope(&scope_stack, outer_class_name);

                if parameterized && value_count > 0 {
                    // Surefire names each invocation `base(Types)[i]`, 1-based.
                    for i in 1..=value_count {
                        discovered.push(DiscoveredTestMethod {
                            method_name: format!("{}({})[{}]", base_name, param_types, i),
                            display_name: pending_display
                                .as_ref()
                                .map(|d| format!("{} [{}]", d, i)),
                            declaring_scope: scope.clone(),
                        });
                    }
                } else {
                    discovered.push(DiscoveredTestMethod {
                        method_name: base_name,
                        display_name: pending_display.clone(),
                        declaring_scope: scope,
                    });
                }

                // All pending annotation state is consumed by the emitted
                // method; nothing may leak into the next one.
                pending_display = None;
                in_test_block = false;
                parameterized = false;
                value_count = 0;
            }
        }

        // Brace traversal last: the declaration line's own `{` is what
        // commits a pending class at `decl_depth + 1`.
        let mut in_string = false;
        let mut prev_escape = false;
        for c in trimmed.chars() {
            if in_string {
                if prev_escape {
                    prev_escape = false;
                } else if c == '\\' {
                    prev_escape = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => {
                    depth += 1;
                    if let Some(pc) = pending_class.as_ref() {
                        if depth == pc.decl_depth + 1 {
                            scope_stack.push(ScopeFrame {
                                name: pc.name.clone(),
                                open_depth: depth,
                            });
                            pending_class = None;
                        }
                    }
                }
                '}' => {
                    depth -= 1;
                    while scope_stack
                        .last()
                        .map(|f| f.open_depth > depth)
                        .unwrap_or(false)
                    {
                        scope_stack.pop();
                    }
                }
                _ => {}
            }
        }
    }

    discovered
}

/// Joins the scope stack from the outer class to the innermost scope with
/// `$`, mirroring the external runner's nested-selector syntax.
/// 将作用域栈从外层类到最内层作用域用 `$` 连接，
/// 与外部运行器的嵌套选择器语法一致。
fn declaring_scope(stack: &[ScopeFrame], outer_class_name: &str) -> String {
    match stack.iter().position(|f| f.name == outer_class_name) {
        Some(idx) => stack[idx..]
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join("$"),
        None => outer_class_name.to_string(),
    }
}

/// Checks whether the line carries `@<name>` at a token boundary, so that
/// `@Test` does not match `@TestInstance`.
/// 检查该行是否在词法边界处携带 `@<name>`，
/// 使得 `@Test` 不会匹配 `@TestInstance`。
fn has_annotation(line: &str, name: &str) -> bool {
    let needle = format!("@{}", name);
    let mut search_from = 0;
    while let Some(pos) = line[search_from..].find(&needle) {
        let end = search_from + pos + needle.len();
        let boundary = line[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric() && c != '_')
            .unwrap_or(true);
        if boundary {
            return true;
        }
        search_from = end;
    }
    false
}

/// Finds the start of a values-source annotation on the line, if present.
fn find_values_annotation(line: &str) -> Option<usize> {
    for needle in ["@ValueSource", "@CsvSource"] {
        if let Some(pos) = line.find(needle) {
            return Some(pos);
        }
    }
    None
}

/// Counts the comma-separated literal entries inside the annotation's brace
/// block. Commas inside string literals do not split entries, so
/// `@CsvSource({"a,b", "c,d"})` counts 2.
/// 统计注解花括号块内以逗号分隔的字面量条目数。
/// 字符串字面量内的逗号不会分割条目，
/// 因此 `@CsvSource({"a,b", "c,d"})` 计为 2。
fn count_value_literals(fragment: &str) -> usize {
    let open = match fragment.find('{') {
        Some(idx) => idx,
        None => return 0,
    };
    let close = match fragment[open..].find('}') {
        Some(idx) => open + idx,
        None => return 0,
    };
    let body = &fragment[open + 1..close];
    if body.trim().is_empty() {
        return 0;
    }

    let mut count = 1;
    let mut in_string = false;
    let mut prev_escape = false;
    for c in body.chars() {
        if in_string {
            if prev_escape {
                prev_escape = false;
            } else if c == '\\' {
                prev_escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => count += 1,
            _ => {}
        }
    }
    count
}

/// Best-effort extraction of the parameter type list for Surefire-style
/// naming: annotations and `final` are stripped, the leading type token is
/// kept, generics and package prefixes are removed. The output must match
/// the runner's own naming bit-for-bit or selection will silently no-op.
///
/// 以尽力而为的方式提取参数类型列表用于 Surefire 风格命名：
/// 去掉注解和 `final`，保留前导类型记号，去掉泛型和包前缀。
/// 输出必须与运行器自身的命名完全一致，否则选择会静默失效。
fn extract_param_types(after_paren: &str) -> String {
    // Take the text up to the parameter list's closing paren, tolerating
    // nested parens from parameter annotations.
    let mut params = String::new();
    let mut paren_depth = 0i32;
    for c in after_paren.chars() {
        match c {
            '(' => {
                paren_depth += 1;
                params.push(c);
            }
            ')' => {
                if paren_depth == 0 {
                    break;
                }
                paren_depth -= 1;
                params.push(c);
            }
            _ => params.push(c),
        }
    }

    let mut types = Vec::new();
    for param in split_top_level(&params) {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let type_token = param
            .split_whitespace()
            .find(|tok| !tok.starts_with('@') && *tok != "final");
        if let Some(tok) = type_token {
            // `Map<String, Integer>` -> `Map`; `com.example.Foo` -> `Foo`.
            let no_generics = tok.split('<').next().unwrap_or(tok);
            let no_package = no_generics.rsplit('.').next().unwrap_or(no_generics);
            types.push(no_package.to_string());
        }
    }
    types.join(", ")
}

/// Splits a parameter list on commas that are not nested inside generics
/// or parens.
/// 在未嵌套于泛型或括号内的逗号处分割参数列表。
fn split_top_level(params: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut angle_depth = 0i32;
    let mut paren_depth = 0i32;
    for c in params.chars() {
        match c {
            '<' => {
                angle_depth += 1;
                current.push(c);
            }
            '>' => {
                angle_depth -= 1;
                current.push(c);
            }
            '(' => {
                paren_depth += 1;
                current.push(c);
            }
            ')' => {
                paren_depth -= 1;
                current.push(c);
            }
            ',' if angle_depth == 0 && paren_depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}
