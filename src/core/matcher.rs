//! # Method Test Matcher Module / 方法测试匹配模块
//!
//! This module associates a production method with the discovered test
//! methods whose names are derived from it by naming convention. Matching
//! is purely lexical; no runtime instrumentation is involved.
//!
//! 此模块通过命名约定将生产方法与由其派生命名的已发现测试方法关联起来。
//! 匹配完全基于词法；不涉及任何运行时插桩。

use crate::core::models::DiscoveredTestMethod;

/// Returns the subset of `tests` matching `production_method`, preserving
/// scan order. Two rules are tried in order per test, first match wins,
/// duplicates suppressed:
///
/// 1. underscore convention: the test name starts with `method + "_"`;
/// 2. camelCase convention: the test name is strictly longer, starts with
///    `method`, and the next character is uppercase.
///
/// The uppercase check keeps `create` from matching `createdAt...`-style
/// names. It does NOT keep `createAddress` from matching
/// `createAddressInternal_Ok` — that over-match is part of the documented
/// heuristic and is preserved as-is.
///
/// A test may be collected by several production methods when multiple
/// methods are compatible prefixes; a test can legitimately validate more
/// than one behavior.
///
/// 返回 `tests` 中与 `production_method` 匹配的子集，保持扫描顺序。
/// 每个测试按顺序尝试两条规则，先命中者生效，重复项被抑制：
///
/// 1. 下划线约定：测试名以 `method + "_"` 开头；
/// 2. 驼峰约定：测试名严格更长，以 `method` 开头，且下一个字符为大写。
///
/// 大写检查防止 `create` 匹配 `createdAt...` 这类名字。
/// 它不会阻止 `createAddress` 匹配 `createAddressInternal_Ok` ——
/// 这种过度匹配是既有启发式的一部分，按原样保留。
///
/// 当多个方法都是兼容前缀时，一个测试可以被多个生产方法收集；
/// 一个测试验证多个行为是合理的。
pub fn matching_tests(
    production_method: &str,
    tests: &[DiscoveredTestMethod],
) -> Vec<DiscoveredTestMethod> {
    let mut matched: Vec<DiscoveredTestMethod> = Vec::new();

    for test in tests {
        let name = test.base_name();
        let hit = is_underscore_match(production_method, name)
            || is_camel_case_match(production_method, name);
        if hit && !matched.iter().any(|m| m.method_name == test.method_name) {
            matched.push(test.clone());
        }
    }

    matched
}

/// Rule 1: `createAddress` matches `createAddress_InvalidRequest_Throws`.
fn is_underscore_match(method: &str, test_name: &str) -> bool {
    test_name.starts_with(method) && test_name[method.len()..].starts_with('_')
}

/// Rule 2: `createAddress` matches `createAddressRejectsEmpty` but
/// `create` does not match `createdAt`.
fn is_camel_case_match(method: &str, test_name: &str) -> bool {
    test_name.len() > method.len()
        && test_name.starts_with(method)
        && test_name[method.len()..]
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
}
