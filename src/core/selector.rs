//! # Test Selector Builder Module / 测试选择器构建模块
//!
//! This module computes the external runner's test selection from logical
//! test identifiers: the class selector (possibly a nested `Outer$Nested`
//! scope) and the `#method1+method2` filter expression appended to it.
//! Building a selector is pure and idempotent.
//!
//! 此模块从逻辑测试标识符计算外部运行器的测试选择：
//! 类选择器（可能是嵌套的 `Outer$Nested` 作用域）
//! 以及附加其后的 `#method1+method2` 过滤表达式。
//! 构建选择器是纯函数且幂等的。

use crate::core::models::DiscoveredTestMethod;

/// A resolved selection for the external runner.
/// 为外部运行器解析出的选择。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSelector {
    /// `Outer` or `Outer$Nested`.
    pub class_selector: String,
    /// Deduplicated method names joined with `+`; empty means "the whole
    /// class".
    /// 去重后的以 `+` 连接的方法名；为空表示"整个类"。
    pub method_filter: String,
}

impl TestSelector {
    /// Renders the runner's `-Dtest=` argument value.
    /// 渲染运行器的 `-Dtest=` 参数值。
    pub fn as_argument(&self) -> String {
        if self.method_filter.is_empty() {
            self.class_selector.clone()
        } else {
            format!("{}#{}", self.class_selector, self.method_filter)
        }
    }
}

/// Builds a selector targeting a whole class.
pub fn for_class(outer_class: &str) -> TestSelector {
    TestSelector {
        class_selector: outer_class.to_string(),
        method_filter: String::new(),
    }
}

/// Builds a selector for an explicit set of test identifiers.
///
/// The runner can only select a method by its declared name, never by a
/// specific parameterized invocation index, so `(...)[n]` suffixes are
/// stripped before the filter is assembled. When every requested test lives
/// in one common nested scope, that scope becomes the class selector;
/// otherwise the unqualified outer class is used, which the runner
/// interprets as "search the whole file including nested scopes".
///
/// 为一组显式测试标识符构建选择器。
///
/// 运行器只能按声明名选择方法，无法按具体的参数化调用序号选择，
/// 因此在组装过滤表达式前会去掉 `(...)[n]` 后缀。
/// 当所有请求的测试都位于同一个嵌套作用域时，该作用域成为类选择器；
/// 否则使用未限定的外层类，运行器会将其解释为
/// "搜索整个文件，包括嵌套作用域"。
///
/// # Arguments
/// * `requested_tests` - Logical test identifiers, suffixes tolerated
/// * `outer_class` - The outer test class; a `$`-qualified value is kept as-is
/// * `discovered` - Scanner output for the class, used for scope resolution
pub fn for_tests(
    requested_tests: &[String],
    outer_class: &str,
    discovered: &[DiscoveredTestMethod],
) -> TestSelector {
    let mut stripped: Vec<String> = Vec::new();
    for test in requested_tests {
        let base = strip_invocation_suffix(test);
        if !stripped.iter().any(|s| s == base) {
            stripped.push(base.to_string());
        }
    }

    let class_selector = if outer_class.contains('$') {
        // The caller already qualified a nested scope; trust it.
        outer_class.to_string()
    } else {
        resolve_common_scope(&stripped, outer_class, discovered)
    };

    TestSelector {
        class_selector,
        method_filter: stripped.join("+"),
    }
}

/// Strips a Surefire-style parameterized invocation suffix: both
/// `check(String)[2]` and `check(String)` become `check`.
/// 去掉 Surefire 风格的参数化调用后缀：
/// `check(String)[2]` 和 `check(String)` 都变为 `check`。
pub fn strip_invocation_suffix(test_name: &str) -> &str {
    match test_name.find('(') {
        Some(idx) => &test_name[..idx],
        None => test_name,
    }
}

/// Looks up each requested test's declaring scope in the scan output. If
/// every resolvable test shares exactly one scope different from the outer
/// class, that nested scope wins; any disagreement falls back to the outer
/// class.
/// 在扫描输出中查找每个请求测试的声明作用域。
/// 若所有可解析的测试共享且仅共享一个不同于外层类的作用域，
/// 则该嵌套作用域胜出；任何分歧都会回退到外层类。
fn resolve_common_scope(
    stripped_names: &[String],
    outer_class: &str,
    discovered: &[DiscoveredTestMethod],
) -> String {
    let mut common: Option<&str> = None;
    for name in stripped_names {
        let scope = discovered
            .iter()
            .find(|t| t.base_name() == name)
            .map(|t| t.declaring_scope.as_str());
        match scope {
            Some(scope) => match common {
                None => common = Some(scope),
                Some(existing) if existing == scope => {}
                Some(_) => return outer_class.to_string(),
            },
            // Unknown to the scanner: the safe selector is the whole file.
            None => return outer_class.to_string(),
        }
    }

    match common {
        Some(scope) if scope != outer_class => scope.to_string(),
        _ => outer_class.to_string(),
    }
}
