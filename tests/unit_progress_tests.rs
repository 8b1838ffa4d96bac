//! # Progress Estimator Unit Tests / 进度估算器单元测试
//!
//! Unit tests for the time-based progress smoothing heuristic: gating,
//! monotonicity, the 95% cap and the precedence of confirmed progress.
//!
//! 基于时间的进度平滑启发式的单元测试：适用条件、单调性、
//! 95% 封顶以及已确认进度的优先级。

use coverage_runner::core::config::ProgressConfig;
use coverage_runner::core::progress::{estimate, BASE_OVERHEAD_MS, PER_TEST_MS};

fn default_config() -> ProgressConfig {
    ProgressConfig::default()
}

#[test]
fn test_defaults_match_named_constants() {
    let config = default_config();
    assert_eq!(config.base_overhead_ms, BASE_OVERHEAD_MS);
    assert_eq!(config.per_test_ms, PER_TEST_MS);
}

#[test]
fn test_zero_expected_total_returns_confirmed() {
    let config = default_config();
    assert_eq!(estimate(0, 0, 60_000, &config), 0);
    assert_eq!(estimate(7, 0, 60_000, &config), 7);
}

#[test]
fn test_confirmed_at_total_returns_confirmed() {
    let config = default_config();
    assert_eq!(estimate(10, 10, 60_000, &config), 10);
    assert_eq!(estimate(12, 10, 60_000, &config), 12);
}

/// At elapsed 0 the estimate is just the confirmed count.
#[test]
fn test_zero_elapsed() {
    let config = default_config();
    assert_eq!(estimate(0, 10, 0, &config), 0);
    assert_eq!(estimate(3, 10, 0, &config), 3);
}

/// The estimate never reports 100% while the job is still running, no
/// matter how long it has been.
#[test]
fn test_never_reports_total_while_running() {
    let config = default_config();
    for elapsed in [1_000u64, 10_000, 100_000, 10_000_000] {
        let estimated = estimate(0, 10, elapsed, &config);
        assert!(estimated < 10, "estimate {} at elapsed {}", estimated, elapsed);
    }
    // Even a single-test run reports 0 until confirmation arrives.
    assert_eq!(estimate(0, 1, 10_000_000, &config), 0);
}

/// Monotonically non-decreasing in elapsed time for fixed inputs.
#[test]
fn test_monotonic_in_elapsed() {
    let config = default_config();
    let mut last = 0;
    for elapsed in (0..20_000).step_by(250) {
        let current = estimate(2, 20, elapsed, &config);
        assert!(
            current >= last,
            "estimate decreased from {} to {} at elapsed {}",
            last,
            current,
            elapsed
        );
        last = current;
    }
}

/// Confirmed progress from output parsing always wins over the time-based
/// guess.
#[test]
fn test_confirmed_takes_precedence() {
    let config = default_config();
    // Early on the guess is small; a large confirmed count dominates.
    assert_eq!(estimate(8, 10, 100, &config), 8);
    // Late in the run the guess may exceed a lagging confirmed count.
    let late = estimate(1, 10, 1_000_000, &config);
    assert!(late > 1 && late <= 9);
}

/// Spot-check the formula: expected duration 2000 + 10 * 400 = 6000 ms, so
/// at 3000 ms the ratio is 0.5 and the estimate floors to 5.
#[test]
fn test_formula_midpoint() {
    let config = default_config();
    assert_eq!(estimate(0, 10, 3_000, &config), 5);
}

/// The ratio cap: past the expected duration the ratio pins at 0.95, which
/// floors to 9 of 10.
#[test]
fn test_ratio_cap() {
    let config = default_config();
    assert_eq!(estimate(0, 10, 6_000, &config), 9);
    assert_eq!(estimate(0, 10, 600_000, &config), 9);
}

/// Overridden constants shift the expected duration.
#[test]
fn test_overridden_constants() {
    let config = ProgressConfig {
        base_overhead_ms: 0,
        per_test_ms: 1_000,
    };
    // Expected duration 10s; at 5s half the tests are estimated done.
    assert_eq!(estimate(0, 10, 5_000, &config), 5);
}
