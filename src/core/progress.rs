//! # Progress Estimation Module / 进度估算模块
//!
//! This module computes a smoothed "completed" count for a running job.
//! Output parsing only confirms completion per finished test class, so the
//! live count lags; a time-based guess fills the gaps. Confirmed progress
//! always takes precedence over the guess.
//!
//! 此模块为运行中的任务计算平滑后的"已完成"数量。
//! 输出解析只能在测试类完成时确认进度，实时计数会滞后；
//! 基于时间的猜测用于填补空隙。已确认的进度始终优先于猜测值。

use crate::core::config::ProgressConfig;

/// Fixed startup overhead assumed for any run, in milliseconds. A guessed
/// calibration, overridable through `[progress]` in the config.
/// 假定任何运行都有的固定启动开销（毫秒）。
/// 猜测的校准值，可通过配置中的 `[progress]` 覆盖。
pub const BASE_OVERHEAD_MS: u64 = 2000;

/// Assumed cost per test, in milliseconds.
/// 假定的每个测试的开销（毫秒）。
pub const PER_TEST_MS: u64 = 400;

/// Computes the smoothed completed count for a running job.
///
/// Only applies while `confirmed_completed < expected_total` and
/// `expected_total > 0`; outside that window the confirmed count is
/// returned unchanged. The time-based estimate is capped at 95% of the
/// expected duration ratio and clamped to `expected_total - 1`, so a
/// running job never reports 100%. The result is monotonically
/// non-decreasing in `elapsed_ms` for fixed inputs.
///
/// 为运行中的任务计算平滑后的已完成数量。
///
/// 仅在 `confirmed_completed < expected_total` 且 `expected_total > 0`
/// 时生效；窗口之外原样返回已确认数量。基于时间的估算按预期时长比例
/// 封顶在 95%，并被钳制到 `expected_total - 1`，
/// 因此运行中的任务永远不会报告 100%。
/// 对固定输入，结果随 `elapsed_ms` 单调不减。
pub fn estimate(
    confirmed_completed: usize,
    expected_total: usize,
    elapsed_ms: u64,
    config: &ProgressConfig,
) -> usize {
    if expected_total == 0 || confirmed_completed >= expected_total {
        return confirmed_completed;
    }

    let expected_duration_ms =
        config.base_overhead_ms + expected_total as u64 * config.per_test_ms;
    let ratio = (elapsed_ms as f64 / expected_duration_ms as f64).min(0.95);
    let time_based = ((ratio * expected_total as f64).floor() as usize)
        .min(expected_total.saturating_sub(1));

    confirmed_completed.max(time_based)
}
