//! Performance metrics calculation for backtesting.
//!
//! Provides returns, drawdown analysis, fee and reset cost totals.

use crate::backtest::engine::WindowResult;
use crate::utils::decimal::{percent_of, safe_div, to_decimal, to_decimal_dp};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A point on the collateral value curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub collateral_value: Decimal,
    pub drawdown: Decimal,
}

impl EquityPoint {
    /// Create a new equity point.
    pub fn new(timestamp: DateTime<Utc>, collateral_value: Decimal, peak_value: Decimal) -> Self {
        let drawdown = if peak_value > Decimal::ZERO {
            safe_div(peak_value.saturating_sub(collateral_value), peak_value)
        } else {
            Decimal::ZERO
        };

        Self {
            timestamp,
            collateral_value,
            drawdown,
        }
    }
}

/// Build the collateral curve: the initial value at the first window start,
/// then the post-window value at each window end.
pub fn equity_curve(
    windows: &[WindowResult],
    initial_value: f64,
    window_minutes: u32,
) -> Vec<EquityPoint> {
    let Some(first) = windows.first() else {
        return Vec::new();
    };

    let step = Duration::minutes(i64::from(window_minutes));
    let mut peak = to_decimal(initial_value);
    let mut curve = Vec::with_capacity(windows.len() + 1);
    curve.push(EquityPoint::new(first.time, peak, peak));

    for w in windows {
        let value = to_decimal(w.collateral_value_after);
        if value > peak {
            peak = value;
        }
        curve.push(EquityPoint::new(w.time + step, value, peak));
    }

    curve
}

/// Backtest performance metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    // Returns
    /// Total absolute return (final - initial)
    pub total_return: Decimal,
    /// Total return as percentage
    pub total_return_pct: Decimal,
    /// Annualized return percentage
    pub annualized_return: Decimal,

    // Risk
    /// Maximum drawdown as a fraction of peak
    pub max_drawdown: Decimal,
    /// Duration of maximum drawdown in hours
    pub max_drawdown_duration_hours: i64,
    /// Calmar ratio (annualized return / max drawdown)
    pub calmar_ratio: Decimal,

    // Strategy-specific
    /// Total LP fees collected
    pub total_fees_collected: Decimal,
    /// Total slippage paid on resets
    pub total_reset_cost: Decimal,
    pub reset_count: u64,
    pub window_count: u64,
    pub final_collateral_value: Decimal,

    // Time
    /// Backtest duration in days
    pub duration_days: f64,
}

impl BacktestMetrics {
    /// Calculate metrics from the window sequence.
    pub fn calculate(windows: &[WindowResult], initial_value: f64, window_minutes: u32) -> Self {
        if windows.is_empty() {
            return Self::empty(initial_value);
        }

        let curve = equity_curve(windows, initial_value, window_minutes);

        let duration_days = windows.len() as f64 * f64::from(window_minutes) / 1440.0;
        let duration_years = duration_days / 365.0;

        let initial = to_decimal(initial_value);
        let final_value = windows
            .last()
            .map(|w| w.collateral_value_after)
            .unwrap_or(initial_value);

        // Returns
        let total_return = to_decimal(final_value).saturating_sub(initial);
        let total_return_pct = percent_of(total_return, initial);

        let annualized_return = if duration_years > 0.0 && initial_value > 0.0 {
            let factor = final_value / initial_value;
            if factor > 0.0 {
                to_decimal((factor.powf(1.0 / duration_years) - 1.0) * 100.0)
            } else {
                dec!(-100)
            }
        } else {
            Decimal::ZERO
        };

        // Drawdown
        let (max_drawdown, max_dd_duration) = calculate_max_drawdown(&curve);
        let calmar_ratio = if max_drawdown > Decimal::ZERO {
            safe_div(annualized_return, max_drawdown.saturating_mul(dec!(100)))
        } else {
            Decimal::ZERO
        };

        // Strategy-specific
        let total_fees: f64 = windows.iter().map(|w| w.fees_collected).sum();
        let total_reset_cost: f64 = windows.iter().map(|w| w.reset_cost).sum();
        let reset_count = windows.iter().filter(|w| w.reset_triggered).count() as u64;

        Self {
            total_return: total_return.round_dp(2),
            total_return_pct: total_return_pct.round_dp(4),
            annualized_return: annualized_return.round_dp(4),
            max_drawdown: max_drawdown.round_dp(6),
            max_drawdown_duration_hours: max_dd_duration,
            calmar_ratio: calmar_ratio.round_dp(4),
            total_fees_collected: to_decimal_dp(total_fees, 2),
            total_reset_cost: to_decimal_dp(total_reset_cost, 2),
            reset_count,
            window_count: windows.len() as u64,
            final_collateral_value: to_decimal_dp(final_value, 2),
            duration_days,
        }
    }

    /// Metrics for a run that simulated no windows.
    fn empty(initial_value: f64) -> Self {
        Self {
            total_return: Decimal::ZERO,
            total_return_pct: Decimal::ZERO,
            annualized_return: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            max_drawdown_duration_hours: 0,
            calmar_ratio: Decimal::ZERO,
            total_fees_collected: Decimal::ZERO,
            total_reset_cost: Decimal::ZERO,
            reset_count: 0,
            window_count: 0,
            final_collateral_value: to_decimal_dp(initial_value, 2),
            duration_days: 0.0,
        }
    }

    /// Format metrics as a summary string.
    pub fn summary(&self) -> String {
        format!(
            r#"═══════════════════════════════════════════════
BACKTEST RESULTS ({:.1} days)
═══════════════════════════════════════════════
RETURNS
  Total Return:      ${:.2} ({:.2}%)
  Annualized:        {:.2}%
  Final Collateral:  ${:.2}

RISK
  Max Drawdown:      {:.2}%
  Drawdown Hours:    {}
  Calmar Ratio:      {:.3}

LIQUIDITY
  Fees Collected:    ${:.2}
  Reset Cost:        ${:.2}
  Resets:            {}
  Windows:           {}
═══════════════════════════════════════════════"#,
            self.duration_days,
            self.total_return,
            self.total_return_pct,
            self.annualized_return,
            self.final_collateral_value,
            self.max_drawdown * dec!(100),
            self.max_drawdown_duration_hours,
            self.calmar_ratio,
            self.total_fees_collected,
            self.total_reset_cost,
            self.reset_count,
            self.window_count,
        )
    }
}

/// Calculate maximum drawdown and its duration.
fn calculate_max_drawdown(curve: &[EquityPoint]) -> (Decimal, i64) {
    let Some(first) = curve.first() else {
        return (Decimal::ZERO, 0);
    };

    let mut peak = first.collateral_value;
    let mut peak_time = first.timestamp;
    let mut max_dd = Decimal::ZERO;
    let mut max_dd_duration: i64 = 0;

    for point in curve {
        if point.collateral_value >= peak {
            peak = point.collateral_value;
            peak_time = point.timestamp;
            continue;
        }

        let dd = safe_div(peak.saturating_sub(point.collateral_value), peak);
        if dd > max_dd {
            max_dd = dd;
        }
        let duration = (point.timestamp - peak_time).num_hours();
        if dd > Decimal::ZERO && duration > max_dd_duration {
            max_dd_duration = duration;
        }
    }

    (max_dd, max_dd_duration)
}
