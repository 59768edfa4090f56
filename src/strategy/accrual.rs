//! Collateral yield and P&L accrual.

use crate::error::BacktestError;

pub const MINUTES_PER_YEAR: f64 = 365.0 * 24.0 * 60.0;

/// Per-window compounding multiplier for an annual percentage yield.
///
/// Compounding the result `MINUTES_PER_YEAR / window_minutes` times
/// reproduces `1 + apy_percent / 100`.
pub fn apy_to_window_multiplier(window_minutes: u32, apy_percent: f64) -> f64 {
    let periods_per_year = MINUTES_PER_YEAR / f64::from(window_minutes);
    ((1.0 + apy_percent / 100.0).ln() / periods_per_year).exp()
}

/// Roll collateral forward one window: basket appreciation, then yield,
/// then realized strategy P&L.
pub fn update_collateral_value(
    value: f64,
    multiplier: f64,
    pnl_change: f64,
    basket_value_before: f64,
    basket_value_after: f64,
) -> Result<f64, BacktestError> {
    if basket_value_before <= 0.0 || !basket_value_before.is_finite() {
        return Err(BacktestError::degenerate(
            "update_collateral_value",
            format!("basket value before window is {}", basket_value_before),
        ));
    }

    Ok(value * (basket_value_after / basket_value_before) * multiplier + pnl_change)
}

/// Mark the LP exposure to market at `future_price`.
///
/// Returns `(new_pnl, pnl_change)`; `new_pnl` is always the mark-to-market
/// value itself.
pub fn update_pnl(pnl: f64, future_price: f64, asset_position: f64, cash_balance: f64) -> (f64, f64) {
    let mark_to_market = cash_balance + asset_position * future_price;
    let change = mark_to_market - pnl;
    (pnl + change, change)
}
