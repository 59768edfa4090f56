//! Closed-form concentrated liquidity curve.
//!
//! A position with liquidity `L` over `[p_a, p_b]` holds, at price `p`:
//! - asset: `L * (sqrt(p_b) - sqrt(p)) / (sqrt(p) * sqrt(p_b))`
//! - cash:  `L * (sqrt(p) - sqrt(p_a))`
//!
//! Ticks are absolute prices. Bounds are ratios of a reference price, so
//! `tick = price * bound`.

use crate::error::BacktestError;

/// Liquidity implied by holding `asset_amount` and `cash_amount` at `price`
/// over `[lower_tick, upper_tick]`.
///
/// Each side implies its own liquidity; the smaller one binds, since the
/// position must be fully backed by both assets.
pub fn compute_liquidity(
    price: f64,
    asset_amount: f64,
    cash_amount: f64,
    lower_tick: f64,
    upper_tick: f64,
) -> Result<f64, BacktestError> {
    if !(lower_tick < price && price < upper_tick) {
        return Err(BacktestError::degenerate(
            "compute_liquidity",
            format!(
                "price {} must lie strictly inside ({}, {})",
                price, lower_tick, upper_tick
            ),
        ));
    }
    if lower_tick < 0.0 {
        return Err(BacktestError::degenerate(
            "compute_liquidity",
            format!("lower tick {} is negative", lower_tick),
        ));
    }

    let sqrt_price = price.sqrt();
    let sqrt_upper = upper_tick.sqrt();
    let sqrt_lower = lower_tick.sqrt();

    let liquidity_asset = asset_amount * sqrt_price * sqrt_upper / (sqrt_upper - sqrt_price);
    let liquidity_cash = cash_amount / (sqrt_price - sqrt_lower);
    let liquidity = liquidity_asset.min(liquidity_cash);

    if !liquidity.is_finite() {
        return Err(BacktestError::degenerate(
            "compute_liquidity",
            format!("non-finite liquidity at price {}", price),
        ));
    }

    Ok(liquidity)
}

/// Risk asset held by the position at `price` (zero at the upper tick).
pub fn asset_in_range(liquidity: f64, upper_tick: f64, price: f64) -> f64 {
    let sqrt_price = price.sqrt();
    let sqrt_upper = upper_tick.sqrt();
    liquidity * (sqrt_upper - sqrt_price) / (sqrt_price * sqrt_upper)
}

/// Cash held by the position at `price` (zero at the lower tick).
pub fn cash_in_range(liquidity: f64, lower_tick: f64, price: f64) -> f64 {
    liquidity * (price.sqrt() - lower_tick.sqrt())
}

/// Asset and cash deployed at `price` when the bounds are centred on `price`.
pub fn asset_cash_deployed(
    liquidity: f64,
    lower_bound: f64,
    upper_bound: f64,
    price: f64,
) -> (f64, f64) {
    (
        asset_in_range(liquidity, price * upper_bound, price),
        cash_in_range(liquidity, price * lower_bound, price),
    )
}

/// Change in asset balance when the price moves from `price_before` to
/// `price_after`, with the upper tick anchored at `price_before * upper_bound`.
pub fn delta_asset_on_price_move(
    liquidity: f64,
    upper_bound: f64,
    price_before: f64,
    price_after: f64,
) -> f64 {
    let upper_tick = price_before * upper_bound;
    asset_in_range(liquidity, upper_tick, price_after)
        - asset_in_range(liquidity, upper_tick, price_before)
}

/// Change in cash balance for the same move, lower tick anchored at
/// `price_before * lower_bound`.
pub fn delta_cash_on_price_move(
    liquidity: f64,
    lower_bound: f64,
    price_before: f64,
    price_after: f64,
) -> f64 {
    let lower_tick = price_before * lower_bound;
    cash_in_range(liquidity, lower_tick, price_after)
        - cash_in_range(liquidity, lower_tick, price_before)
}
