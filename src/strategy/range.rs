//! Range policy and position sizing.
//!
//! Deploying a fraction `f` of collateral into a full-range-equivalent
//! position behaves like a concentrated position with bounds
//! `[(1 - f)^2, 1 / (1 - f)^2]` around the current price.

use crate::amm::compute_liquidity;
use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

/// Multiplicative price bounds around a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub lower: f64,
    pub upper: f64,
}

/// A concentrated liquidity position. Replaced wholesale on reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub liquidity: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Price the position was sized at
    pub created_at_price: f64,
}

impl LiquidityPosition {
    pub fn lower_tick(&self, price: f64) -> f64 {
        price * self.lower_bound
    }

    pub fn upper_tick(&self, price: f64) -> f64 {
        price * self.upper_bound
    }
}

/// Compute symmetric range bounds for a deployed fraction in `(0, 1)`.
pub fn compute_range_bounds(deployed_fraction: f64) -> Result<RangeBounds, BacktestError> {
    if !deployed_fraction.is_finite() || deployed_fraction <= 0.0 || deployed_fraction >= 1.0 {
        return Err(BacktestError::invalid_parameter(
            "deployed_fraction",
            format!("must be in (0, 1), got {}", deployed_fraction),
        ));
    }

    let lower = (1.0 - deployed_fraction).powi(2);
    Ok(RangeBounds {
        lower,
        upper: 1.0 / lower,
    })
}

/// Size a new position at `price` from `collateral_value * deployed_fraction`,
/// split evenly between the risk asset and cash.
pub fn create_liquidity_position(
    price: f64,
    bounds: RangeBounds,
    collateral_value: f64,
    deployed_fraction: f64,
) -> Result<LiquidityPosition, BacktestError> {
    if !collateral_value.is_finite() || collateral_value <= 0.0 {
        return Err(BacktestError::degenerate(
            "create_liquidity_position",
            format!("collateral value {} cannot back a position", collateral_value),
        ));
    }

    let capital = collateral_value * deployed_fraction;
    let cash_amount = capital / 2.0;
    let asset_amount = cash_amount / price;

    let liquidity = compute_liquidity(
        price,
        asset_amount,
        cash_amount,
        price * bounds.lower,
        price * bounds.upper,
    )?;

    Ok(LiquidityPosition {
        liquidity,
        lower_bound: bounds.lower,
        upper_bound: bounds.upper,
        created_at_price: price,
    })
}
