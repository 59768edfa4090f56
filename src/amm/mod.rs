//! Uniswap-V3-style concentrated liquidity math.
//!
//! Pure functions converting between a liquidity scalar and the asset/cash
//! balances it represents inside a price range.

mod curve;

pub use curve::{
    asset_cash_deployed, asset_in_range, cash_in_range, compute_liquidity,
    delta_asset_on_price_move, delta_cash_on_price_move,
};
