//! LP vault strategy building blocks.
//!
//! Contains the pure functions the backtest loop composes:
//! - Range policy and position sizing
//! - Arbitrage-driven fee estimation
//! - Collateral yield and P&L accrual

mod accrual;
mod fees;
mod range;

pub use accrual::{apy_to_window_multiplier, update_collateral_value, update_pnl, MINUTES_PER_YEAR};
pub use fees::{estimate_fees, extract_arbitrage_prices, CheckpointMode};
pub use range::{compute_range_bounds, create_liquidity_position, LiquidityPosition, RangeBounds};
