//! # Vault LP Backtester
//!
//! Backtests a vault that deploys part of its collateral into a
//! Uniswap-V3-style concentrated liquidity position, earning arbitrage fees
//! and resetting the position when its inventory drift grows too large.
//!
//! ## Architecture
//!
//! - `amm`: Concentrated liquidity curve math
//! - `strategy`: Range policy, fee estimation and collateral accrual
//! - `collateral`: Collateral basket valuation
//! - `backtest`: Data loading, simulation engine, metrics and parameter sweeps
//! - `config`: Configuration management and validation
//! - `error`: Error taxonomy for the simulation core
//! - `utils`: Shared utilities and decimal reporting helpers

pub mod amm;
pub mod backtest;
pub mod collateral;
pub mod config;
pub mod error;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::BacktestError;
