//! Backtesting module for the LP vault strategy.
//!
//! This module provides:
//! - Historical data loading (CSV import with gap filling)
//! - Window-by-window simulation engine with position resets
//! - Parallel batch runs and parameter sweeps
//! - Performance metrics calculation
//!
//! # Example
//!
//! ```rust,ignore
//! use vault_lp_backtester::backtest::{BacktestConfig, BacktestEngine, CollateralSource, CsvDataLoader};
//! use vault_lp_backtester::collateral::CollateralBasket;
//!
//! let loader = CsvDataLoader::from_files(&["data/eth_2022_01.csv"], CollateralSource::Basket(CollateralBasket::Usd))?;
//! let engine = BacktestEngine::new(loader, Config::default(), BacktestConfig::default());
//!
//! let result = engine.run(start, end)?;
//! println!("Return: {:.2}%", result.metrics.total_return_pct);
//! ```

mod data;
mod engine;
mod metrics;
mod runner;

pub use data::{
    clip_to_range, interpolate_missing_minutes, load_collateral_files, load_price_files,
    read_series_csv, series_from_csv_content, CollateralPoint, CollateralSource, CsvDataLoader,
    DataLoader, MarketSeries, PricePoint,
};
pub use engine::{
    run_backtest, BacktestEngine, BacktestResult, SimulationState, Simulator, WindowInput,
    WindowResult,
};
pub use metrics::{equity_curve, BacktestMetrics, EquityPoint};
pub use runner::{run_batch, ParameterSpace, SweepResults, SweepRunner};

use serde::{Deserialize, Serialize};

/// Configuration for a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Whether to keep every window row in the result (can use lots of memory)
    pub record_windows: bool,

    /// Path to output results (optional)
    pub output_path: Option<String>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            record_windows: true,
            output_path: None,
        }
    }
}

/// Number of full windows simulated over `rows` minute rows.
///
/// Each window needs both endpoints present, and the final full window's
/// end row is never used as a start, giving `floor(rows / window) - 1`.
pub fn window_count(rows: usize, window_minutes: usize) -> usize {
    if window_minutes == 0 {
        return 0;
    }
    (rows / window_minutes).saturating_sub(1)
}
