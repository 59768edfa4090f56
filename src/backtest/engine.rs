//! Backtesting simulation engine.
//!
//! Replays historical price and collateral data window by window through the
//! LP vault strategy, resetting the position whenever its accumulated
//! exposure grows too large relative to collateral.

use crate::amm::{asset_cash_deployed, delta_asset_on_price_move, delta_cash_on_price_move};
use crate::backtest::metrics::BacktestMetrics;
use crate::backtest::{window_count, BacktestConfig, DataLoader, MarketSeries, PricePoint};
use crate::config::Config;
use crate::error::BacktestError;
use crate::strategy::{
    apy_to_window_multiplier, compute_range_bounds, create_liquidity_position, estimate_fees,
    update_collateral_value, update_pnl, LiquidityPosition, RangeBounds,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Vault state carried from one window to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Collateral value in USD
    pub collateral_value: f64,
    /// Signed risk-asset units accumulated since the last reset
    pub lp_asset_position: f64,
    /// Net USD accumulated since the last reset
    pub lp_cash_balance: f64,
    /// Mark-to-market P&L since the last reset
    pub cumulative_pnl: f64,
    pub position: LiquidityPosition,
}

/// Output row for one simulated window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub time: DateTime<Utc>,
    pub current_price: f64,
    pub future_price: f64,
    pub collateral_value_before: f64,
    pub liquidity: f64,
    pub lower_tick: f64,
    pub upper_tick: f64,
    pub asset_deployed: f64,
    pub cash_deployed: f64,
    pub asset_position_before: f64,
    pub cash_balance_before: f64,
    pub fees_collected: f64,
    pub reset_triggered: bool,
    pub pnl_after: f64,
    pub pnl_change: f64,
    pub collateral_value_after: f64,
    /// Slippage paid on reset, zero otherwise
    pub reset_cost: f64,
}

/// Inputs for a single window transition.
#[derive(Debug, Clone, Copy)]
pub struct WindowInput<'a> {
    /// Price path from the window start to the window end, both inclusive
    pub prices: &'a [PricePoint],
    pub collateral_before: f64,
    pub collateral_after: f64,
}

impl<'a> WindowInput<'a> {
    /// Slice window `index` of `window_minutes` out of a series.
    pub fn from_series(
        series: &'a MarketSeries,
        index: usize,
        window_minutes: usize,
    ) -> Result<Self, BacktestError> {
        let start = index.saturating_mul(window_minutes);
        let end = start.saturating_add(window_minutes);
        if window_minutes == 0 || end >= series.len() {
            return Err(BacktestError::InvalidSeries(format!(
                "window {} of {} minutes does not fit in {} rows",
                index,
                window_minutes,
                series.len()
            )));
        }

        let collateral = series.collateral();

        Ok(Self {
            prices: &series.prices()[start..=end],
            collateral_before: collateral[start].value,
            collateral_after: collateral[end].value,
        })
    }
}

/// Stateless window transition for one parameter set.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: Config,
    bounds: RangeBounds,
    apy_multiplier: f64,
    capital_fraction: f64,
}

impl Simulator {
    /// Validate the config and precompute range bounds and yield multiplier.
    pub fn new(config: &Config) -> Result<Self, BacktestError> {
        config.validate()?;

        let strategy = &config.strategy;
        let bounds = compute_range_bounds(strategy.range_fraction())?;

        Ok(Self {
            config: config.clone(),
            bounds,
            apy_multiplier: apy_to_window_multiplier(strategy.window_minutes, strategy.collateral_apy),
            capital_fraction: strategy.capital_fraction(),
        })
    }

    pub fn bounds(&self) -> RangeBounds {
        self.bounds
    }

    pub fn apy_multiplier(&self) -> f64 {
        self.apy_multiplier
    }

    /// Active state at the first price, sized from the initial collateral.
    pub fn initial_state(&self, price: f64) -> Result<SimulationState, BacktestError> {
        let collateral_value = self.config.simulation.initial_collateral_value;
        let position =
            create_liquidity_position(price, self.bounds, collateral_value, self.capital_fraction)?;

        Ok(SimulationState {
            collateral_value,
            lp_asset_position: 0.0,
            lp_cash_balance: 0.0,
            cumulative_pnl: 0.0,
            position,
        })
    }

    /// Advance one window. The reset check sees the already-updated asset
    /// position and collateral value.
    pub fn step(
        &self,
        state: &SimulationState,
        window: &WindowInput<'_>,
    ) -> Result<(SimulationState, WindowResult), BacktestError> {
        let (current, future) = match window.prices {
            [first, .., last] => (*first, *last),
            _ => {
                return Err(BacktestError::InvalidSeries(format!(
                    "window needs at least two prices, got {}",
                    window.prices.len()
                )))
            }
        };

        let strategy = &self.config.strategy;
        let simulation = &self.config.simulation;
        let position = state.position;
        let liquidity = position.liquidity;

        let (asset_deployed, cash_deployed) = asset_cash_deployed(
            liquidity,
            position.lower_bound,
            position.upper_bound,
            current.price,
        );

        let fees_collected = estimate_fees(
            liquidity,
            strategy.arb_threshold,
            simulation.fee_rate,
            window.prices.iter().map(|p| p.price),
        );

        let lp_asset_position = state.lp_asset_position
            + delta_asset_on_price_move(liquidity, position.upper_bound, current.price, future.price);
        let lp_cash_balance = state.lp_cash_balance
            + delta_cash_on_price_move(liquidity, position.lower_bound, current.price, future.price)
            + fees_collected;

        let (pnl, pnl_change) =
            update_pnl(state.cumulative_pnl, future.price, lp_asset_position, lp_cash_balance);

        let collateral_value = update_collateral_value(
            state.collateral_value,
            self.apy_multiplier,
            pnl_change,
            window.collateral_before,
            window.collateral_after,
        )?;

        let exposure = lp_asset_position.abs() * future.price;
        let reset_triggered = exposure > strategy.reset_threshold * collateral_value;

        let (next, reset_cost) = if reset_triggered {
            let reset_cost = exposure * simulation.reset_slippage;
            let collateral_value = collateral_value - reset_cost;
            let position = create_liquidity_position(
                future.price,
                self.bounds,
                collateral_value,
                self.capital_fraction,
            )?;

            debug!(
                "Reset at {}: exposure ${:.2}, slippage ${:.2}, new liquidity {:.4}",
                future.time.format("%Y-%m-%d %H:%M"),
                exposure,
                reset_cost,
                position.liquidity
            );

            let next = SimulationState {
                collateral_value,
                lp_asset_position: 0.0,
                lp_cash_balance: 0.0,
                cumulative_pnl: 0.0,
                position,
            };
            (next, reset_cost)
        } else {
            let next = SimulationState {
                collateral_value,
                lp_asset_position,
                lp_cash_balance,
                cumulative_pnl: pnl,
                position,
            };
            (next, 0.0)
        };

        ensure_finite(&next, current.time)?;

        let result = WindowResult {
            time: current.time,
            current_price: current.price,
            future_price: future.price,
            collateral_value_before: state.collateral_value,
            liquidity,
            lower_tick: position.lower_tick(current.price),
            upper_tick: position.upper_tick(current.price),
            asset_deployed,
            cash_deployed,
            asset_position_before: state.lp_asset_position,
            cash_balance_before: state.lp_cash_balance,
            fees_collected,
            reset_triggered,
            pnl_after: next.cumulative_pnl,
            pnl_change,
            collateral_value_after: next.collateral_value,
            reset_cost,
        };

        Ok((next, result))
    }

    /// Fold every full window of the series.
    pub fn run(&self, series: &MarketSeries) -> Result<Vec<WindowResult>, BacktestError> {
        let window_minutes = self.config.strategy.window_minutes as usize;
        let windows = window_count(series.len(), window_minutes);

        if windows == 0 {
            warn!(
                "{} rows is too short for a {}-minute window, no windows simulated",
                series.len(),
                window_minutes
            );
            return Ok(Vec::new());
        }

        let mut state = self.initial_state(series.prices()[0].price)?;
        let mut results = Vec::with_capacity(windows);

        for i in 0..windows {
            let window = WindowInput::from_series(series, i, window_minutes)?;
            let (next, result) = self.step(&state, &window)?;
            state = next;
            results.push(result);

            if i % 100 == 0 {
                debug!(
                    "Progress: {}/{} ({:.1}%), Collateral: ${:.2}",
                    i,
                    windows,
                    (i as f64 / windows as f64) * 100.0,
                    state.collateral_value
                );
            }
        }

        Ok(results)
    }
}

fn ensure_finite(state: &SimulationState, time: DateTime<Utc>) -> Result<(), BacktestError> {
    let fields = [
        ("collateral_value", state.collateral_value),
        ("lp_asset_position", state.lp_asset_position),
        ("lp_cash_balance", state.lp_cash_balance),
        ("cumulative_pnl", state.cumulative_pnl),
        ("liquidity", state.position.liquidity),
    ];

    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, value)) => Err(BacktestError::degenerate(
            "window transition",
            format!("{} became {} in window starting {}", name, value, time),
        )),
        None => Ok(()),
    }
}

/// Complete result of a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub config: Config,
    pub backtest_config: BacktestConfig,
    pub metrics: BacktestMetrics,
    pub windows: Vec<WindowResult>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rows_processed: usize,
    pub windows_simulated: usize,
}

impl BacktestResult {
    /// Export window rows to CSV.
    pub fn windows_to_csv(&self, path: &str) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "time,current_price,future_price,collateral_value,liquidity,lower_tick,upper_tick,asset_deployed,cash_deployed,lp_asset_position,lp_cash_balance,fees_collected,reset_triggered,lp_pnl,lp_pnl_change,collateral_value_after,reset_cost"
        )?;

        for w in &self.windows {
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                w.time.to_rfc3339(),
                w.current_price,
                w.future_price,
                w.collateral_value_before,
                w.liquidity,
                w.lower_tick,
                w.upper_tick,
                w.asset_deployed,
                w.cash_deployed,
                w.asset_position_before,
                w.cash_balance_before,
                w.fees_collected,
                w.reset_triggered,
                w.pnl_after,
                w.pnl_change,
                w.collateral_value_after,
                w.reset_cost,
            )?;
        }

        Ok(())
    }

    /// Write `windows.csv` and `metrics.json` into `dir`, creating it if needed.
    pub fn save(&self, dir: &str) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir))?;

        let windows_path = format!("{}/windows.csv", dir);
        self.windows_to_csv(&windows_path)
            .with_context(|| format!("Failed to write {}", windows_path))?;

        let metrics_path = format!("{}/metrics.json", dir);
        std::fs::write(&metrics_path, serde_json::to_string_pretty(&self.metrics)?)
            .with_context(|| format!("Failed to write {}", metrics_path))?;

        Ok(())
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{}\n\nBacktest Period: {} to {}\nRows: {}\nWindows: {}",
            self.metrics.summary(),
            self.start_time.format("%Y-%m-%d"),
            self.end_time.format("%Y-%m-%d"),
            self.rows_processed,
            self.windows_simulated,
        )
    }
}

/// Simulate one parameter set over an in-memory series.
pub fn run_backtest(
    series: &MarketSeries,
    config: &Config,
    backtest_config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let simulator = Simulator::new(config)?;
    let windows = simulator.run(series)?;

    let metrics = BacktestMetrics::calculate(
        &windows,
        config.simulation.initial_collateral_value,
        config.strategy.window_minutes,
    );

    Ok(BacktestResult {
        config: config.clone(),
        backtest_config: backtest_config.clone(),
        metrics,
        windows_simulated: windows.len(),
        windows: if backtest_config.record_windows {
            windows
        } else {
            Vec::new()
        },
        start_time: series.start(),
        end_time: series.end(),
        rows_processed: series.len(),
    })
}

/// The backtesting simulation engine.
pub struct BacktestEngine<D: DataLoader> {
    data_loader: D,
    config: Config,
    backtest_config: BacktestConfig,
}

impl<D: DataLoader> BacktestEngine<D> {
    /// Create a new backtest engine.
    pub fn new(data_loader: D, config: Config, backtest_config: BacktestConfig) -> Self {
        Self {
            data_loader,
            config,
            backtest_config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the backtest from start to end time.
    pub fn run(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<BacktestResult> {
        info!(
            "Starting backtest from {} to {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        );

        let series = self.data_loader.load_series(start, end)?;
        info!("Loaded {} minute rows", series.len());

        let result = run_backtest(&series, &self.config, &self.backtest_config)?;

        info!(
            "Backtest complete. {} windows, {} resets, final collateral: ${:.2}",
            result.windows_simulated,
            result.metrics.reset_count,
            result.metrics.final_collateral_value
        );

        if let Some(dir) = &self.backtest_config.output_path {
            result.save(dir)?;
            info!("Results written to {}", dir);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amm::{cash_in_range, compute_liquidity};
    use crate::backtest::{CollateralPoint, CsvDataLoader};
    use chrono::{Duration, TimeZone};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn series_with_collateral(prices: &[f64], collateral: &[f64]) -> MarketSeries {
        let prices = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                time: t(i as i64),
                price,
            })
            .collect();
        let collateral = collateral
            .iter()
            .enumerate()
            .map(|(i, &value)| CollateralPoint {
                time: t(i as i64),
                value,
            })
            .collect();
        MarketSeries::new(prices, collateral).unwrap()
    }

    fn series(prices: &[f64]) -> MarketSeries {
        series_with_collateral(prices, &vec![100.0; prices.len()])
    }

    fn minute_config() -> Config {
        let mut config = Config::default();
        config.strategy.window_minutes = 1;
        config
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol * (1.0 + b.abs()), "{} != {}", a, b);
    }

    #[test]
    fn test_two_window_scenario() {
        let config = minute_config();
        let simulator = Simulator::new(&config).unwrap();
        let results = simulator.run(&series(&[2000.0, 2000.0, 2200.0])).unwrap();

        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.fees_collected, 0.0);
        assert_eq!(first.pnl_change, 0.0);
        assert!(!first.reset_triggered);

        let second = &results[1];
        assert!(second.fees_collected > 0.0);

        let bounds = simulator.bounds();
        let liquidity =
            compute_liquidity(2000.0, 50.0, 100_000.0, 2000.0 * bounds.lower, 2000.0 * bounds.upper)
                .unwrap();
        assert_close(second.liquidity, liquidity, 1e-12);
        assert_close(second.fees_collected, cash_in_range(liquidity, 2000.0, 2200.0) * 0.001, 1e-12);

        let asset_after = delta_asset_on_price_move(liquidity, bounds.upper, 2000.0, 2200.0);
        let cash_after = delta_cash_on_price_move(liquidity, bounds.lower, 2000.0, 2200.0)
            + second.fees_collected;
        assert!(asset_after < 0.0);

        let expected_pnl = cash_after + asset_after * 2200.0;
        assert_close(second.pnl_change, expected_pnl, 1e-9);
        assert_close(second.collateral_value_after, 1_000_000.0 + expected_pnl, 1e-12);

        let expected_reset = asset_after.abs() * 2200.0 > 0.2 * second.collateral_value_after;
        assert_eq!(second.reset_triggered, expected_reset);
        assert_close(second.pnl_after, expected_pnl, 1e-9);
    }

    #[test]
    fn test_flat_series_compounds_apy_only() {
        let mut config = minute_config();
        config.strategy.collateral_apy = 10.0;
        let simulator = Simulator::new(&config).unwrap();
        let m = simulator.apy_multiplier();

        let results = simulator.run(&series(&[1500.0; 12])).unwrap();
        assert_eq!(results.len(), 11);

        for (i, w) in results.iter().enumerate() {
            assert_eq!(w.fees_collected, 0.0);
            assert_eq!(w.asset_position_before, 0.0);
            assert_eq!(w.cash_balance_before, 0.0);
            assert!(!w.reset_triggered);
            assert_close(w.collateral_value_after, 1_000_000.0 * m.powi(i as i32 + 1), 1e-12);
        }
    }

    #[test]
    fn test_full_deployment_fails_before_running() {
        let mut config = minute_config();
        config.strategy.percent_collateral_deployed = 100.0;
        config.strategy.liquidity_concentration = 1.0;

        let err = Simulator::new(&config).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidParameter { .. }));
    }

    #[test]
    fn test_reset_zeroes_state_and_recentres_position() {
        let mut config = minute_config();
        config.strategy.reset_threshold = 0.001;
        let simulator = Simulator::new(&config).unwrap();

        let start = simulator.initial_state(2000.0).unwrap();
        let data = series(&[2000.0, 2200.0]);
        let window = WindowInput::from_series(&data, 0, 1).unwrap();
        let (next, result) = simulator.step(&start, &window).unwrap();

        assert!(result.reset_triggered);
        assert_eq!(next.lp_asset_position, 0.0);
        assert_eq!(next.lp_cash_balance, 0.0);
        assert_eq!(next.cumulative_pnl, 0.0);
        assert_eq!(result.pnl_after, 0.0);
        assert_eq!(next.position.created_at_price, 2200.0);
        assert_close(next.position.lower_tick(2200.0), 2200.0 * 0.64, 1e-12);

        let exposure =
            delta_asset_on_price_move(start.position.liquidity, simulator.bounds().upper, 2000.0, 2200.0)
                .abs()
                * 2200.0;
        assert_close(result.reset_cost, exposure * 0.03, 1e-12);
        assert_close(
            next.collateral_value,
            1_000_000.0 + result.pnl_change - result.reset_cost,
            1e-12,
        );
    }

    #[test]
    fn test_collateral_basket_ratio_applies() {
        let simulator = Simulator::new(&minute_config()).unwrap();
        let data = series_with_collateral(&[2000.0, 2000.0], &[100.0, 110.0]);
        let state = simulator.initial_state(2000.0).unwrap();
        let (next, _) = simulator
            .step(&state, &WindowInput::from_series(&data, 0, 1).unwrap())
            .unwrap();

        assert_close(next.collateral_value, 1_100_000.0, 1e-12);
    }

    #[test]
    fn test_window_count_and_fee_path() {
        let mut config = Config::default();
        config.strategy.window_minutes = 3;
        let simulator = Simulator::new(&config).unwrap();

        // floor(10 / 3) - 1 = 2 windows, each spanning four rows
        let prices = [2000.0, 2100.0, 1900.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0];
        let results = simulator.run(&series(&prices)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].future_price, 2000.0);
        assert!(results[0].fees_collected > 0.0);
        assert_eq!(results[1].time, t(3));
        assert_eq!(results[1].fees_collected, 0.0);
    }

    #[test]
    fn test_short_series_yields_no_windows() {
        let mut config = Config::default();
        config.strategy.window_minutes = 5;
        let simulator = Simulator::new(&config).unwrap();

        let results = simulator.run(&series(&[2000.0; 9])).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_step_rejects_single_point_window() {
        let simulator = Simulator::new(&minute_config()).unwrap();
        let state = simulator.initial_state(2000.0).unwrap();
        let data = series(&[2000.0]);
        let window = WindowInput {
            prices: data.prices(),
            collateral_before: 100.0,
            collateral_after: 100.0,
        };

        assert!(matches!(
            simulator.step(&state, &window),
            Err(BacktestError::InvalidSeries(_))
        ));
    }

    #[test]
    fn test_window_input_rejects_out_of_range_index() {
        let data = series(&[2000.0; 4]);

        assert!(WindowInput::from_series(&data, 2, 1).is_ok());
        assert!(matches!(
            WindowInput::from_series(&data, 3, 1),
            Err(BacktestError::InvalidSeries(_))
        ));
        assert!(matches!(
            WindowInput::from_series(&data, 0, 0),
            Err(BacktestError::InvalidSeries(_))
        ));
        assert!(matches!(
            WindowInput::from_series(&data, usize::MAX, 2),
            Err(BacktestError::InvalidSeries(_))
        ));
    }

    #[test]
    fn test_basket_drift_with_tiny_drawdown_reports_metrics() {
        let data = series_with_collateral(&[2000.0; 4], &[100.0, 100.04, 100.03, 100.034]);
        let result = run_backtest(&data, &minute_config(), &BacktestConfig::default()).unwrap();

        assert_eq!(result.windows_simulated, 3);
        assert!(result.metrics.max_drawdown > rust_decimal::Decimal::ZERO);
        assert!(result.metrics.calmar_ratio > rust_decimal::Decimal::ZERO);
        assert!(result.summary().contains("Calmar"));
    }

    #[test]
    fn test_engine_runs_over_loader() {
        let loader = CsvDataLoader::new(series(&[2000.0, 2010.0, 1990.0, 2005.0]));
        let engine = BacktestEngine::new(loader, minute_config(), BacktestConfig::default());

        let result = engine.run(t(0), t(3)).unwrap();
        assert_eq!(result.rows_processed, 4);
        assert_eq!(result.windows_simulated, 3);
        assert_eq!(result.windows.len(), 3);
        assert!(result.summary().contains("Windows: 3"));
    }

    #[test]
    fn test_windows_not_recorded_when_disabled() {
        let backtest_config = BacktestConfig {
            record_windows: false,
            ..Default::default()
        };
        let result =
            run_backtest(&series(&[2000.0, 2010.0, 1990.0]), &minute_config(), &backtest_config)
                .unwrap();

        assert_eq!(result.windows_simulated, 2);
        assert!(result.windows.is_empty());
    }

    #[test]
    fn test_windows_to_csv() {
        let result = run_backtest(
            &series(&[2000.0, 2010.0, 1990.0]),
            &minute_config(),
            &BacktestConfig::default(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("windows.csv");
        result.windows_to_csv(path.to_str().unwrap()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time,current_price,future_price"));
    }

    #[test]
    fn test_engine_writes_results_to_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let backtest_config = BacktestConfig {
            output_path: Some(out.to_str().unwrap().to_string()),
            ..Default::default()
        };
        let loader = CsvDataLoader::new(series(&[2000.0, 2010.0, 1990.0, 2005.0]));
        let engine = BacktestEngine::new(loader, minute_config(), backtest_config);

        engine.run(t(0), t(3)).unwrap();

        let csv = std::fs::read_to_string(out.join("windows.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);

        let json = std::fs::read_to_string(out.join("metrics.json")).unwrap();
        let metrics: BacktestMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(metrics.window_count, 3);
    }
}
