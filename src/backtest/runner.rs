//! Parallel batch runs and parameter sweeps.
//!
//! Every run owns its own simulation state, so configs fan out across a
//! rayon pool with no shared mutable data.

use crate::backtest::engine::{run_backtest, BacktestResult, Simulator, WindowResult};
use crate::backtest::{BacktestConfig, MarketSeries};
use crate::config::Config;
use crate::error::BacktestError;
use anyhow::{Context, Result};
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Run independent backtests over the same series, one per config.
///
/// Results come back in the same order as `configs`.
pub fn run_batch(
    series: &MarketSeries,
    configs: &[Config],
) -> Vec<Result<Vec<WindowResult>, BacktestError>> {
    configs
        .par_iter()
        .map(|config| Simulator::new(config)?.run(series))
        .collect()
}

/// Defines the parameter space to explore during optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub collateral_apy: Vec<f64>,
    pub arb_threshold: Vec<f64>,
    pub percent_collateral_deployed: Vec<f64>,
    pub liquidity_concentration: Vec<f64>,
    pub reset_threshold: Vec<f64>,
    pub window_minutes: Vec<u32>,
}

impl Default for ParameterSpace {
    fn default() -> Self {
        Self {
            collateral_apy: vec![0.0],
            arb_threshold: vec![0.1, 0.2, 0.5],
            percent_collateral_deployed: vec![10.0, 20.0, 40.0],
            liquidity_concentration: vec![1.0, 2.0, 4.0],
            reset_threshold: vec![0.1, 0.2, 0.3],
            window_minutes: vec![60, 60 * 24],
        }
    }
}

impl ParameterSpace {
    /// Create a minimal parameter space for quick testing.
    pub fn minimal() -> Self {
        Self {
            collateral_apy: vec![0.0],
            arb_threshold: vec![0.2],
            percent_collateral_deployed: vec![20.0],
            liquidity_concentration: vec![1.0],
            reset_threshold: vec![0.2],
            window_minutes: vec![60 * 24],
        }
    }

    /// Count total number of combinations.
    pub fn combination_count(&self) -> usize {
        self.collateral_apy.len()
            * self.arb_threshold.len()
            * self.percent_collateral_deployed.len()
            * self.liquidity_concentration.len()
            * self.reset_threshold.len()
            * self.window_minutes.len()
    }

    /// Generate all config combinations.
    pub fn generate_configs(&self, base_config: &Config) -> Vec<Config> {
        let mut configs = Vec::with_capacity(self.combination_count());

        for &collateral_apy in &self.collateral_apy {
            for &arb_threshold in &self.arb_threshold {
                for &percent_collateral_deployed in &self.percent_collateral_deployed {
                    for &liquidity_concentration in &self.liquidity_concentration {
                        for &reset_threshold in &self.reset_threshold {
                            for &window_minutes in &self.window_minutes {
                                let mut config = base_config.clone();
                                let strategy = &mut config.strategy;

                                strategy.collateral_apy = collateral_apy;
                                strategy.arb_threshold = arb_threshold;
                                strategy.percent_collateral_deployed = percent_collateral_deployed;
                                strategy.liquidity_concentration = liquidity_concentration;
                                strategy.reset_threshold = reset_threshold;
                                strategy.window_minutes = window_minutes;

                                configs.push(config);
                            }
                        }
                    }
                }
            }
        }

        configs
    }

    /// Describe a config's parameter values.
    pub fn describe_config(config: &Config) -> String {
        let s = &config.strategy;
        format!(
            "apy={:.1}% arb={:.2}% deployed={:.0}% conc={:.1}x reset={:.2} window={}m",
            s.collateral_apy,
            s.arb_threshold,
            s.percent_collateral_deployed,
            s.liquidity_concentration,
            s.reset_threshold,
            s.window_minutes,
        )
    }
}

/// Results from a parameter sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResults {
    /// All successful run results
    pub runs: Vec<(Config, BacktestResult)>,

    /// Best config by total return
    pub best_by_return: Option<usize>,

    /// Best config by Calmar ratio (return/drawdown)
    pub best_by_calmar: Option<usize>,

    /// Best config by fees collected
    pub best_by_fees: Option<usize>,

    /// Total combinations tested
    pub total_combinations: usize,

    /// Successful runs
    pub successful_runs: usize,

    /// Failed runs
    pub failed_runs: usize,
}

impl SweepResults {
    fn from_runs(runs: Vec<(Config, BacktestResult)>, total_combinations: usize) -> Self {
        let best_by = |key: fn(&BacktestResult) -> Decimal| {
            runs.iter()
                .enumerate()
                .max_by_key(|(_, (_, result))| key(result))
                .map(|(i, _)| i)
        };

        let best_by_return = best_by(|r| r.metrics.total_return_pct);
        let best_by_calmar = best_by(|r| r.metrics.calmar_ratio);
        let best_by_fees = best_by(|r| r.metrics.total_fees_collected);
        let successful_runs = runs.len();

        Self {
            runs,
            best_by_return,
            best_by_calmar,
            best_by_fees,
            total_combinations,
            successful_runs,
            failed_runs: total_combinations - successful_runs,
        }
    }

    /// Get the best result by total return.
    pub fn best_return(&self) -> Option<&(Config, BacktestResult)> {
        self.best_by_return.map(|i| &self.runs[i])
    }

    /// Get the best result by Calmar ratio.
    pub fn best_calmar(&self) -> Option<&(Config, BacktestResult)> {
        self.best_by_calmar.map(|i| &self.runs[i])
    }

    /// Get the best result by fees collected.
    pub fn best_fees(&self) -> Option<&(Config, BacktestResult)> {
        self.best_by_fees.map(|i| &self.runs[i])
    }

    /// Export results to CSV.
    pub fn to_csv(&self, path: &str) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;

        // Header
        writeln!(
            file,
            "collateral_apy,arb_threshold,percent_collateral_deployed,liquidity_concentration,reset_threshold,window_minutes,total_return_pct,annualized_return,calmar_ratio,max_dd_pct,fees_collected,reset_cost,resets,final_collateral"
        )?;

        // Data rows
        for (config, result) in &self.runs {
            let s = &config.strategy;
            let m = &result.metrics;
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                s.collateral_apy,
                s.arb_threshold,
                s.percent_collateral_deployed,
                s.liquidity_concentration,
                s.reset_threshold,
                s.window_minutes,
                m.total_return_pct,
                m.annualized_return,
                m.calmar_ratio,
                m.max_drawdown * dec!(100),
                m.total_fees_collected,
                m.total_reset_cost,
                m.reset_count,
                m.final_collateral_value,
            )?;
        }

        Ok(())
    }

    /// Generate a summary comparison table.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str("PARAMETER SWEEP RESULTS\n");
        s.push_str("═══════════════════════════════════════════════════════════════\n");
        s.push_str(&format!(
            "Total: {} | Successful: {} | Failed: {}\n\n",
            self.total_combinations, self.successful_runs, self.failed_runs
        ));

        let sections = [
            ("BEST BY RETURN", self.best_return()),
            ("BEST BY CALMAR RATIO", self.best_calmar()),
            ("BEST BY FEES COLLECTED", self.best_fees()),
        ];

        for (title, best) in sections {
            if let Some((config, result)) = best {
                s.push_str(&format!("{}:\n", title));
                s.push_str(&format!("  Config: {}\n", ParameterSpace::describe_config(config)));
                s.push_str(&format!(
                    "  Return: {:.2}% | Calmar: {:.3} | MaxDD: {:.2}% | Fees: ${:.2} | Resets: {}\n\n",
                    result.metrics.total_return_pct,
                    result.metrics.calmar_ratio,
                    result.metrics.max_drawdown * dec!(100),
                    result.metrics.total_fees_collected,
                    result.metrics.reset_count,
                ));
            }
        }

        s.push_str("═══════════════════════════════════════════════════════════════\n");

        s
    }
}

/// Parameter sweep runner for parallel backtesting.
pub struct SweepRunner {
    parameter_space: ParameterSpace,
    base_config: Config,
    backtest_config: BacktestConfig,
    parallelism: usize,
}

impl SweepRunner {
    /// Create a new sweep runner.
    pub fn new(
        parameter_space: ParameterSpace,
        base_config: Config,
        backtest_config: BacktestConfig,
        parallelism: usize,
    ) -> Self {
        Self {
            parameter_space,
            base_config,
            backtest_config,
            parallelism: parallelism.max(1),
        }
    }

    /// Run the parameter sweep on a private thread pool.
    pub fn run(&self, series: &MarketSeries) -> Result<SweepResults> {
        let configs = self.parameter_space.generate_configs(&self.base_config);
        let total_combinations = configs.len();

        info!(
            "Starting parameter sweep with {} combinations, parallelism={}",
            total_combinations, self.parallelism
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
            .context("Failed to build sweep thread pool")?;

        let outcomes: Vec<Option<(Config, BacktestResult)>> = pool.install(|| {
            configs
                .into_par_iter()
                .enumerate()
                .map(|(i, config)| {
                    match run_backtest(series, &config, &self.backtest_config) {
                        Ok(result) => {
                            info!(
                                "[{}/{}] {} -> Return={:.2}% Resets={}",
                                i + 1,
                                total_combinations,
                                ParameterSpace::describe_config(&config),
                                result.metrics.total_return_pct,
                                result.metrics.reset_count
                            );
                            Some((config, result))
                        }
                        Err(e) => {
                            warn!(
                                "[{}/{}] {} failed: {}",
                                i + 1,
                                total_combinations,
                                ParameterSpace::describe_config(&config),
                                e
                            );
                            None
                        }
                    }
                })
                .collect()
        });

        let runs: Vec<_> = outcomes.into_iter().flatten().collect();
        Ok(SweepResults::from_runs(runs, total_combinations))
    }
}
