//! Configuration management for the vault backtester.
//!
//! Loads settings from environment variables and config files.

use crate::error::BacktestError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// LP strategy parameters
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Simulation costs and starting capital
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Expected APY on the collateral basket, in percent
    #[serde(default = "default_collateral_apy")]
    pub collateral_apy: f64,
    /// Minimum price deviation (percent) before an arbitrageur trades the pool
    #[serde(default = "default_arb_threshold")]
    pub arb_threshold: f64,
    /// Percent of collateral deployed as LP capital ("80-20" vault = 20)
    #[serde(default = "default_percent_collateral_deployed")]
    pub percent_collateral_deployed: f64,
    /// Range concentration factor (1 = full-range equivalent, 2 = 2x leveraged)
    #[serde(default = "default_liquidity_concentration")]
    pub liquidity_concentration: f64,
    /// Reset once LP notional exposure exceeds this fraction of collateral
    #[serde(default = "default_reset_threshold")]
    pub reset_threshold: f64,
    /// Minutes between rebalancing decisions
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Cost of unwinding the LP exposure on reset, as a fraction of notional
    #[serde(default = "default_reset_slippage")]
    pub reset_slippage: f64,
    /// Fee share of swept volume paid to LPs
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    /// Collateral value at the start of the backtest (USD)
    #[serde(default = "default_initial_collateral_value")]
    pub initial_collateral_value: f64,
}

// Default value functions
fn default_collateral_apy() -> f64 {
    0.0
}

fn default_arb_threshold() -> f64 {
    0.2 // 0.2% deviation
}

fn default_percent_collateral_deployed() -> f64 {
    20.0
}

fn default_liquidity_concentration() -> f64 {
    1.0 // UNI v2 equivalent
}

fn default_reset_threshold() -> f64 {
    0.2
}

fn default_window_minutes() -> u32 {
    60 * 24
}

fn default_reset_slippage() -> f64 {
    0.03
}

fn default_fee_rate() -> f64 {
    0.001 // LPs collect 0.1%
}

fn default_initial_collateral_value() -> f64 {
    1_000_000.0
}

impl StrategyConfig {
    /// Fraction of collateral sized into each new position.
    pub fn capital_fraction(&self) -> f64 {
        self.percent_collateral_deployed / 100.0
    }

    /// Fraction driving the range width; concentration narrows the range.
    pub fn range_fraction(&self) -> f64 {
        self.percent_collateral_deployed / self.liquidity_concentration / 100.0
    }
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("VLB").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load configuration from an explicit file, still honouring env overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("VLB").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), BacktestError> {
        let s = &self.strategy;
        let sim = &self.simulation;

        ensure_param(
            s.percent_collateral_deployed.is_finite() && s.percent_collateral_deployed > 0.0,
            "percent_collateral_deployed",
            format!("must be positive, got {}", s.percent_collateral_deployed),
        )?;
        ensure_param(
            s.liquidity_concentration.is_finite() && s.liquidity_concentration >= 1.0,
            "liquidity_concentration",
            format!("must be >= 1, got {}", s.liquidity_concentration),
        )?;
        ensure_param(
            s.range_fraction() < 1.0,
            "percent_collateral_deployed",
            format!(
                "deployed / concentration must be below 100, got {}",
                s.range_fraction() * 100.0
            ),
        )?;
        ensure_param(
            s.arb_threshold.is_finite() && s.arb_threshold >= 0.0,
            "arb_threshold",
            format!("must be non-negative, got {}", s.arb_threshold),
        )?;
        ensure_param(
            s.reset_threshold.is_finite() && s.reset_threshold >= 0.0,
            "reset_threshold",
            format!("must be non-negative, got {}", s.reset_threshold),
        )?;
        ensure_param(s.window_minutes >= 1, "window_minutes", "must be at least 1")?;
        ensure_param(
            s.collateral_apy.is_finite() && s.collateral_apy > -100.0,
            "collateral_apy",
            format!("must be above -100, got {}", s.collateral_apy),
        )?;

        ensure_param(
            (0.0..1.0).contains(&sim.reset_slippage),
            "reset_slippage",
            format!("must be in [0, 1), got {}", sim.reset_slippage),
        )?;
        ensure_param(
            (0.0..1.0).contains(&sim.fee_rate),
            "fee_rate",
            format!("must be in [0, 1), got {}", sim.fee_rate),
        )?;
        ensure_param(
            sim.initial_collateral_value.is_finite() && sim.initial_collateral_value > 0.0,
            "initial_collateral_value",
            format!("must be positive, got {}", sim.initial_collateral_value),
        )?;

        Ok(())
    }
}

fn ensure_param(
    condition: bool,
    name: &'static str,
    reason: impl Into<String>,
) -> Result<(), BacktestError> {
    if condition {
        Ok(())
    } else {
        Err(BacktestError::invalid_parameter(name, reason))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            collateral_apy: default_collateral_apy(),
            arb_threshold: default_arb_threshold(),
            percent_collateral_deployed: default_percent_collateral_deployed(),
            liquidity_concentration: default_liquidity_concentration(),
            reset_threshold: default_reset_threshold(),
            window_minutes: default_window_minutes(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            reset_slippage: default_reset_slippage(),
            fee_rate: default_fee_rate(),
            initial_collateral_value: default_initial_collateral_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy.window_minutes, 1440);
        assert_eq!(config.simulation.initial_collateral_value, 1_000_000.0);
    }

    #[test]
    fn test_fractions() {
        let mut config = Config::default();
        config.strategy.percent_collateral_deployed = 40.0;
        config.strategy.liquidity_concentration = 2.0;

        assert!((config.strategy.capital_fraction() - 0.4).abs() < 1e-12);
        assert!((config.strategy.range_fraction() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_full_deployment_is_invalid_parameter() {
        let mut config = Config::default();
        config.strategy.percent_collateral_deployed = 100.0;
        config.strategy.liquidity_concentration = 1.0;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            BacktestError::InvalidParameter {
                name: "percent_collateral_deployed",
                ..
            }
        ));
    }

    #[test]
    fn test_concentration_brings_deployment_in_range() {
        let mut config = Config::default();
        config.strategy.percent_collateral_deployed = 100.0;
        config.strategy.liquidity_concentration = 4.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: [(&str, fn(&mut Config)); 8] = [
            ("arb_threshold", |c: &mut Config| c.strategy.arb_threshold = -0.1),
            ("reset_threshold", |c: &mut Config| c.strategy.reset_threshold = -1.0),
            ("window_minutes", |c: &mut Config| c.strategy.window_minutes = 0),
            ("liquidity_concentration", |c: &mut Config| {
                c.strategy.liquidity_concentration = 0.5
            }),
            ("collateral_apy", |c: &mut Config| c.strategy.collateral_apy = -100.0),
            ("reset_slippage", |c: &mut Config| c.simulation.reset_slippage = 1.0),
            ("fee_rate", |c: &mut Config| c.simulation.fee_rate = -0.001),
            ("initial_collateral_value", |c: &mut Config| {
                c.simulation.initial_collateral_value = 0.0
            }),
        ];

        for (expected, mutate) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            match config.validate() {
                Err(BacktestError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("{} should be rejected, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_load_from_file_with_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[strategy]\narb_threshold = 0.5\nwindow_minutes = 60\n\n[simulation]\nfee_rate = 0.003"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.strategy.arb_threshold, 0.5);
        assert_eq!(config.strategy.window_minutes, 60);
        assert_eq!(config.strategy.percent_collateral_deployed, 20.0);
        assert_eq!(config.simulation.fee_rate, 0.003);
        assert_eq!(config.simulation.reset_slippage, 0.03);
    }
}
