//! Vault LP Backtester - Main Entry Point
//!
//! Replays minute price history through the concentrated-liquidity vault
//! strategy, either for a single parameter set or a parameter sweep.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use vault_lp_backtester::backtest::{
    load_price_files, BacktestConfig, BacktestEngine, CollateralSource, CsvDataLoader, DataLoader,
    ParameterSpace, SweepRunner,
};
use vault_lp_backtester::collateral::CollateralBasket;
use vault_lp_backtester::config::Config;

/// Vault LP Backtester CLI
#[derive(Parser)]
#[command(name = "vault-lp-backtester")]
#[command(version, about = "Backtest a concentrated-liquidity LP vault on minute price data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest simulation on historical data
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        overrides: StrategyOverrides,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a parameter sweep optimization
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Number of parallel backtests
        #[arg(short, long, default_value = "4")]
        parallelism: usize,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<String>,

        /// Use minimal parameter space (faster, for testing)
        #[arg(long)]
        minimal: bool,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Price CSV files (`time,price`), merged in time order
    #[arg(long, required = true, num_args = 1..)]
    prices: Vec<PathBuf>,

    /// Collateral basket to derive from the price series
    #[arg(long, value_enum, default_value = "usd")]
    collateral: BasketArg,

    /// Second-asset price CSV files for the tricrypto basket
    #[arg(long, num_args = 1..)]
    second_asset: Vec<PathBuf>,

    /// Collateral value CSV files (`time,value`), overriding --collateral
    #[arg(long, num_args = 1..)]
    collateral_csv: Vec<PathBuf>,

    /// Start date (YYYY-MM-DD), defaults to the first row
    #[arg(short, long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD), defaults to the last row
    #[arg(short, long)]
    end: Option<String>,

    /// Config file (defaults to ./config.* plus VLB__ env vars)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct StrategyOverrides {
    #[arg(long)]
    collateral_apy: Option<f64>,
    #[arg(long)]
    arb_threshold: Option<f64>,
    #[arg(long)]
    percent_collateral_deployed: Option<f64>,
    #[arg(long)]
    liquidity_concentration: Option<f64>,
    #[arg(long)]
    reset_threshold: Option<f64>,
    #[arg(long)]
    window_minutes: Option<u32>,
}

impl StrategyOverrides {
    fn apply(&self, config: &mut Config) {
        let s = &mut config.strategy;
        if let Some(v) = self.collateral_apy {
            s.collateral_apy = v;
        }
        if let Some(v) = self.arb_threshold {
            s.arb_threshold = v;
        }
        if let Some(v) = self.percent_collateral_deployed {
            s.percent_collateral_deployed = v;
        }
        if let Some(v) = self.liquidity_concentration {
            s.liquidity_concentration = v;
        }
        if let Some(v) = self.reset_threshold {
            s.reset_threshold = v;
        }
        if let Some(v) = self.window_minutes {
            s.window_minutes = v;
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BasketArg {
    Usd,
    HalfAsset,
    Tricrypto,
    TricryptoProxy,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    match cli.command {
        Commands::Backtest {
            data,
            overrides,
            output,
        } => run_backtest(&data, &overrides, output.as_deref()),
        Commands::Sweep {
            data,
            parallelism,
            output,
            minimal,
        } => run_sweep(&data, parallelism, output.as_deref(), minimal),
    }
}

fn init_logging() -> Result<WorkerGuard> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "vault-lp-backtester.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vault_lp_backtester=debug".parse()?)
                .add_directive(Level::INFO.into()),
        )
        .with_writer(std::io::stdout.and(file_writer))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .init();

    Ok(guard)
}

fn load_config(data: &DataArgs) -> Result<Config> {
    match &data.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn build_loader(data: &DataArgs) -> Result<CsvDataLoader> {
    let source = if !data.collateral_csv.is_empty() {
        info!("📊 Collateral values from {} file(s)", data.collateral_csv.len());
        CollateralSource::Files(data.collateral_csv.clone())
    } else {
        let basket = match data.collateral {
            BasketArg::Usd => CollateralBasket::Usd,
            BasketArg::HalfAsset => CollateralBasket::HalfAsset,
            BasketArg::TricryptoProxy => CollateralBasket::TricryptoAssetProxy,
            BasketArg::Tricrypto => {
                anyhow::ensure!(
                    !data.second_asset.is_empty(),
                    "--collateral tricrypto needs --second-asset files"
                );
                CollateralBasket::Tricrypto {
                    second_asset: load_price_files(&data.second_asset)?,
                }
            }
        };
        CollateralSource::Basket(basket)
    };

    info!("📊 Loading prices from {} file(s)", data.prices.len());
    let loader = CsvDataLoader::from_files(&data.prices, source)?;

    if let Some((data_start, data_end)) = loader.available_range() {
        info!(
            "   Data range: {} to {} ({} rows)",
            data_start.format("%Y-%m-%d %H:%M"),
            data_end.format("%Y-%m-%d %H:%M"),
            loader.len()
        );
    }

    Ok(loader)
}

/// Resolve the requested period, defaulting to the loaded data range.
fn resolve_period(
    data: &DataArgs,
    loader: &CsvDataLoader,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (data_start, data_end) = loader
        .available_range()
        .context("No data loaded")?;

    let start = match &data.start {
        Some(s) => parse_date(s)?.and_time(NaiveTime::MIN).and_utc(),
        None => data_start,
    };
    let end = match &data.end {
        Some(s) => parse_date(s)?
            .and_hms_opt(23, 59, 59)
            .context("Invalid end of day")?
            .and_utc(),
        None => data_end,
    };

    anyhow::ensure!(start <= end, "Start {} is after end {}", start, end);
    Ok((start, end))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Run a single backtest.
fn run_backtest(data: &DataArgs, overrides: &StrategyOverrides, output_dir: Option<&str>) -> Result<()> {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║              BACKTEST MODE                                 ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    let mut config = load_config(data)?;
    overrides.apply(&mut config);
    config.validate()?;
    log_config(&config);

    let loader = build_loader(data)?;
    let (start, end) = resolve_period(data, &loader)?;

    let backtest_config = BacktestConfig {
        record_windows: true,
        output_path: output_dir.map(String::from),
    };

    let engine = BacktestEngine::new(loader, config, backtest_config);
    let result = engine.run(start, end)?;

    println!("\n{}", result.summary());

    Ok(())
}

/// Run a parameter sweep optimization.
fn run_sweep(data: &DataArgs, parallelism: usize, output_dir: Option<&str>, minimal: bool) -> Result<()> {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║           PARAMETER SWEEP MODE                             ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    let base_config = load_config(data)?;
    let loader = build_loader(data)?;
    let (start, end) = resolve_period(data, &loader)?;
    let series = loader.load_series(start, end)?;

    let param_space = if minimal {
        info!("🔧 Using minimal parameter space (quick test)");
        ParameterSpace::minimal()
    } else {
        info!("🔧 Using full parameter space");
        ParameterSpace::default()
    };

    info!("   Combinations to test: {}", param_space.combination_count());
    info!("⚡ Parallelism: {}", parallelism);

    // Window rows are dropped to save memory during sweeps
    let backtest_config = BacktestConfig {
        record_windows: false,
        output_path: None,
    };

    let runner = SweepRunner::new(param_space, base_config, backtest_config, parallelism);
    let results = runner.run(&series)?;

    println!("\n{}", results.summary());

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)?;

        let results_path = format!("{}/sweep_results.csv", dir);
        results.to_csv(&results_path)?;
        info!("📁 Sweep results saved to: {}", results_path);
    }

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    let s = &config.strategy;
    let sim = &config.simulation;

    info!("📋 Configuration:");
    info!("   Collateral Deployed: {:.1}%", s.percent_collateral_deployed);
    info!("   Liquidity Concentration: {:.1}x", s.liquidity_concentration);
    info!("   Arb Threshold: {:.2}%", s.arb_threshold);
    info!("   Reset Threshold: {:.2}", s.reset_threshold);
    info!("   Collateral APY: {:.2}%", s.collateral_apy);
    info!("   Window: {} min", s.window_minutes);
    info!("   Fee Rate: {:.3}%", sim.fee_rate * 100.0);
    info!("   Reset Slippage: {:.1}%", sim.reset_slippage * 100.0);
    info!("   Initial Collateral: ${:.0}", sim.initial_collateral_value);
}
