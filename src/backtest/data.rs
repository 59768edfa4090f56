//! Historical data loading for backtesting.
//!
//! Provides the validated in-memory series the engine runs on, plus CSV
//! import with minute gap filling.

use crate::collateral::{build_collateral_series, CollateralBasket};
use crate::error::BacktestError;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Risk-asset price at a minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Collateral basket value at a minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollateralPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Price and collateral series, aligned minute by minute.
///
/// Only constructible through [`MarketSeries::new`], so holding one means
/// the series are non-empty, equally long, share timestamps, advance by
/// exactly one minute and carry strictly positive finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSeries {
    prices: Vec<PricePoint>,
    collateral: Vec<CollateralPoint>,
}

impl MarketSeries {
    pub fn new(
        prices: Vec<PricePoint>,
        collateral: Vec<CollateralPoint>,
    ) -> Result<Self, BacktestError> {
        if prices.is_empty() {
            return Err(BacktestError::InvalidSeries("empty price series".to_string()));
        }
        if prices.len() != collateral.len() {
            return Err(BacktestError::InvalidSeries(format!(
                "price series has {} rows, collateral series has {}",
                prices.len(),
                collateral.len()
            )));
        }

        for (i, (p, c)) in prices.iter().zip(&collateral).enumerate() {
            if p.time != c.time {
                return Err(BacktestError::InvalidSeries(format!(
                    "row {}: price time {} does not match collateral time {}",
                    i, p.time, c.time
                )));
            }
            if !p.price.is_finite() || p.price <= 0.0 {
                return Err(BacktestError::InvalidSeries(format!(
                    "row {}: price {} must be positive",
                    i, p.price
                )));
            }
            if !c.value.is_finite() || c.value <= 0.0 {
                return Err(BacktestError::InvalidSeries(format!(
                    "row {}: collateral value {} must be positive",
                    i, c.value
                )));
            }
        }

        for (i, pair) in prices.windows(2).enumerate() {
            let step = pair[1].time - pair[0].time;
            if step <= Duration::zero() {
                return Err(BacktestError::InvalidSeries(format!(
                    "row {}: timestamps not strictly increasing ({} then {})",
                    i + 1,
                    pair[0].time,
                    pair[1].time
                )));
            }
            if step != Duration::minutes(1) {
                return Err(BacktestError::InvalidSeries(format!(
                    "row {}: expected one-minute spacing, found gap of {}s after {}",
                    i + 1,
                    step.num_seconds(),
                    pair[0].time
                )));
            }
        }

        Ok(Self { prices, collateral })
    }

    pub fn prices(&self) -> &[PricePoint] {
        &self.prices
    }

    pub fn collateral(&self) -> &[CollateralPoint] {
        &self.collateral
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.prices[0].time
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.prices[self.prices.len() - 1].time
    }

    /// Rows whose timestamps fall within `[start, end]`.
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BacktestError> {
        let from = self.prices.partition_point(|p| p.time < start);
        let to = self.prices.partition_point(|p| p.time <= end);

        if from >= to {
            return Err(BacktestError::InvalidSeries(format!(
                "no data between {} and {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )));
        }

        Ok(Self {
            prices: self.prices[from..to].to_vec(),
            collateral: self.collateral[from..to].to_vec(),
        })
    }
}

/// Trait for loading historical market data.
pub trait DataLoader: Send + Sync {
    /// Load the aligned series within the given time range.
    fn load_series(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<MarketSeries>;

    /// Get the available date range in the data.
    fn available_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)>;
}

/// Where the collateral values come from.
#[derive(Debug, Clone)]
pub enum CollateralSource {
    /// Derived from the price series
    Basket(CollateralBasket),
    /// Read from `time,value` CSV files
    Files(Vec<PathBuf>),
}

/// CSV data loader for historical backtesting.
///
/// Expected CSV format (extra columns are ignored):
/// ```csv
/// time,price
/// 2022-01-01 00:00:00,3683.92
/// 2022-01-01 00:01:00,3684.10
/// ```
#[derive(Debug, Clone)]
pub struct CsvDataLoader {
    series: MarketSeries,
}

impl CsvDataLoader {
    /// Wrap an already validated series.
    pub fn new(series: MarketSeries) -> Self {
        Self { series }
    }

    /// Load price files and pair them with a collateral source.
    pub fn from_files<P: AsRef<Path>>(price_paths: &[P], collateral: CollateralSource) -> Result<Self> {
        let prices = load_price_files(price_paths)?;

        let collateral = match collateral {
            CollateralSource::Basket(basket) => {
                info!("Building {} collateral basket", basket.name());
                let basket = match basket {
                    CollateralBasket::Tricrypto { second_asset } => CollateralBasket::Tricrypto {
                        second_asset: clip_to_range(second_asset, &prices, |p| p.time),
                    },
                    other => other,
                };
                build_collateral_series(&prices, &basket)?
            }
            CollateralSource::Files(paths) => {
                let values = load_collateral_files(&paths)?;
                clip_to_range(values, &prices, |c| c.time)
            }
        };

        let series = MarketSeries::new(prices, collateral)?;
        Ok(Self { series })
    }

    /// Get total number of minute rows.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if the loader has no data.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self) -> &MarketSeries {
        &self.series
    }
}

impl DataLoader for CsvDataLoader {
    fn load_series(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<MarketSeries> {
        Ok(self.series.slice(start, end)?)
    }

    fn available_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if self.series.is_empty() {
            return None;
        }
        Some((self.series.start(), self.series.end()))
    }
}

/// Load and merge price files (e.g. one monthly dump each), filling gaps.
pub fn load_price_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PricePoint>> {
    let rows = load_and_merge(paths, "price")?;
    Ok(rows
        .into_iter()
        .map(|(time, price)| PricePoint { time, price })
        .collect())
}

/// Load and merge collateral value files, filling gaps.
pub fn load_collateral_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<CollateralPoint>> {
    let rows = load_and_merge(paths, "value")?;
    Ok(rows
        .into_iter()
        .map(|(time, value)| CollateralPoint { time, value })
        .collect())
}

/// Restrict a secondary series to the time span of the price series.
pub fn clip_to_range<T, F>(points: Vec<T>, prices: &[PricePoint], time_of: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
        return points;
    };
    points
        .into_iter()
        .filter(|p| {
            let t = time_of(p);
            t >= first.time && t <= last.time
        })
        .collect()
}

fn load_and_merge<P: AsRef<Path>>(paths: &[P], column: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    anyhow::ensure!(!paths.is_empty(), "No {} files given", column);

    let mut rows = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let file_rows = read_series_csv(path, column)
            .with_context(|| format!("Failed to load {} data from {}", column, path.display()))?;
        debug!("Loaded {} rows from {}", file_rows.len(), path.display());
        rows.extend(file_rows);
    }

    rows.sort_by_key(|(time, _)| *time);
    if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        anyhow::bail!("Duplicate timestamp {} across {} files", pair[0].0, column);
    }

    let filled = interpolate_missing_minutes(&rows);
    if filled.len() > rows.len() {
        info!(
            "Interpolated {} missing minutes in {} data",
            filled.len() - rows.len(),
            column
        );
    }

    Ok(filled)
}

/// Read a CSV file and return `(time, value)` pairs from the named column.
pub fn read_series_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    series_from_csv_content(&content, column)
}

/// Parse CSV content with a header row containing `time` and `column`.
pub fn series_from_csv_content(content: &str, column: &str) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().context("CSV file is empty")?;
    let headers: Vec<String> = header
        .split(',')
        .map(|h| h.trim().trim_matches('"').to_ascii_lowercase())
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h == "time")
        .context("CSV header has no `time` column")?;
    let value_idx = headers
        .iter()
        .position(|h| h == column)
        .with_context(|| format!("CSV header has no `{}` column", column))?;

    let mut rows = Vec::new();
    for (line_num, line) in lines {
        let parts: Vec<&str> = line.split(',').collect();
        let (Some(time), Some(value)) = (parts.get(time_idx), parts.get(value_idx)) else {
            anyhow::bail!(
                "Line {}: expected at least {} columns, got {}",
                line_num + 1,
                time_idx.max(value_idx) + 1,
                parts.len()
            );
        };

        let time = parse_timestamp(time)
            .with_context(|| format!("Line {}: invalid time: {}", line_num + 1, time))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Line {}: invalid {}: {}", line_num + 1, column, value))?;

        rows.push((time, value));
    }

    anyhow::ensure!(!rows.is_empty(), "CSV file contains no data rows");
    Ok(rows)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim().trim_matches('"');

    if let Ok(time) = raw.parse::<DateTime<Utc>>() {
        return Ok(time);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    anyhow::bail!("unrecognised timestamp format")
}

/// Linearly interpolate values for minutes missing between sorted points.
pub fn interpolate_missing_minutes(points: &[(DateTime<Utc>, f64)]) -> Vec<(DateTime<Utc>, f64)> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };

    let mut filled = Vec::with_capacity(points.len());
    for pair in points.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        filled.push((t0, v0));

        let span = (t1 - t0).num_seconds() as f64;
        let mut t = t0 + Duration::minutes(1);
        while t < t1 {
            let w = (t - t0).num_seconds() as f64 / span;
            filled.push((t, v0 + (v1 - v0) * w));
            t += Duration::minutes(1);
        }
    }
    filled.push(last);

    filled
}
