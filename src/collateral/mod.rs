//! Collateral basket valuation.
//!
//! Builds a collateral value series aligned with the risk-asset price
//! series. Only the ratio between consecutive values matters to the
//! backtest, so every basket starts from a notional 100 USD.

use crate::backtest::{CollateralPoint, PricePoint};
use crate::error::BacktestError;

/// Notional starting value of every basket.
pub const INITIAL_BASKET_USD: f64 = 100.0;

/// Supported collateral baskets.
#[derive(Debug, Clone, PartialEq)]
pub enum CollateralBasket {
    /// Plain stablecoin collateral, constant value
    Usd,
    /// 50% cash, 50% risk asset (GLP-style)
    HalfAsset,
    /// Equal-weight geometric basket of cash, the risk asset and a second asset
    Tricrypto { second_asset: Vec<PricePoint> },
    /// Tricrypto with the second asset proxied by the risk asset
    TricryptoAssetProxy,
}

impl CollateralBasket {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::HalfAsset => "half-asset",
            Self::Tricrypto { .. } => "tricrypto",
            Self::TricryptoAssetProxy => "tricrypto-proxy",
        }
    }
}

/// Value the basket at every point of `prices`.
pub fn build_collateral_series(
    prices: &[PricePoint],
    basket: &CollateralBasket,
) -> Result<Vec<CollateralPoint>, BacktestError> {
    let first = prices
        .first()
        .ok_or_else(|| BacktestError::InvalidSeries("empty price series".to_string()))?;
    if first.price <= 0.0 {
        return Err(BacktestError::InvalidSeries(format!(
            "initial price {} must be positive",
            first.price
        )));
    }

    let initial_units = INITIAL_BASKET_USD / first.price;
    let third = 1.0 / 3.0;

    let points = match basket {
        CollateralBasket::Usd => prices
            .iter()
            .map(|p| CollateralPoint {
                time: p.time,
                value: INITIAL_BASKET_USD,
            })
            .collect(),
        CollateralBasket::HalfAsset => {
            let cash = INITIAL_BASKET_USD * 0.5;
            let units = initial_units * 0.5;
            prices
                .iter()
                .map(|p| CollateralPoint {
                    time: p.time,
                    value: cash + units * p.price,
                })
                .collect()
        }
        CollateralBasket::TricryptoAssetProxy => prices
            .iter()
            .map(|p| CollateralPoint {
                time: p.time,
                value: INITIAL_BASKET_USD.powf(third) * (initial_units * p.price).powf(2.0 * third),
            })
            .collect(),
        CollateralBasket::Tricrypto { second_asset } => {
            if second_asset.len() != prices.len() {
                return Err(BacktestError::InvalidSeries(format!(
                    "second asset has {} points, price series has {}",
                    second_asset.len(),
                    prices.len()
                )));
            }
            let second_first = second_asset[0].price;
            if second_first <= 0.0 {
                return Err(BacktestError::InvalidSeries(format!(
                    "initial second asset price {} must be positive",
                    second_first
                )));
            }
            let second_units = INITIAL_BASKET_USD / second_first;

            prices
                .iter()
                .zip(second_asset)
                .map(|(p, s)| {
                    if p.time != s.time {
                        return Err(BacktestError::InvalidSeries(format!(
                            "second asset time {} does not match price time {}",
                            s.time, p.time
                        )));
                    }
                    Ok(CollateralPoint {
                        time: p.time,
                        value: INITIAL_BASKET_USD.powf(third)
                            * (initial_units * p.price).powf(third)
                            * (second_units * s.price).powf(third),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()
    }

    fn series(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                time: t0() + Duration::minutes(i as i64),
                price,
            })
            .collect()
    }

    #[test]
    fn test_usd_basket_is_constant() {
        let points = build_collateral_series(&series(&[2_000.0, 2_500.0]), &CollateralBasket::Usd)
            .unwrap();
        assert!(points.iter().all(|p| p.value == INITIAL_BASKET_USD));
        assert_eq!(points[1].time, t0() + Duration::minutes(1));
    }

    #[test]
    fn test_half_asset_basket() {
        let points =
            build_collateral_series(&series(&[2_000.0, 3_000.0]), &CollateralBasket::HalfAsset)
                .unwrap();
        assert!((points[0].value - 100.0).abs() < 1e-9);
        // Asset leg +50% -> basket +25%
        assert!((points[1].value - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_tricrypto_baskets() {
        let prices = series(&[2_000.0, 4_000.0]);
        let second = series(&[40_000.0, 40_000.0]);

        let points = build_collateral_series(
            &prices,
            &CollateralBasket::Tricrypto {
                second_asset: second,
            },
        )
        .unwrap();
        assert!((points[0].value - 100.0).abs() < 1e-9);
        assert!((points[1].value - 100.0 * 2f64.powf(1.0 / 3.0)).abs() < 1e-9);

        let proxy =
            build_collateral_series(&prices, &CollateralBasket::TricryptoAssetProxy).unwrap();
        assert!((proxy[1].value - 100.0 * 2f64.powf(2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_tricrypto_rejects_misaligned_second_asset() {
        let prices = series(&[2_000.0, 2_100.0]);
        let short = series(&[40_000.0]);
        let result = build_collateral_series(
            &prices,
            &CollateralBasket::Tricrypto {
                second_asset: short,
            },
        );
        assert!(matches!(result, Err(BacktestError::InvalidSeries(_))));

        let mut shifted = series(&[40_000.0, 41_000.0]);
        shifted[1].time = shifted[1].time + Duration::minutes(5);
        let result = build_collateral_series(
            &prices,
            &CollateralBasket::Tricrypto {
                second_asset: shifted,
            },
        );
        assert!(matches!(result, Err(BacktestError::InvalidSeries(_))));
    }

    #[test]
    fn test_empty_prices_rejected() {
        let result = build_collateral_series(&[], &CollateralBasket::Usd);
        assert!(result.is_err());
    }
}
