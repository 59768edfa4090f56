//! Fee estimation from arbitrage flow.
//!
//! The pool only trades when the external price has drifted far enough from
//! the pool price for an arbitrageur to profit. Each such trade sweeps the
//! liquidity between the old and new checkpoint; fees are a fixed share of
//! the USD swept.

use crate::amm::cash_in_range;

/// How checkpoints are emitted for prices that do not trigger a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointMode {
    /// Only trade-triggering prices.
    #[default]
    Sparse,
    /// Repeat the last checkpoint on every non-triggering step.
    Dense,
}

/// Walk `prices` and emit a checkpoint whenever the move from the last
/// checkpoint exceeds `threshold_percent` percent.
pub fn extract_arbitrage_prices<I>(prices: I, threshold_percent: f64, mode: CheckpointMode) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = prices.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut checkpoints = vec![first];
    let mut last = first;

    for price in iter {
        if (price - last).abs() / last * 100.0 > threshold_percent {
            checkpoints.push(price);
            last = price;
        } else if mode == CheckpointMode::Dense {
            checkpoints.push(last);
        }
    }

    checkpoints
}

/// USD fees earned by `liquidity` over an intra-window price path.
pub fn estimate_fees<I>(liquidity: f64, threshold_percent: f64, fee_rate: f64, prices: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let checkpoints = extract_arbitrage_prices(prices, threshold_percent, CheckpointMode::Sparse);

    let usd_traded: f64 = checkpoints
        .windows(2)
        .map(|pair| {
            let low = pair[0].min(pair[1]);
            let high = pair[0].max(pair[1]);
            cash_in_range(liquidity, low, high)
        })
        .sum();

    usd_traded * fee_rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_moves_do_not_trigger() {
        let prices = [2_000.0, 2_001.0, 2_002.0, 2_003.0];
        let checkpoints = extract_arbitrage_prices(prices, 0.2, CheckpointMode::Sparse);
        assert_eq!(checkpoints, vec![2_000.0]);
    }

    #[test]
    fn test_threshold_measured_from_last_checkpoint() {
        // 2000 -> 2003 (0.15%) -> 2005 (0.25% from 2000) -> 2006 (0.05%)
        let prices = [2_000.0, 2_003.0, 2_005.0, 2_006.0];
        let checkpoints = extract_arbitrage_prices(prices, 0.2, CheckpointMode::Sparse);
        assert_eq!(checkpoints, vec![2_000.0, 2_005.0]);
    }

    #[test]
    fn test_dense_mode_repeats_checkpoint() {
        let prices = [2_000.0, 2_003.0, 2_005.0, 2_006.0];
        let checkpoints = extract_arbitrage_prices(prices, 0.2, CheckpointMode::Dense);
        assert_eq!(checkpoints, vec![2_000.0, 2_000.0, 2_005.0, 2_005.0]);
    }

    #[test]
    fn test_empty_and_single_price_paths() {
        assert!(extract_arbitrage_prices(Vec::new(), 0.2, CheckpointMode::Sparse).is_empty());
        assert_eq!(estimate_fees(10_000.0, 0.2, 0.001, Vec::new()), 0.0);
        assert_eq!(estimate_fees(10_000.0, 0.2, 0.001, [2_000.0]), 0.0);
    }

    #[test]
    fn test_fees_sum_over_swept_ranges() {
        let liquidity = 50_000.0;
        let fees = estimate_fees(liquidity, 0.2, 0.001, [2_000.0, 2_200.0, 2_000.0]);

        let one_leg = cash_in_range(liquidity, 2_000.0, 2_200.0);
        assert!((fees - 2.0 * one_leg * 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_flat_path_earns_nothing() {
        let fees = estimate_fees(50_000.0, 0.2, 0.001, vec![2_000.0; 100]);
        assert_eq!(fees, 0.0);
    }

    proptest! {
        #[test]
        fn prop_fees_non_decreasing_in_liquidity(
            path in proptest::collection::vec(1_000.0..3_000.0_f64, 1..50),
            liquidity in 0.0..1e6_f64,
            extra in 0.0..1e6_f64,
        ) {
            let base = estimate_fees(liquidity, 0.2, 0.001, path.iter().copied());
            let more = estimate_fees(liquidity + extra, 0.2, 0.001, path.iter().copied());
            prop_assert!(more >= base);
            prop_assert!(base >= 0.0);
        }
    }
}
