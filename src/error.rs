//! Error taxonomy for the backtest core.
//!
//! Application edges (file loading, config, CLI) use `anyhow`; everything
//! that touches the simulation returns a [`BacktestError`] so callers can
//! tell a bad parameter apart from bad data or a degenerate curve.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    /// A strategy or simulation parameter is outside its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Input price/collateral series are malformed or misaligned.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// A liquidity formula hit a zero denominator or produced a non-finite value.
    #[error("numeric degeneracy in {context}: {detail}")]
    NumericDegenerate { context: &'static str, detail: String },
}

impl BacktestError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(context: &'static str, detail: impl Into<String>) -> Self {
        Self::NumericDegenerate {
            context,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = BacktestError::invalid_parameter("window_minutes", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid parameter `window_minutes`: must be at least 1"
        );

        let err = BacktestError::InvalidSeries("empty price series".to_string());
        assert_eq!(err.to_string(), "invalid series: empty price series");

        let err = BacktestError::degenerate("compute_liquidity", "price at lower tick");
        assert!(err.to_string().contains("compute_liquidity"));
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(BacktestError::InvalidSeries("gap".to_string()))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(err.downcast_ref::<BacktestError>().is_some());
    }
}
