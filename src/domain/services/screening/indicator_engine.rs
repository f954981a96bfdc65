use tracing::debug;

use crate::domain::entities::price_series::{IndexSeries, PriceSeries};
use crate::domain::errors::SkipReason;
use crate::domain::services::indicators::{
    is_breakout, relative_strength, trailing_mean, Indicator, RateOfChange, RSI,
};

/// Relative strength used when no benchmark is available.
pub const NEUTRAL_RELATIVE_STRENGTH: f64 = 1.0;

/// Bars spanned by the 1-week return.
const ONE_WEEK_BARS: usize = 5;

/// Every indicator of one symbol. Built all-or-nothing by [`IndicatorEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub roc_4w: f64,
    pub roc_12w: f64,
    pub rsi: f64,
    pub relative_strength: f64,
    pub breakout: bool,
    pub avg_volume_4w: f64,
    pub last_close: f64,
    pub one_week_return_pct: f64,
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    pub lookback_4w: usize,
    pub lookback_12w: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        IndicatorEngine {
            lookback_4w: 20,
            lookback_12w: 60,
            rsi_period: 14,
        }
    }
}

impl IndicatorEngine {
    pub fn new(lookback_4w: usize, lookback_12w: usize, rsi_period: usize) -> Self {
        IndicatorEngine {
            lookback_4w,
            lookback_12w,
            rsi_period,
        }
    }

    /// Minimum number of bars for every indicator to be defined.
    pub fn required_history(&self) -> usize {
        self.lookback_12w
            .max(self.lookback_4w)
            .max(self.rsi_period + 1)
            .max(ONE_WEEK_BARS)
    }

    /// Computes the full indicator set, or says why the symbol must be skipped.
    pub fn compute(
        &self,
        series: &PriceSeries,
        index: Option<&IndexSeries>,
    ) -> Result<IndicatorSet, SkipReason> {
        let required = self.required_history();
        if series.len() < required {
            return Err(SkipReason::InsufficientHistory {
                required,
                available: series.len(),
            });
        }

        let closes = series.closes();
        let volumes = series.volumes();
        let malformed = |what: &str| SkipReason::MalformedData {
            message: format!("{} undefined for {}", what, series.symbol()),
        };

        let roc_4w = RateOfChange::new(self.lookback_4w)
            .latest(&closes)
            .ok_or_else(|| malformed("4-week rate of change"))?;
        let roc_12w = RateOfChange::new(self.lookback_12w)
            .latest(&closes)
            .ok_or_else(|| malformed("12-week rate of change"))?;
        let rsi = RSI::new(self.rsi_period)
            .latest(&closes)
            .ok_or_else(|| malformed("RSI"))?;
        let one_week_return_pct = RateOfChange::new(ONE_WEEK_BARS)
            .latest(&closes)
            .ok_or_else(|| malformed("1-week return"))?;
        let avg_volume_4w =
            trailing_mean(&volumes, self.lookback_4w).ok_or_else(|| malformed("average volume"))?;
        let last_close = series.last_close().ok_or_else(|| malformed("last close"))?;

        let rel_strength = match index {
            Some(index) => {
                match relative_strength(&closes, &index.closes(), self.lookback_4w) {
                    Some(rs) => rs,
                    None => {
                        debug!(
                            symbol = %series.symbol(),
                            index = %index.symbol(),
                            index_len = index.len(),
                            "Benchmark too short for window, using neutral relative strength"
                        );
                        NEUTRAL_RELATIVE_STRENGTH
                    }
                }
            }
            None => NEUTRAL_RELATIVE_STRENGTH,
        };

        let set = IndicatorSet {
            roc_4w,
            roc_12w,
            rsi,
            relative_strength: rel_strength,
            breakout: is_breakout(&closes),
            avg_volume_4w,
            last_close,
            one_week_return_pct,
        };

        let values = [
            set.roc_4w,
            set.roc_12w,
            set.rsi,
            set.relative_strength,
            set.avg_volume_4w,
            set.one_week_return_pct,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(malformed("non-finite indicator"));
        }

        debug!(
            symbol = %series.symbol(),
            roc_4w = set.roc_4w,
            roc_12w = set.roc_12w,
            rsi = set.rsi,
            relative_strength = set.relative_strength,
            breakout = set.breakout,
            avg_volume_4w = set.avg_volume_4w,
            "Computed indicators"
        );

        Ok(set)
    }
}
