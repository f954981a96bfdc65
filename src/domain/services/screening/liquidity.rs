use crate::domain::errors::SkipReason;

use super::indicator_engine::IndicatorSet;

/// Minimum-average-volume gate. The threshold itself passes.
#[derive(Debug, Clone)]
pub struct LiquidityFilter {
    pub min_volume: f64,
}

impl Default for LiquidityFilter {
    fn default() -> Self {
        LiquidityFilter {
            min_volume: 500_000.0,
        }
    }
}

impl LiquidityFilter {
    pub fn new(min_volume: f64) -> Self {
        LiquidityFilter { min_volume }
    }

    pub fn check(&self, indicators: &IndicatorSet) -> Result<(), SkipReason> {
        if indicators.avg_volume_4w < self.min_volume {
            return Err(SkipReason::BelowLiquidity {
                average_volume: indicators.avg_volume_4w,
                threshold: self.min_volume,
            });
        }
        Ok(())
    }
}
