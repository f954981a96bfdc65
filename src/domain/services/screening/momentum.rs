use super::indicator_engine::IndicatorSet;

/// Turns an indicator set into a single comparable momentum score.
pub trait MomentumScoreCalculator: Send + Sync {
    fn calculate(&self, indicators: &IndicatorSet) -> f64;
}

/// Fixed linear combination of the weekly indicators:
///
/// `(roc_4w/25 + roc_12w/50 + rsi/50 + (rs - 1)*5 + breakout*2) * 0.4`
#[derive(Debug, Clone)]
pub struct WeightedMomentumCalculator {
    pub roc_4w_divisor: f64,
    pub roc_12w_divisor: f64,
    pub rsi_divisor: f64,
    pub relative_strength_multiplier: f64,
    pub breakout_bonus: f64,
    pub scale: f64,
}

impl Default for WeightedMomentumCalculator {
    fn default() -> Self {
        WeightedMomentumCalculator {
            roc_4w_divisor: 25.0,
            roc_12w_divisor: 50.0,
            rsi_divisor: 50.0,
            relative_strength_multiplier: 5.0,
            breakout_bonus: 2.0,
            scale: 0.4,
        }
    }
}

impl MomentumScoreCalculator for WeightedMomentumCalculator {
    fn calculate(&self, indicators: &IndicatorSet) -> f64 {
        let breakout = if indicators.breakout {
            self.breakout_bonus
        } else {
            0.0
        };

        (indicators.roc_4w / self.roc_4w_divisor
            + indicators.roc_12w / self.roc_12w_divisor
            + indicators.rsi / self.rsi_divisor
            + (indicators.relative_strength - 1.0) * self.relative_strength_multiplier
            + breakout)
            * self.scale
    }
}
