use chrono::Utc;
use tracing::debug;

use crate::domain::entities::symbol_screening::{round_dp, ScoredResult};
use crate::domain::errors::SkipReason;

use super::indicator_engine::IndicatorSet;
use super::momentum::{MomentumScoreCalculator, WeightedMomentumCalculator};

/// Builds the per-symbol [`ScoredResult`] from its indicators.
pub struct ScoreCalculator {
    momentum: Box<dyn MomentumScoreCalculator>,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        ScoreCalculator::new(Box::new(WeightedMomentumCalculator::default()))
    }
}

impl ScoreCalculator {
    pub fn new(momentum: Box<dyn MomentumScoreCalculator>) -> Self {
        ScoreCalculator { momentum }
    }

    /// Scores one symbol. A non-finite score never leaves this function.
    pub fn score(
        &self,
        symbol: &str,
        sector: &str,
        indicators: &IndicatorSet,
    ) -> Result<ScoredResult, SkipReason> {
        let momentum_score = self.momentum.calculate(indicators);
        if !momentum_score.is_finite() {
            return Err(SkipReason::MalformedData {
                message: format!("momentum score for {} is not finite", symbol),
            });
        }

        let catalyst = format!(
            "{}, 52-wk breakout: {}, RSI: {:.1}",
            sector,
            indicators.breakout,
            round_dp(indicators.rsi, 1)
        );

        debug!(
            symbol = %symbol,
            momentum_score = momentum_score,
            sector = %sector,
            "Scored symbol"
        );

        Ok(ScoredResult {
            symbol: symbol.to_string(),
            current_price: round_dp(indicators.last_close, 2),
            one_week_return_pct: round_dp(indicators.one_week_return_pct, 1),
            sector: sector.to_string(),
            momentum_score,
            roc_4w: round_dp(indicators.roc_4w, 2),
            catalyst,
            screened_at: Utc::now(),
        })
    }
}
