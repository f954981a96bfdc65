pub mod fundamentals;
pub mod indicator_engine;
pub mod liquidity;
pub mod momentum;
pub mod ranker;
pub mod score_calculator;
pub mod symbol_policy;

pub use fundamentals::FundamentalsScreen;
pub use indicator_engine::{IndicatorEngine, IndicatorSet, NEUTRAL_RELATIVE_STRENGTH};
pub use liquidity::LiquidityFilter;
pub use momentum::{MomentumScoreCalculator, WeightedMomentumCalculator};
pub use ranker::Ranker;
pub use score_calculator::ScoreCalculator;
pub use symbol_policy::SymbolPolicy;
