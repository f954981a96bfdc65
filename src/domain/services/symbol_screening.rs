//! Momentum Screening Service
//!
//! Drives one screening run end to end: candidate table, benchmark history,
//! per-symbol indicators, liquidity gate, scoring and ranking. Market data
//! and candidates come in through the repository traits so the whole run can
//! be exercised against in-memory fakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::entities::candidate::CandidateRecord;
use crate::domain::entities::price_series::{IndexSeries, Interval, LookbackPeriod};
use crate::domain::entities::symbol_screening::{RankingOutcome, ScoredResult};
use crate::domain::errors::{SkipReason, SourceError};
use crate::domain::repositories::candidate_source::CandidateSource;
use crate::domain::repositories::market_data::MarketDataProvider;
use crate::domain::services::screening::{
    FundamentalsScreen, IndicatorEngine, LiquidityFilter, Ranker, ScoreCalculator, SymbolPolicy,
};
use crate::task_runner::{run_with_retry, RetryConfig};

/// Sector label used when the provider has none for a symbol
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Run-level settings that are not owned by one of the screening stages
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub screen: String,
    pub max_pages: u32,
    pub index_identifier: String,
    pub lookback: LookbackPeriod,
    pub interval: Interval,
    pub max_concurrent_fetches: usize,
    pub retry: RetryConfig,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            screen: String::new(),
            max_pages: 20,
            index_identifier: "^NSEI".to_string(),
            lookback: LookbackPeriod::weeks(16),
            interval: Interval::Daily,
            max_concurrent_fetches: 4,
            retry: RetryConfig::default(),
        }
    }
}

/// Cooperative cancellation for a run in flight. Symbols whose evaluation has
/// not started when the handle trips are reported as cancelled.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// What happened to one candidate
#[derive(Debug, Clone)]
pub enum ScreeningOutcome {
    Scored(ScoredResult),
    Skipped(SkippedSymbol),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Everything a run produced, in candidate order where order applies
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub outcome: RankingOutcome,
    pub candidates: usize,
    pub scored: usize,
    pub skipped: Vec<SkippedSymbol>,
    pub index_available: bool,
}

impl PipelineReport {
    /// Skip counts keyed by [`SkipReason::category`], sorted by category
    pub fn skip_summary(&self) -> Vec<(&'static str, usize)> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for skipped in &self.skipped {
            *counts.entry(skipped.reason.category()).or_insert(0) += 1;
        }
        let mut summary: Vec<_> = counts.into_iter().collect();
        summary.sort_by(|a, b| a.0.cmp(b.0));
        summary
    }
}

/// Classification lookup statistics
#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Orchestrates a weekly momentum screening run
pub struct MomentumScreeningService<C, M> {
    candidates: C,
    market_data: M,
    settings: RunSettings,
    policy: SymbolPolicy,
    fundamentals: FundamentalsScreen,
    engine: IndicatorEngine,
    liquidity: LiquidityFilter,
    scorer: ScoreCalculator,
    ranker: Ranker,
    abort: AbortHandle,
    sectors: Arc<RwLock<HashMap<String, String>>>,
    stats: Arc<RwLock<CacheStats>>,
}

impl<C: CandidateSource, M: MarketDataProvider> MomentumScreeningService<C, M> {
    /// Service with default stages; swap them with the `with_*` builders.
    pub fn new(candidates: C, market_data: M, settings: RunSettings) -> Self {
        MomentumScreeningService {
            candidates,
            market_data,
            settings,
            policy: SymbolPolicy::default(),
            fundamentals: FundamentalsScreen::default(),
            engine: IndicatorEngine::default(),
            liquidity: LiquidityFilter::default(),
            scorer: ScoreCalculator::default(),
            ranker: Ranker::default(),
            abort: AbortHandle::new(),
            sectors: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
        }
    }

    pub fn with_policy(mut self, policy: SymbolPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: FundamentalsScreen) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn with_engine(mut self, engine: IndicatorEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_liquidity(mut self, liquidity: LiquidityFilter) -> Self {
        self.liquidity = liquidity;
        self
    }

    pub fn with_scorer(mut self, scorer: ScoreCalculator) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Runs the whole pipeline once.
    ///
    /// Only a candidate source that yields nothing usable aborts the run.
    /// Every per-symbol problem ends up in [`PipelineReport::skipped`].
    pub async fn run(&self) -> Result<PipelineReport, SourceError> {
        info!(
            screen = %self.settings.screen,
            max_pages = self.settings.max_pages,
            provider = %self.market_data.name(),
            "Starting momentum screening run"
        );

        let table = self
            .candidates
            .fetch(&self.settings.screen, self.settings.max_pages)
            .await;
        if table.is_empty() {
            return Err(SourceError::Unavailable {
                screen: self.settings.screen.clone(),
            });
        }
        let records = table.records()?;
        info!(candidates = records.len(), "Candidate table loaded");
        if self.fundamentals.is_enabled() {
            info!(
                min_qtr_sales_var_pct = ?self.fundamentals.min_qtr_sales_var_pct,
                min_qtr_profit_var_pct = ?self.fundamentals.min_qtr_profit_var_pct,
                "Fundamentals screen enabled"
            );
        }

        let index = self.fetch_index().await;
        let index_available = index.is_some();

        let outcomes: Vec<ScreeningOutcome> = stream::iter(records.iter())
            .map(|record| self.screen_candidate(record, index.as_ref()))
            .buffered(self.settings.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut scored = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                ScreeningOutcome::Scored(result) => scored.push(result),
                ScreeningOutcome::Skipped(skip) => skipped.push(skip),
            }
        }

        let scored_count = scored.len();
        // Candidates existed but none survived: filtered out, not empty.
        let outcome = if scored.is_empty() && !records.is_empty() {
            RankingOutcome::AllFilteredOut
        } else {
            self.ranker.rank(scored)
        };
        let report = PipelineReport {
            outcome,
            candidates: records.len(),
            scored: scored_count,
            skipped,
            index_available,
        };

        for (category, count) in report.skip_summary() {
            info!(category, count, "Skipped symbols");
        }
        let stats = self.get_cache_stats().await;
        info!(
            candidates = report.candidates,
            scored = report.scored,
            skipped = report.skipped.len(),
            index_available,
            sector_cache_hit_rate = format!("{:.2}%", stats.hit_rate()),
            "Completed momentum screening run"
        );

        Ok(report)
    }

    /// Benchmark history, or `None` when it cannot be had. Relative strength
    /// then falls back to neutral for every symbol.
    async fn fetch_index(&self) -> Option<IndexSeries> {
        let identifier = self.settings.index_identifier.as_str();
        let task_name = format!("fetch index {}", identifier);
        let result = run_with_retry(&task_name, &self.settings.retry, || {
            self.market_data.fetch_index_series(
                identifier,
                self.settings.lookback,
                self.settings.interval,
            )
        })
        .await;

        match result {
            Ok(series) => {
                debug!(index = %identifier, bars = series.len(), "Index history loaded");
                Some(series)
            }
            Err(e) => {
                warn!(
                    index = %identifier,
                    error = %e,
                    "Index history unavailable, relative strength will be neutral"
                );
                None
            }
        }
    }

    /// Screens one candidate. Never fails: every problem becomes a skip.
    pub async fn screen_candidate(
        &self,
        record: &CandidateRecord,
        index: Option<&IndexSeries>,
    ) -> ScreeningOutcome {
        let identifier = self.policy.normalize(&record.symbol);
        let symbol = self.policy.display_symbol(&identifier).to_string();

        match self.evaluate(record, &identifier, &symbol, index).await {
            Ok(result) => ScreeningOutcome::Scored(result),
            Err(reason) => {
                if reason.is_data_issue() {
                    warn!(symbol = %symbol, reason = %reason, "Skipping symbol with unusable data");
                } else {
                    debug!(symbol = %symbol, reason = %reason, "Skipping symbol");
                }
                ScreeningOutcome::Skipped(SkippedSymbol { symbol, reason })
            }
        }
    }

    async fn evaluate(
        &self,
        record: &CandidateRecord,
        identifier: &str,
        symbol: &str,
        index: Option<&IndexSeries>,
    ) -> Result<ScoredResult, SkipReason> {
        if self.abort.is_aborted() {
            return Err(SkipReason::Cancelled);
        }
        self.policy.check(identifier)?;
        self.fundamentals.check(record)?;

        let task_name = format!("fetch history {}", identifier);
        let series = run_with_retry(&task_name, &self.settings.retry, || {
            self.market_data.fetch_series(
                identifier,
                self.settings.lookback,
                self.settings.interval,
            )
        })
        .await?;

        let indicators = self.engine.compute(&series, index)?;
        self.liquidity.check(&indicators)?;

        let sector = self.classification(identifier).await;
        self.scorer.score(symbol, &sector, &indicators)
    }

    /// Sector label, cached per identifier. Lookup failures degrade to
    /// [`UNKNOWN_SECTOR`] and are not cached.
    async fn classification(&self, identifier: &str) -> String {
        {
            let cache = self.sectors.read().await;
            if let Some(sector) = cache.get(identifier) {
                self.stats.write().await.hits += 1;
                return sector.clone();
            }
        }
        self.stats.write().await.misses += 1;

        let task_name = format!("fetch classification {}", identifier);
        let result = run_with_retry(&task_name, &self.settings.retry, || {
            self.market_data.fetch_classification(identifier)
        })
        .await;

        match result {
            Ok(sector) if !sector.trim().is_empty() => {
                let mut cache = self.sectors.write().await;
                cache.insert(identifier.to_string(), sector.clone());
                sector
            }
            Ok(_) => UNKNOWN_SECTOR.to_string(),
            Err(e) => {
                debug!(identifier = %identifier, error = %e, "Classification unavailable");
                UNKNOWN_SECTOR.to_string()
            }
        }
    }

    /// Get classification cache statistics
    pub async fn get_cache_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}
