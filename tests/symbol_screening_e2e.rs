use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use weekly_momentum::application::report;
use weekly_momentum::domain::entities::candidate::CandidateTable;
use weekly_momentum::domain::entities::price_series::{
    Interval, LookbackPeriod, PriceBar, PriceSeries,
};
use weekly_momentum::domain::entities::symbol_screening::RankingOutcome;
use weekly_momentum::domain::errors::{FetchError, SkipReason, SourceError};
use weekly_momentum::domain::repositories::candidate_source::{
    CandidateSource, PaginatedCandidateSource, ScreenPageSource,
};
use weekly_momentum::domain::repositories::market_data::{FetchResult, MarketDataProvider};
use weekly_momentum::domain::services::screening::Ranker;
use weekly_momentum::domain::services::symbol_screening::{MomentumScreeningService, RunSettings};
use weekly_momentum::task_runner::RetryConfig;

const INDEX: &str = "^NSEI";

fn linear_series(identifier: &str, bars: usize, slope: f64, volume: f64) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let bars = (0..bars)
        .map(|i| {
            PriceBar::new(
                start + ChronoDuration::days(i as i64),
                100.0 + slope * i as f64,
                volume,
            )
            .unwrap()
        })
        .collect();
    PriceSeries::new(identifier, bars).unwrap()
}

enum Behavior {
    Series(PriceSeries),
    Fail(FetchError),
    /// Fails with a network error `remaining` more times, then serves the series
    Flaky {
        remaining: AtomicU32,
        series: PriceSeries,
    },
    Slow(Duration),
}

#[derive(Default)]
struct ScriptedMarketData {
    behaviors: HashMap<String, Behavior>,
    sectors: HashMap<String, String>,
}

impl ScriptedMarketData {
    fn with(mut self, identifier: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(identifier.to_string(), behavior);
        self
    }

    fn with_sector(mut self, identifier: &str, sector: &str) -> Self {
        self.sectors
            .insert(identifier.to_string(), sector.to_string());
        self
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedMarketData {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_series(
        &self,
        identifier: &str,
        _lookback: LookbackPeriod,
        _interval: Interval,
    ) -> FetchResult<PriceSeries> {
        match self.behaviors.get(identifier) {
            Some(Behavior::Series(series)) => Ok(series.clone()),
            Some(Behavior::Fail(e)) => Err(e.clone()),
            Some(Behavior::Flaky { remaining, series }) => {
                if remaining.load(Ordering::SeqCst) > 0 {
                    remaining.fetch_sub(1, Ordering::SeqCst);
                    Err(FetchError::Network("connection reset".to_string()))
                } else {
                    Ok(series.clone())
                }
            }
            Some(Behavior::Slow(delay)) => {
                tokio::time::sleep(*delay).await;
                Err(FetchError::NoData(identifier.to_string()))
            }
            None => Err(FetchError::InvalidIdentifier(identifier.to_string())),
        }
    }

    async fn fetch_classification(&self, identifier: &str) -> FetchResult<String> {
        self.sectors
            .get(identifier)
            .cloned()
            .ok_or_else(|| FetchError::NoData(identifier.to_string()))
    }
}

struct StaticCandidates {
    table: CandidateTable,
}

impl StaticCandidates {
    fn symbols(symbols: &[&str]) -> Self {
        let mut table = CandidateTable::new(vec![
            "S.No.".to_string(),
            "Symbol".to_string(),
            "Qtr Sales Var %".to_string(),
        ]);
        for (i, symbol) in symbols.iter().enumerate() {
            table
                .rows
                .push(vec![format!("{}.", i + 1), symbol.to_string(), "12.5".to_string()]);
        }
        StaticCandidates { table }
    }
}

#[async_trait]
impl CandidateSource for StaticCandidates {
    async fn fetch(&self, _screen: &str, _max_pages: u32) -> CandidateTable {
        self.table.clone()
    }
}

fn settings() -> RunSettings {
    RunSettings {
        screen: "https://www.screener.in/screens/1/test/".to_string(),
        retry: RetryConfig {
            max_attempts: 3,
            initial_retry_delay: Duration::from_millis(5),
            max_retry_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_millis(500),
        },
        ..RunSettings::default()
    }
}

#[tokio::test]
async fn test_end_to_end_mixed_candidates_yield_one_result() {
    let market_data = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 80, 0.5, 0.0)))
        .with(
            "SHORT.NS",
            Behavior::Series(linear_series("SHORT.NS", 30, 1.0, 1_000_000.0)),
        )
        .with(
            "GONE.NS",
            Behavior::Fail(FetchError::InvalidIdentifier("GONE.NS".to_string())),
        )
        .with(
            "RELIANCE.NS",
            Behavior::Series(linear_series("RELIANCE.NS", 75, 1.0, 2_000_000.0)),
        )
        .with_sector("RELIANCE.NS", "Energy");

    let service = MomentumScreeningService::new(
        StaticCandidates::symbols(&["SHORT", "GONE", "RELIANCE"]),
        market_data,
        settings(),
    );

    let run = service.run().await.unwrap();
    assert_eq!(run.scored, 1, "Exactly one symbol should survive");
    let ranked = run.outcome.ranked().expect("one ranked entry");
    assert_eq!(ranked.len(), 1);

    let entry = &ranked.entries()[0];
    assert_eq!(entry.rank, 1);
    assert_eq!(entry.result.symbol, "RELIANCE");
    assert_eq!(entry.result.sector, "Energy");
    assert!(entry.result.catalyst.starts_with("Energy, 52-wk breakout: true, RSI: 100.0"));
    assert!(entry.result.momentum_score.is_finite());

    let skipped: Vec<(&str, &str)> = run
        .skipped
        .iter()
        .map(|s| (s.symbol.as_str(), s.reason.category()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("SHORT", "insufficient_history"),
            ("GONE", "fetch_failed")
        ]
    );
}

#[tokio::test]
async fn test_end_to_end_index_failure_uses_neutral_relative_strength() {
    let series = linear_series("AAA.NS", 70, 1.0, 1_000_000.0);

    let without_index = ScriptedMarketData::default()
        .with(INDEX, Behavior::Fail(FetchError::NoData(INDEX.to_string())))
        .with("AAA.NS", Behavior::Series(series.clone()));
    // An index that moved exactly like the symbol gives a relative strength of 1 too.
    let matching_index = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 70, 1.0, 0.0)))
        .with("AAA.NS", Behavior::Series(series));

    let degraded = MomentumScreeningService::new(
        StaticCandidates::symbols(&["AAA"]),
        without_index,
        settings(),
    )
    .run()
    .await
    .unwrap();
    let reference = MomentumScreeningService::new(
        StaticCandidates::symbols(&["AAA"]),
        matching_index,
        settings(),
    )
    .run()
    .await
    .unwrap();

    assert!(!degraded.index_available);
    assert!(reference.index_available);
    assert!(degraded.skipped.is_empty());

    let degraded_score = degraded.outcome.ranked().unwrap().entries()[0]
        .result
        .momentum_score;
    let reference_score = reference.outcome.ranked().unwrap().entries()[0]
        .result
        .momentum_score;
    assert!((degraded_score - reference_score).abs() < 1e-9);
    // Unknown sector when the classification lookup fails
    assert_eq!(
        degraded.outcome.ranked().unwrap().entries()[0].result.sector,
        "Unknown"
    );
}

#[tokio::test]
async fn test_end_to_end_ranking_order_ties_and_truncation() {
    let market_data = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 70, 0.5, 0.0)))
        .with(
            "SLOW.NS",
            Behavior::Series(linear_series("SLOW.NS", 70, 0.2, 900_000.0)),
        )
        .with(
            "TWINA.NS",
            Behavior::Series(linear_series("TWINA.NS", 70, 1.0, 900_000.0)),
        )
        .with(
            "TWINB.NS",
            Behavior::Series(linear_series("TWINB.NS", 70, 1.0, 900_000.0)),
        )
        .with(
            "FAST.NS",
            Behavior::Series(linear_series("FAST.NS", 70, 3.0, 900_000.0)),
        );

    let service = MomentumScreeningService::new(
        StaticCandidates::symbols(&["SLOW", "TWINA", "TWINB", "FAST"]),
        market_data,
        settings(),
    )
    .with_ranker(Ranker::new(3));

    let run = service.run().await.unwrap();
    let ranked = run.outcome.ranked().unwrap();
    assert_eq!(ranked.symbols(), vec!["FAST", "TWINA", "TWINB"]);
    assert_eq!(ranked.total_ranked(), 4);
    let ranks: Vec<usize> = ranked.entries().iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let text = report::render_text(&run.outcome, 3);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "****Top 3 Momentum Stocks for next week****");
    assert!(lines[1].starts_with("1. FAST : "));
    assert!(lines[2].starts_with("2. TWINA : "));
    assert!(lines[3].starts_with("3. TWINB : "));
}

#[tokio::test]
async fn test_end_to_end_all_candidates_filtered() {
    let market_data = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 70, 0.5, 0.0)))
        .with(
            "THIN.NS",
            Behavior::Series(linear_series("THIN.NS", 70, 1.0, 499_999.0)),
        );

    let run = MomentumScreeningService::new(
        StaticCandidates::symbols(&["THIN", "M&M", "TATA CONSOLIDATED"]),
        market_data,
        settings(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(run.outcome, RankingOutcome::AllFilteredOut);
    assert_eq!(
        report::render_text(&run.outcome, 10),
        "No valid stocks found after filtering."
    );
    assert_eq!(
        run.skip_summary(),
        vec![("below_liquidity", 1), ("excluded", 2)]
    );
}

#[tokio::test]
async fn test_end_to_end_transient_failures_are_retried() {
    let market_data = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 70, 0.5, 0.0)))
        .with(
            "FLAKY.NS",
            Behavior::Flaky {
                remaining: AtomicU32::new(2),
                series: linear_series("FLAKY.NS", 70, 1.0, 1_000_000.0),
            },
        )
        .with("STUCK.NS", Behavior::Slow(Duration::from_secs(5)));

    let run = MomentumScreeningService::new(
        StaticCandidates::symbols(&["FLAKY", "STUCK"]),
        market_data,
        RunSettings {
            retry: RetryConfig {
                max_attempts: 3,
                initial_retry_delay: Duration::from_millis(5),
                max_retry_delay: Duration::from_millis(10),
                attempt_timeout: Duration::from_millis(50),
            },
            ..settings()
        },
    )
    .run()
    .await
    .unwrap();

    assert_eq!(run.outcome.ranked().unwrap().symbols(), vec!["FLAKY"]);
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].symbol, "STUCK");
    match &run.skipped[0].reason {
        SkipReason::FetchFailed { message } => assert!(message.contains("Timed out")),
        other => panic!("expected FetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_end_to_end_source_failures_are_fatal() {
    let empty = MomentumScreeningService::new(
        StaticCandidates::symbols(&[]),
        ScriptedMarketData::default(),
        settings(),
    );
    let err = empty.run().await.unwrap_err();
    assert!(matches!(err, SourceError::Unavailable { .. }));
    assert_eq!(
        report::source_error_message(&err),
        "No data obtained from candidate source."
    );

    let mut table = CandidateTable::new(vec!["S.No.".to_string(), "Name".to_string()]);
    table.rows.push(vec!["1.".to_string(), "Tata Motors".to_string()]);
    let wrong_schema = MomentumScreeningService::new(
        StaticCandidates { table },
        ScriptedMarketData::default(),
        settings(),
    );
    match wrong_schema.run().await {
        Err(SourceError::SchemaMismatch {
            expected,
            available,
        }) => {
            assert_eq!(expected, "Symbol");
            assert_eq!(available, vec!["S.No.", "Name"]);
        }
        other => panic!("expected SchemaMismatch, got {:?}", other.map(|r| r.scored)),
    }
}

/// Serves `pages[n - 1]` symbols for page n; `None` is a failed request.
struct ScriptedPages {
    pages: Vec<Option<Vec<&'static str>>>,
}

#[async_trait]
impl ScreenPageSource for ScriptedPages {
    async fn fetch_page(
        &self,
        _screen: &str,
        page: u32,
    ) -> Result<Option<CandidateTable>, FetchError> {
        match self.pages.get(page as usize - 1) {
            Some(Some(symbols)) => Ok(Some(StaticCandidates::symbols(symbols).table)),
            Some(None) => Err(FetchError::Network("connection reset".to_string())),
            None => Ok(None),
        }
    }
}

#[tokio::test]
async fn test_end_to_end_partial_pagination_keeps_fetched_rows() {
    let pages = ScriptedPages {
        pages: vec![Some(vec!["AAA", "BBB"]), None, Some(vec!["CCC"])],
    };
    let market_data = ScriptedMarketData::default()
        .with(INDEX, Behavior::Series(linear_series(INDEX, 70, 0.5, 0.0)))
        .with(
            "AAA.NS",
            Behavior::Series(linear_series("AAA.NS", 70, 1.0, 1_000_000.0)),
        )
        .with(
            "BBB.NS",
            Behavior::Series(linear_series("BBB.NS", 70, 2.0, 1_000_000.0)),
        );

    let run = MomentumScreeningService::new(
        PaginatedCandidateSource::new(pages, 2),
        market_data,
        settings(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(run.candidates, 2);
    assert_eq!(run.outcome.ranked().unwrap().symbols(), vec!["BBB", "AAA"]);
}
