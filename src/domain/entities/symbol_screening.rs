use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rounds half away from zero to `decimals` places.
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Outcome of scoring one symbol. Only the rank is assigned later, by wrapping
/// it in a [`RankedEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Candidate symbol without the provider suffix (e.g. "RELIANCE")
    pub symbol: String,
    /// Last close, rounded to 2 dp
    pub current_price: f64,
    /// Return over the last 5 bars in percent, rounded to 1 dp
    pub one_week_return_pct: f64,
    pub sector: String,
    /// Unrounded momentum score; all comparisons use this value
    pub momentum_score: f64,
    /// 4-week rate of change, rounded to 2 dp
    pub roc_4w: f64,
    pub catalyst: String,
    pub screened_at: DateTime<Utc>,
}

impl ScoredResult {
    /// Score as presented to users.
    pub fn display_score(&self) -> f64 {
        round_dp(self.momentum_score, 2)
    }

    pub fn has_valid_score(&self) -> bool {
        self.momentum_score.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1 = highest score
    pub rank: usize,
    #[serde(flatten)]
    pub result: ScoredResult,
}

/// Ranked output of one run, truncated to the requested size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
    /// Number of entries ranked before truncation
    total_ranked: usize,
}

impl RankedList {
    pub(crate) fn new(entries: Vec<RankedEntry>, total_ranked: usize) -> Self {
        RankedList {
            entries,
            total_ranked,
        }
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_ranked(&self) -> usize {
        self.total_ranked
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.result.symbol.as_str()).collect()
    }
}

/// What the ranker produced. The two empty states are not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "ranking", rename_all = "snake_case")]
pub enum RankingOutcome {
    Ranked(RankedList),
    /// Nothing was scored at all
    NoResults,
    /// Results existed but none carried a valid score
    AllFilteredOut,
}

impl RankingOutcome {
    pub fn ranked(&self) -> Option<&RankedList> {
        match self {
            RankingOutcome::Ranked(list) => Some(list),
            _ => None,
        }
    }
}
