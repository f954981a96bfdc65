use std::cmp::Ordering;

use tracing::{debug, info};

use crate::domain::entities::symbol_screening::{
    RankedEntry, RankedList, RankingOutcome, ScoredResult,
};

/// Orders scored symbols and keeps the top `top_n`.
#[derive(Debug, Clone)]
pub struct Ranker {
    pub top_n: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Ranker { top_n: 10 }
    }
}

impl Ranker {
    pub fn new(top_n: usize) -> Self {
        Ranker { top_n }
    }

    /// Drops invalid scores, sorts by score descending and assigns dense ranks
    /// starting at 1. The sort is stable: equal scores keep their input order.
    pub fn rank(&self, results: Vec<ScoredResult>) -> RankingOutcome {
        if results.is_empty() {
            debug!("Nothing to rank");
            return RankingOutcome::NoResults;
        }

        let input_count = results.len();
        let mut valid: Vec<ScoredResult> =
            results.into_iter().filter(|r| r.has_valid_score()).collect();
        if valid.is_empty() {
            debug!(input_count, "Every result carried an invalid score");
            return RankingOutcome::AllFilteredOut;
        }

        valid.sort_by(|a, b| {
            b.momentum_score
                .partial_cmp(&a.momentum_score)
                .unwrap_or(Ordering::Equal)
        });

        let total_ranked = valid.len();
        let entries: Vec<RankedEntry> = valid
            .into_iter()
            .take(self.top_n)
            .enumerate()
            .map(|(i, result)| RankedEntry { rank: i + 1, result })
            .collect();

        for entry in &entries {
            debug!(
                rank = entry.rank,
                symbol = %entry.result.symbol,
                momentum_score = entry.result.momentum_score,
                "Ranked symbol"
            );
        }

        info!(
            input_count,
            total_ranked,
            shown = entries.len(),
            "Ranking complete"
        );

        RankingOutcome::Ranked(RankedList::new(entries, total_ranked))
    }
}
