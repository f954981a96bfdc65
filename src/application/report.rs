//! Renders a screening run for people and for machines.

use serde::Serialize;

use crate::domain::entities::symbol_screening::{RankedEntry, RankingOutcome};
use crate::domain::errors::SourceError;
use crate::domain::services::symbol_screening::{PipelineReport, SkippedSymbol};

pub const NO_SOURCE_DATA_MESSAGE: &str = "No data obtained from candidate source.";
pub const NO_RESULTS_MESSAGE: &str = "No valid stocks found.";
pub const ALL_FILTERED_MESSAGE: &str = "No valid stocks found after filtering.";

pub fn header(top_n: usize) -> String {
    format!("****Top {} Momentum Stocks for next week****", top_n)
}

/// `<rank>. <symbol> : <score>`
pub fn format_entry(entry: &RankedEntry) -> String {
    format!(
        "{}. {} : {:.2}",
        entry.rank,
        entry.result.symbol,
        entry.result.display_score()
    )
}

/// Plain-text ranking, one line per entry after the header
pub fn render_text(outcome: &RankingOutcome, top_n: usize) -> String {
    match outcome {
        RankingOutcome::Ranked(list) => {
            let mut lines = Vec::with_capacity(list.len() + 1);
            lines.push(header(top_n));
            lines.extend(list.entries().iter().map(format_entry));
            lines.join("\n")
        }
        RankingOutcome::NoResults => NO_RESULTS_MESSAGE.to_string(),
        RankingOutcome::AllFilteredOut => ALL_FILTERED_MESSAGE.to_string(),
    }
}

/// User-facing message for a run-fatal source problem
pub fn source_error_message(error: &SourceError) -> String {
    match error {
        SourceError::Unavailable { .. } => NO_SOURCE_DATA_MESSAGE.to_string(),
        SourceError::SchemaMismatch { .. } => error.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    outcome: &'a RankingOutcome,
    candidates: usize,
    scored: usize,
    index_available: bool,
    skipped: &'a [SkippedSymbol],
}

/// JSON document with every ranked field and the skip list
pub fn render_json(report: &PipelineReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        outcome: &report.outcome,
        candidates: report.candidates,
        scored: report.scored,
        index_available: report.index_available,
        skipped: &report.skipped,
    })
}
