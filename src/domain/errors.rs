use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to an external data collaborator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data returned for {0}")]
    NoData(String),

    #[error("Malformed data: {0}")]
    Malformed(#[from] ValidationError),
}

impl FetchError {
    /// Whether the failure may clear up on its own and is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Timeout { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout { timeout_ms: 0 }
        } else if e.is_decode() {
            FetchError::InvalidResponse(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Bars out of order: {next} follows {previous}")]
    OutOfOrder { previous: NaiveDate, next: NaiveDate },

    #[error("Duplicate bar for {0}")]
    DuplicateDate(NaiveDate),

    #[error("Value must be non-negative")]
    MustBeNonNegative,

    #[error("Value must be finite")]
    MustBeFinite,
}

/// Run-fatal failures of the candidate source. Anything else is contained per
/// symbol.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("No data obtained from candidate source {screen}")]
    Unavailable { screen: String },

    #[error("{expected} column not found in candidate data. Available columns: {available:?}")]
    SchemaMismatch {
        expected: String,
        available: Vec<String>,
    },
}

/// Why a candidate ended in the Skipped state instead of Scored.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("excluded by symbol policy ({rule})")]
    Excluded { rule: String },

    #[error("insufficient history: need {required}, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("average volume {average_volume:.0} below threshold {threshold:.0}")]
    BelowLiquidity { average_volume: f64, threshold: f64 },

    #[error("fetch failed: {message}")]
    FetchFailed { message: String },

    #[error("malformed data: {message}")]
    MalformedData { message: String },

    #[error("fundamentals screen rejected {field}")]
    FundamentalsRejected { field: String },

    #[error("run cancelled before symbol started")]
    Cancelled,
}

impl SkipReason {
    /// Stable label used when summarising skips.
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::Excluded { .. } => "excluded",
            SkipReason::InsufficientHistory { .. } => "insufficient_history",
            SkipReason::BelowLiquidity { .. } => "below_liquidity",
            SkipReason::FetchFailed { .. } => "fetch_failed",
            SkipReason::MalformedData { .. } => "malformed_data",
            SkipReason::FundamentalsRejected { .. } => "fundamentals_rejected",
            SkipReason::Cancelled => "cancelled",
        }
    }

    /// Skips caused by the data itself rather than by a collaborator failure
    /// or by policy.
    pub fn is_data_issue(&self) -> bool {
        matches!(
            self,
            SkipReason::InsufficientHistory { .. } | SkipReason::MalformedData { .. }
        )
    }
}

impl From<FetchError> for SkipReason {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Malformed(inner) => inner.into(),
            other => SkipReason::FetchFailed {
                message: other.to_string(),
            },
        }
    }
}

impl From<ValidationError> for SkipReason {
    fn from(e: ValidationError) -> Self {
        SkipReason::MalformedData {
            message: e.to_string(),
        }
    }
}
