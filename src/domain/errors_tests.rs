use chrono::NaiveDate;

use super::errors::{FetchError, SkipReason, SourceError, ValidationError};

#[test]
fn test_transient_fetch_errors() {
    assert!(FetchError::Network("reset".to_string()).is_transient());
    assert!(FetchError::Timeout { timeout_ms: 100 }.is_transient());
    assert!(!FetchError::InvalidIdentifier("BAD.NS".to_string()).is_transient());
    assert!(!FetchError::NoData("X.NS".to_string()).is_transient());
}

#[test]
fn test_fetch_error_becomes_fetch_failed_skip() {
    let skip: SkipReason = FetchError::NoData("ABC.NS".to_string()).into();
    assert_eq!(skip.category(), "fetch_failed");
    assert!(!skip.is_data_issue());
}

#[test]
fn test_validation_error_becomes_malformed_data_skip() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let skip: SkipReason = ValidationError::DuplicateDate(date).into();
    assert_eq!(skip.category(), "malformed_data");
    assert!(skip.is_data_issue());
    assert_eq!(
        skip.to_string(),
        "malformed data: Duplicate bar for 2024-03-01"
    );
}

#[test]
fn test_schema_mismatch_lists_available_columns() {
    let err = SourceError::SchemaMismatch {
        expected: "Symbol".to_string(),
        available: vec!["Name".to_string(), "P/E".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "Symbol column not found in candidate data. Available columns: [\"Name\", \"P/E\"]"
    );
}

#[test]
fn test_skip_reason_messages() {
    let skip = SkipReason::InsufficientHistory {
        required: 60,
        available: 42,
    };
    assert_eq!(skip.to_string(), "insufficient history: need 60, have 42");

    let skip = SkipReason::BelowLiquidity {
        average_volume: 499_999.0,
        threshold: 500_000.0,
    };
    assert_eq!(
        skip.to_string(),
        "average volume 499999 below threshold 500000"
    );
}

#[test]
fn test_skip_reason_serializes_with_tag() {
    let json = serde_json::to_string(&SkipReason::Cancelled).unwrap();
    assert_eq!(json, "{\"reason\":\"cancelled\"}");
}

#[test]
fn test_malformed_fetch_is_reported_as_data_issue() {
    let skip: SkipReason = FetchError::Malformed(ValidationError::MustBeFinite).into();
    assert_eq!(skip.category(), "malformed_data");
}
