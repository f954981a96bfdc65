pub mod candidate_source;
pub mod market_data;
