pub mod candidate;
pub mod price_series;
pub mod symbol_screening;
