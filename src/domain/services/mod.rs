pub mod indicators;
pub mod screening;
pub mod symbol_screening;
