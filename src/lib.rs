//! Weekly Momentum Screening Library
//!
//! Ranks the candidates of a stock screen by a weekly momentum score built
//! from rate of change, RSI, relative strength against a benchmark and a
//! 52-week breakout flag.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod rate_limit;
pub mod task_runner;
