use std::time::Duration;

use crate::domain::entities::price_series::{Interval, LookbackPeriod};
use crate::domain::services::screening::{
    FundamentalsScreen, IndicatorEngine, LiquidityFilter, Ranker, SymbolPolicy,
};
use crate::rate_limit::RateLimiterConfig;
use crate::task_runner::RetryConfig;

pub const DEFAULT_SCREEN_URL: &str =
    "https://www.screener.in/screens/764718/weekly-rebalancing-query-strategy/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Every knob of a screening run
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    // Candidate source
    pub screen_url: String,
    pub max_pages: u32,
    pub page_size: usize, // Rows on a full page; fewer means last page

    // Indicators
    pub lookback_4w: usize,  // Trading days in 4 weeks
    pub lookback_12w: usize, // Trading days in 12 weeks
    pub rsi_period: usize,
    pub history_weeks: u32, // Calendar weeks of history requested
    pub interval: Interval,
    pub index_symbol: String,

    // Filters
    pub min_volume: f64,
    pub symbol_suffix: String,
    pub excluded_symbols: Vec<String>,
    pub min_qtr_sales_var_pct: Option<f64>,
    pub min_qtr_profit_var_pct: Option<f64>,

    // Output
    pub top_n: usize,
    pub report_format: ReportFormat,

    // Fetching
    pub fetch_timeout_ms: u64,
    pub fetch_max_attempts: u32,
    pub max_concurrent_fetches: usize,
    pub requests_per_minute: u32,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        ScreeningConfig {
            screen_url: DEFAULT_SCREEN_URL.to_string(),
            max_pages: 20,
            page_size: 20,

            lookback_4w: 20,
            lookback_12w: 60,
            rsi_period: 14,
            history_weeks: 16,
            interval: Interval::Daily,
            index_symbol: "^NSEI".to_string(),

            min_volume: 500_000.0,
            symbol_suffix: ".NS".to_string(),
            excluded_symbols: vec!["GVT&D.NS".to_string()],
            min_qtr_sales_var_pct: None,
            min_qtr_profit_var_pct: None,

            top_n: 10,
            report_format: ReportFormat::Text,

            fetch_timeout_ms: 15_000,
            fetch_max_attempts: 3,
            max_concurrent_fetches: 4,
            requests_per_minute: 120,
        }
    }
}

/// Parse an environment variable, keeping `current` when it is absent, does
/// not parse, or fails `valid`.
fn env_override<T, F>(name: &str, current: T, valid: F) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
    F: Fn(&T) -> bool,
{
    let raw = match std::env::var(name) {
        Ok(raw) => raw,
        Err(_) => return current,
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        Ok(value) => {
            tracing::warn!(
                "Invalid {} value: {:?}, using default: {:?}",
                name,
                value,
                current
            );
            current
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse {} '{}': {}, using default: {:?}",
                name,
                raw,
                e,
                current
            );
            current
        }
    }
}

impl ScreeningConfig {
    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> ScreeningConfig {
        let mut config = ScreeningConfig::default();

        if let Ok(url) = std::env::var("SCREENER_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.screen_url = url;
            } else {
                tracing::warn!("Ignoring SCREENER_URL without http(s) scheme: {}", url);
            }
        }

        config.max_pages = env_override("SCREENER_MAX_PAGES", config.max_pages, |v| {
            (1..=100).contains(v)
        });
        config.page_size = env_override("SCREENER_PAGE_SIZE", config.page_size, |v| *v > 0);
        config.lookback_4w = env_override("LOOKBACK_4W", config.lookback_4w, |v| *v > 0);
        config.lookback_12w = env_override("LOOKBACK_12W", config.lookback_12w, |v| *v > 0);
        config.rsi_period = env_override("RSI_PERIOD", config.rsi_period, |v| *v > 0);
        config.history_weeks =
            env_override("HISTORY_WEEKS", config.history_weeks, |v| (1..=520).contains(v));
        config.min_volume = env_override("MIN_VOLUME", config.min_volume, |v| {
            v.is_finite() && *v >= 0.0
        });
        config.top_n = env_override("TOP_N", config.top_n, |v| *v > 0);
        config.fetch_timeout_ms = env_override("FETCH_TIMEOUT_MS", config.fetch_timeout_ms, |v| {
            (100..=120_000).contains(v)
        });
        config.fetch_max_attempts =
            env_override("FETCH_MAX_ATTEMPTS", config.fetch_max_attempts, |v| {
                (1..=10).contains(v)
            });
        config.max_concurrent_fetches = env_override(
            "MAX_CONCURRENT_FETCHES",
            config.max_concurrent_fetches,
            |v| (1..=64).contains(v),
        );
        config.requests_per_minute =
            env_override("REQUESTS_PER_MINUTE", config.requests_per_minute, |v| *v > 0);

        if let Ok(index) = std::env::var("INDEX_SYMBOL") {
            config.index_symbol = index.trim().to_string();
        }

        if let Ok(suffix) = std::env::var("SYMBOL_SUFFIX") {
            config.symbol_suffix = suffix.trim().to_string();
        }

        if let Ok(excluded) = std::env::var("EXCLUDED_SYMBOLS") {
            config.excluded_symbols = excluded
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(interval) = std::env::var("INTERVAL") {
            match interval.to_lowercase().as_str() {
                "1d" | "daily" => config.interval = Interval::Daily,
                "1wk" | "weekly" => config.interval = Interval::Weekly,
                other => tracing::warn!("Unknown INTERVAL '{}', using daily bars", other),
            }
        }

        if std::env::var("MIN_QTR_SALES_VAR").is_ok() {
            config.min_qtr_sales_var_pct = Some(env_override("MIN_QTR_SALES_VAR", 0.0, |v: &f64| {
                v.is_finite()
            }));
        }

        if std::env::var("MIN_QTR_PROFIT_VAR").is_ok() {
            config.min_qtr_profit_var_pct =
                Some(env_override("MIN_QTR_PROFIT_VAR", 0.0, |v: &f64| v.is_finite()));
        }

        if let Ok(format) = std::env::var("REPORT_FORMAT") {
            config.report_format = match format.to_lowercase().as_str() {
                "json" => ReportFormat::Json,
                "text" => ReportFormat::Text,
                other => {
                    tracing::warn!("Unknown REPORT_FORMAT '{}', using text", other);
                    ReportFormat::Text
                }
            };
        }

        config
    }

    /// Rejects combinations no run could make sense of
    pub fn validate(&self) -> Result<(), String> {
        if self.lookback_4w == 0 || self.lookback_12w == 0 {
            return Err("lookback windows must be positive".to_string());
        }
        if self.lookback_12w < self.lookback_4w {
            return Err(format!(
                "12-week lookback ({}) must not be shorter than 4-week lookback ({})",
                self.lookback_12w, self.lookback_4w
            ));
        }
        if self.top_n == 0 {
            return Err("top_n must be positive".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be positive".to_string());
        }
        if self.max_concurrent_fetches == 0 {
            return Err("max_concurrent_fetches must be positive".to_string());
        }
        let available = self.lookback().max_bars(self.interval);
        let required = self.indicator_engine().required_history();
        if available < required {
            return Err(format!(
                "{} weeks of {} bars yield at most {} bars, indicators need {}",
                self.history_weeks,
                self.interval.as_str(),
                available,
                required
            ));
        }
        Ok(())
    }

    pub fn lookback(&self) -> LookbackPeriod {
        LookbackPeriod::weeks(self.history_weeks)
    }

    pub fn indicator_engine(&self) -> IndicatorEngine {
        IndicatorEngine::new(self.lookback_4w, self.lookback_12w, self.rsi_period)
    }

    pub fn liquidity_filter(&self) -> LiquidityFilter {
        LiquidityFilter::new(self.min_volume)
    }

    pub fn symbol_policy(&self) -> SymbolPolicy {
        SymbolPolicy::new(self.symbol_suffix.clone(), self.excluded_symbols.clone())
    }

    pub fn fundamentals_screen(&self) -> FundamentalsScreen {
        FundamentalsScreen {
            min_qtr_sales_var_pct: self.min_qtr_sales_var_pct,
            min_qtr_profit_var_pct: self.min_qtr_profit_var_pct,
        }
    }

    pub fn ranker(&self) -> Ranker {
        Ranker::new(self.top_n)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.fetch_max_attempts,
            attempt_timeout: Duration::from_millis(self.fetch_timeout_ms),
            ..RetryConfig::default()
        }
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            requests_per_minute: self.requests_per_minute,
        }
    }
}
