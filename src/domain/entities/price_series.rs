use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ValidationError;
use crate::domain::value_objects::price::{Price, Volume};

/// Bar spacing requested from the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    Daily,
    Weekly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }

    /// Trading sessions per calendar week
    pub fn bars_per_week(&self) -> usize {
        match self {
            Interval::Daily => 5,
            Interval::Weekly => 1,
        }
    }
}

/// How far back a history request reaches, in calendar weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackPeriod {
    pub weeks: u32,
}

impl LookbackPeriod {
    pub fn weeks(weeks: u32) -> Self {
        LookbackPeriod { weeks }
    }

    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::weeks(self.weeks as i64)
    }

    /// Most bars a request can return at `interval`; holidays only lower it.
    pub fn max_bars(&self, interval: Interval) -> usize {
        self.weeks as usize * interval.bars_per_week()
    }
}

/// One observation of a symbol: closing price and traded volume.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: Price,
    pub volume: Volume,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Result<Self, ValidationError> {
        Ok(PriceBar {
            date,
            close: Price::new(close)?,
            volume: Volume::new(volume)?,
        })
    }
}

/// Chronologically ascending bars for one symbol, no two on the same date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

/// Benchmark history; same shape as a symbol's series.
pub type IndexSeries = PriceSeries;

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ValidationError::InvalidSymbol(
                "symbol must not be empty".to_string(),
            ));
        }

        for pair in bars.windows(2) {
            let (previous, next) = (pair[0].date, pair[1].date);
            if next == previous {
                return Err(ValidationError::DuplicateDate(next));
            }
            if next < previous {
                return Err(ValidationError::OutOfOrder { previous, next });
            }
        }

        Ok(PriceSeries { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close.value()).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume.value()).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close.value())
    }
}
