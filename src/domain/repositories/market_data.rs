//! Market Data Provider Trait
//!
//! The screening pipeline never talks to a data vendor directly. It asks a
//! `MarketDataProvider` for price/volume history, benchmark history and a
//! sector label, which keeps the scoring logic testable with in-memory fakes.

use async_trait::async_trait;

use crate::domain::entities::price_series::{IndexSeries, Interval, LookbackPeriod, PriceSeries};
use crate::domain::errors::FetchError;

pub type FetchResult<T> = Result<T, FetchError>;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Fetch the close/volume history of a symbol in provider form
    /// (e.g. "RELIANCE.NS").
    async fn fetch_series(
        &self,
        identifier: &str,
        lookback: LookbackPeriod,
        interval: Interval,
    ) -> FetchResult<PriceSeries>;

    /// Fetch benchmark history. Same failure modes as [`fetch_series`].
    ///
    /// [`fetch_series`]: MarketDataProvider::fetch_series
    async fn fetch_index_series(
        &self,
        index_identifier: &str,
        lookback: LookbackPeriod,
        interval: Interval,
    ) -> FetchResult<IndexSeries> {
        self.fetch_series(index_identifier, lookback, interval).await
    }

    /// Fetch the sector / classification label of a symbol.
    async fn fetch_classification(&self, identifier: &str) -> FetchResult<String>;
}
