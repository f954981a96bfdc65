//! Yahoo Finance market data client
//!
//! Daily or weekly bars come from the v8 chart endpoint. Sector labels come
//! from the quoteSummary `assetProfile` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::entities::price_series::{
    IndexSeries, Interval, LookbackPeriod, PriceBar, PriceSeries,
};
use crate::domain::errors::FetchError;
use crate::domain::repositories::market_data::{FetchResult, MarketDataProvider};
use crate::rate_limit::OutboundRateLimiter;

const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";
const YAHOO_SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary/";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub chart_base: String,
    pub summary_base: String,
    pub request_timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            chart_base: YAHOO_CHART_BASE.to_string(),
            summary_base: YAHOO_SUMMARY_BASE.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

// Chart response

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooApiError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// quoteSummary response

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryData>>,
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryData {
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
}

fn api_error(identifier: &str, error: YahooApiError) -> FetchError {
    let description = error.description.unwrap_or_default();
    if error.code.eq_ignore_ascii_case("Not Found") {
        FetchError::InvalidIdentifier(identifier.to_string())
    } else {
        FetchError::InvalidResponse(format!("{}: {}", error.code, description))
    }
}

/// What to do with a chart row that has a close but no volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingVolume {
    Drop,
    Zero,
}

/// Turn a chart payload into a validated series.
///
/// Rows missing a close or a volume are dropped.
/// Bars that land on the same calendar date are collapsed, the later one wins.
pub fn parse_chart(identifier: &str, body: &str) -> FetchResult<PriceSeries> {
    parse_chart_rows(identifier, body, MissingVolume::Drop)
}

/// Benchmark variant of [`parse_chart`]. Indices often publish no volume,
/// so only a missing close drops a row and a missing volume reads as zero.
pub fn parse_index_chart(identifier: &str, body: &str) -> FetchResult<IndexSeries> {
    parse_chart_rows(identifier, body, MissingVolume::Zero)
}

fn parse_chart_rows(
    identifier: &str,
    body: &str,
    missing_volume: MissingVolume,
) -> FetchResult<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::InvalidResponse(format!("chart for {}: {}", identifier, e)))?;

    if let Some(error) = response.chart.error {
        return Err(api_error(identifier, error));
    }

    let data = response
        .chart
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.swap_remove(0))
            }
        })
        .ok_or_else(|| FetchError::NoData(identifier.to_string()))?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| FetchError::NoData(identifier.to_string()))?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NoData(identifier.to_string()))?;
    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let (close, volume) = match (
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        ) {
            (Some(close), Some(volume)) => (close, volume),
            (Some(close), None) if missing_volume == MissingVolume::Zero => (close, 0.0),
            _ => continue,
        };
        let date = DateTime::<Utc>::from_timestamp(ts + offset, 0)
            .ok_or_else(|| {
                FetchError::InvalidResponse(format!("bad timestamp {} for {}", ts, identifier))
            })?
            .date_naive();

        let bar = PriceBar::new(date, close, volume)?;
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    if bars.is_empty() {
        return Err(FetchError::NoData(identifier.to_string()));
    }

    Ok(PriceSeries::new(identifier, bars)?)
}

/// Sector label from a quoteSummary payload
pub fn parse_classification(identifier: &str, body: &str) -> FetchResult<String> {
    let response: SummaryResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::InvalidResponse(format!("summary for {}: {}", identifier, e))
    })?;

    if let Some(error) = response.quote_summary.error {
        return Err(api_error(identifier, error));
    }

    response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(|data| data.asset_profile)
        .filter_map(|profile| profile.sector)
        .find(|sector| !sector.trim().is_empty())
        .ok_or_else(|| FetchError::NoData(identifier.to_string()))
}

/// Yahoo Finance client for price history and sector labels
pub struct YahooFinanceClient {
    client: Client,
    config: YahooConfig,
    limiter: Option<OutboundRateLimiter>,
}

impl YahooFinanceClient {
    pub fn new(config: YahooConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            limiter: None,
        })
    }

    /// Share an outbound request budget with other collaborators
    pub fn with_rate_limiter(mut self, limiter: OutboundRateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    fn endpoint(&self, base: &str, identifier: &str) -> FetchResult<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| FetchError::InvalidResponse(format!("bad base url {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidResponse(format!("cannot extend base url {}", base)))?
            .pop_if_empty()
            .push(identifier);
        Ok(url)
    }

    async fn get_body(&self, identifier: &str, url: Url) -> FetchResult<String> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!(url = %url, "Yahoo request");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::InvalidIdentifier(identifier.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(FetchError::Network(format!(
                "Yahoo returned {} for {}",
                status, identifier
            )));
        }
        if !status.is_success() {
            return Err(FetchError::InvalidResponse(format!(
                "Yahoo returned {} for {}",
                status, identifier
            )));
        }

        Ok(response.text().await?)
    }

    async fn fetch_chart(
        &self,
        identifier: &str,
        lookback: LookbackPeriod,
        interval: Interval,
    ) -> FetchResult<String> {
        let period2 = Utc::now();
        let period1 = period2 - lookback.as_duration();

        let mut url = self.endpoint(&self.config.chart_base, identifier)?;
        url.query_pairs_mut()
            .append_pair("period1", &period1.timestamp().to_string())
            .append_pair("period2", &period2.timestamp().to_string())
            .append_pair("interval", interval.as_str())
            .append_pair("events", "history");

        self.get_body(identifier, url).await
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_series(
        &self,
        identifier: &str,
        lookback: LookbackPeriod,
        interval: Interval,
    ) -> FetchResult<PriceSeries> {
        let body = self.fetch_chart(identifier, lookback, interval).await?;
        let series = parse_chart(identifier, &body)?;
        debug!(identifier = %identifier, bars = series.len(), "Fetched price history");
        Ok(series)
    }

    async fn fetch_index_series(
        &self,
        index_identifier: &str,
        lookback: LookbackPeriod,
        interval: Interval,
    ) -> FetchResult<IndexSeries> {
        let body = self.fetch_chart(index_identifier, lookback, interval).await?;
        let series = parse_index_chart(index_identifier, &body)?;
        debug!(identifier = %index_identifier, bars = series.len(), "Fetched benchmark history");
        Ok(series)
    }

    async fn fetch_classification(&self, identifier: &str) -> FetchResult<String> {
        let mut url = self.endpoint(&self.config.summary_base, identifier)?;
        url.query_pairs_mut().append_pair("modules", "assetProfile");

        let body = self.get_body(identifier, url).await?;
        parse_classification(identifier, &body)
    }
}
