//! Screener.in page client
//!
//! Fetches one page of a public screen and turns its results table into a
//! `CandidateTable`. Pagination lives in `PaginatedCandidateSource`.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::entities::candidate::{CandidateTable, DEFAULT_COLUMNS, SYMBOL_COLUMN};
use crate::domain::errors::FetchError;
use crate::domain::repositories::candidate_source::ScreenPageSource;
use crate::rate_limit::OutboundRateLimiter;

const SCREENER_USER_AGENT: &str = "Mozilla/5.0";
/// Header the screen uses for the company column; it holds the symbol once parsed.
const NAME_COLUMN: &str = "Name";

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css)
        .map_err(|e| FetchError::InvalidResponse(format!("bad selector {}: {:?}", css, e)))
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Symbol from a company link such as `/company/TCS/consolidated/`:
/// the second-to-last path segment, upper-cased.
pub fn symbol_from_href(href: &str) -> Option<String> {
    let segments: Vec<&str> = href.split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    let symbol = segments[segments.len() - 2].trim();
    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_uppercase())
    }
}

/// Parse the first table of a screen page.
///
/// Returns `None` when the page has no table. Only rows whose second cell
/// links to a company are kept, with the link's symbol in place of the name.
pub fn parse_screen_page(html: &str) -> Result<Option<CandidateTable>, FetchError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let table = match document.select(&table_sel).next() {
        Some(table) => table,
        None => return Ok(None),
    };

    let mut columns: Vec<String> = table
        .select(&th_sel)
        .map(|th| cell_text(&th))
        .collect();
    // Screens repeat the header row every few rows; keep the first one.
    if let Some(repeat) = columns.iter().skip(1).position(|c| c == &columns[0]) {
        columns.truncate(repeat + 1);
    }
    if columns.is_empty() {
        columns = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
    }
    for column in columns.iter_mut() {
        if column == NAME_COLUMN {
            *column = SYMBOL_COLUMN.to_string();
        }
    }

    let mut page = CandidateTable::new(columns);
    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let symbol = cells[1]
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(symbol_from_href);
        let symbol = match symbol {
            Some(symbol) => symbol,
            None => continue,
        };

        let mut values: Vec<String> = cells.iter().map(cell_text).collect();
        values[1] = symbol;
        page.rows.push(values);
    }

    Ok(Some(page))
}

/// HTTP client for screener.in result pages
pub struct ScreenerClient {
    client: Client,
    limiter: Option<OutboundRateLimiter>,
}

impl ScreenerClient {
    pub fn new(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(SCREENER_USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            limiter: None,
        })
    }

    pub fn with_rate_limiter(mut self, limiter: OutboundRateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// `<screen>?page=<n>`, keeping any query the screen URL already has
    pub fn page_url(screen: &str, page: u32) -> Result<Url, FetchError> {
        let mut url = Url::parse(screen)
            .map_err(|_| FetchError::InvalidIdentifier(screen.to_string()))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }
}

#[async_trait]
impl ScreenPageSource for ScreenerClient {
    async fn fetch_page(
        &self,
        screen: &str,
        page: u32,
    ) -> Result<Option<CandidateTable>, FetchError> {
        let url = Self::page_url(screen, page)?;
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!(url = %url, "Fetching screen page");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::Network(format!("screener returned {}", status)));
        }
        if !status.is_success() {
            return Err(FetchError::InvalidResponse(format!(
                "screener returned {} for page {}",
                status, page
            )));
        }

        let body = response.text().await?;
        parse_screen_page(&body)
    }
}
