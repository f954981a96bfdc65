//! Candidate Source Traits
//!
//! `CandidateSource` yields the raw screen table. Page-oriented sources
//! implement `ScreenPageSource` and get pagination from
//! `PaginatedCandidateSource`.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::entities::candidate::CandidateTable;
use crate::domain::errors::FetchError;

#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch up to `max_pages` pages of the screen. Partial results on failure;
    /// an empty table when nothing at all could be obtained.
    async fn fetch(&self, screen: &str, max_pages: u32) -> CandidateTable;
}

#[async_trait]
pub trait ScreenPageSource: Send + Sync {
    /// Fetch one 1-based page. `Ok(None)` when the page carries no table.
    async fn fetch_page(&self, screen: &str, page: u32) -> Result<Option<CandidateTable>, FetchError>;
}

/// Walks pages until a short page, a page without a table, or a failure.
pub struct PaginatedCandidateSource<P> {
    pages: P,
    /// Rows a full page carries; a page with fewer rows is the last one.
    page_size: usize,
}

impl<P: ScreenPageSource> PaginatedCandidateSource<P> {
    pub fn new(pages: P, page_size: usize) -> Self {
        PaginatedCandidateSource { pages, page_size }
    }
}

#[async_trait]
impl<P: ScreenPageSource> CandidateSource for PaginatedCandidateSource<P> {
    async fn fetch(&self, screen: &str, max_pages: u32) -> CandidateTable {
        let mut table = CandidateTable::default();

        for page in 1..=max_pages {
            match self.pages.fetch_page(screen, page).await {
                Ok(Some(page_table)) => {
                    let rows = page_table.len();
                    debug!(screen = %screen, page, rows, "Fetched screen page");
                    table.extend(page_table);
                    if rows < self.page_size {
                        break;
                    }
                }
                Ok(None) => {
                    debug!(screen = %screen, page, "Page has no table, stopping");
                    break;
                }
                Err(e) => {
                    warn!(
                        screen = %screen,
                        page,
                        error = %e,
                        rows_so_far = table.len(),
                        "Screen page fetch failed, keeping rows fetched so far"
                    );
                    break;
                }
            }
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Serves pages of `sizes[i]` rows; a `None` entry is a failed request.
    struct FakePages {
        sizes: Vec<Option<usize>>,
        requests: AtomicU32,
    }

    impl FakePages {
        fn new(sizes: Vec<Option<usize>>) -> Self {
            FakePages {
                sizes,
                requests: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ScreenPageSource for FakePages {
        async fn fetch_page(
            &self,
            _screen: &str,
            page: u32,
        ) -> Result<Option<CandidateTable>, FetchError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            match self.sizes.get(page as usize - 1) {
                Some(Some(n)) => {
                    let mut t = CandidateTable::new(vec!["Symbol".to_string()]);
                    for i in 0..*n {
                        t.rows.push(vec![format!("P{}R{}", page, i)]);
                    }
                    Ok(Some(t))
                }
                Some(None) => Err(FetchError::Network("connection reset".to_string())),
                None => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let source = PaginatedCandidateSource::new(FakePages::new(vec![Some(3), Some(3), Some(2), Some(3)]), 3);
        let table = source.fetch("screen", 10).await;
        assert_eq!(table.len(), 8);
        assert_eq!(source.pages.requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_respects_max_pages() {
        let source = PaginatedCandidateSource::new(FakePages::new(vec![Some(3); 5]), 3);
        let table = source.fetch("screen", 2).await;
        assert_eq!(table.len(), 6);
        assert_eq!(source.pages.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_partial_rows() {
        let source = PaginatedCandidateSource::new(FakePages::new(vec![Some(3), None, Some(3)]), 3);
        let table = source.fetch("screen", 10).await;
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0][0], "P1R0");
    }

    #[tokio::test]
    async fn test_missing_table_stops() {
        let source = PaginatedCandidateSource::new(FakePages::new(vec![Some(3)]), 3);
        let table = source.fetch("screen", 10).await;
        assert_eq!(table.len(), 3);
        assert_eq!(source.pages.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_empty() {
        let source = PaginatedCandidateSource::new(FakePages::new(vec![None]), 3);
        let table = source.fetch("screen", 10).await;
        assert!(table.is_empty());
    }
}
