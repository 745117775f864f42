//! Offset pagination
//!
//! Drives a page-at-a-time list operation until the service-reported total
//! has been covered.

use anyhow::{Context, Result};
use std::future::Future;

/// Items requested per page
pub const PAGE_SIZE: i64 = 100;

/// Hard stop for services that keep reporting a growing total
pub const MAX_PAGES: usize = 10_000;

/// One page as seen by the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

/// Every page concatenated, plus the total reported by the last page
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub pages: usize,
}

/// Fetch all pages (auto-paginate)
///
/// `fetch_page(offset, limit)` is called with offsets 0, `page_size`,
/// `2 * page_size`, ... and the loop stops once the next offset is past the
/// latest `total_count`. Any failing page fails the whole call; items already
/// collected are dropped.
pub async fn fetch_all_pages<T, F, Fut>(page_size: i64, max_pages: usize, mut fetch_page: F) -> Result<Aggregated<T>>
where
    F: FnMut(i64, i64) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    if page_size <= 0 {
        return Err(anyhow::anyhow!("Page size must be positive, got {}", page_size));
    }

    let mut all_items = Vec::new();
    let mut offset: i64 = 0;
    let mut pages = 0;

    loop {
        if pages >= max_pages {
            return Err(anyhow::anyhow!(
                "Pagination did not finish after {} pages (offset {})",
                pages,
                offset
            ));
        }

        let page = fetch_page(offset, page_size)
            .await
            .with_context(|| format!("Failed to fetch page at offset {}", offset))?;
        pages += 1;

        tracing::debug!(
            "Fetched page {} at offset {}: {} items, total_count {}",
            pages,
            offset,
            page.items.len(),
            page.total_count
        );

        offset = offset
            .checked_add(page_size)
            .ok_or_else(|| anyhow::anyhow!("Pagination offset overflow after offset {}", offset))?;
        all_items.extend(page.items);

        if offset > page.total_count {
            return Ok(Aggregated {
                items: all_items,
                total_count: page.total_count,
                pages,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Serve `total` sequential integers, recording requested offsets
    async fn run(total: i64, offsets: &RefCell<Vec<i64>>) -> Result<Aggregated<i64>> {
        fetch_all_pages(PAGE_SIZE, MAX_PAGES, |offset, limit| {
            offsets.borrow_mut().push(offset);
            async move {
                let end = (offset + limit).min(total);
                Ok::<_, anyhow::Error>(Page {
                    items: (offset..end.max(offset)).collect(),
                    total_count: total,
                })
            }
        })
        .await
    }

    #[tokio::test]
    async fn test_zero_total_issues_one_request() {
        let offsets = RefCell::new(Vec::new());
        let result = run(0, &offsets).await.unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(*offsets.borrow(), vec![0]);
    }

    #[tokio::test]
    async fn test_exact_multiple_fetches_trailing_empty_page() {
        let offsets = RefCell::new(Vec::new());
        let result = run(200, &offsets).await.unwrap();

        assert_eq!(result.items.len(), 200);
        assert_eq!(*offsets.borrow(), vec![0, 100, 200]);
        assert_eq!(result.pages, 3);
    }

    #[tokio::test]
    async fn test_partial_last_page() {
        let offsets = RefCell::new(Vec::new());
        let result = run(250, &offsets).await.unwrap();

        assert_eq!(result.items, (0..250).collect::<Vec<_>>());
        assert_eq!(*offsets.borrow(), vec![0, 100, 200]);
    }

    #[tokio::test]
    async fn test_failure_discards_accumulated_items() {
        let result: Result<Aggregated<i64>> = fetch_all_pages(PAGE_SIZE, MAX_PAGES, |offset, _| async move {
            if offset == 100 {
                Err(anyhow::anyhow!("backend exploded"))
            } else {
                Ok(Page {
                    items: vec![offset],
                    total_count: 300,
                })
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("offset 100"));
        assert!(format!("{:#}", err).contains("backend exploded"));
    }

    #[tokio::test]
    async fn test_growing_total_hits_page_cap() {
        let result: Result<Aggregated<i64>> = fetch_all_pages(PAGE_SIZE, 5, |offset, _| async move {
            Ok::<_, anyhow::Error>(Page {
                items: vec![offset],
                total_count: offset + 1_000,
            })
        })
        .await;

        assert!(result.unwrap_err().to_string().contains("did not finish after 5 pages"));
    }

    #[tokio::test]
    async fn test_total_from_latest_page_wins() {
        // Total shrinks after the first page
        let result = fetch_all_pages(PAGE_SIZE, MAX_PAGES, |offset, _| async move {
            let total = if offset == 0 { 500 } else { 150 };
            Ok::<_, anyhow::Error>(Page {
                items: vec![offset],
                total_count: total,
            })
        })
        .await
        .unwrap();

        assert_eq!(result.items, vec![0, 100]);
        assert_eq!(result.total_count, 150);
    }

    #[tokio::test]
    async fn test_offset_overflow_is_an_error() {
        let result: Result<Aggregated<i64>> = fetch_all_pages(i64::MAX, 10, |offset, _| async move {
            Ok::<_, anyhow::Error>(Page {
                items: vec![offset],
                total_count: i64::MAX,
            })
        })
        .await;

        assert!(result.unwrap_err().to_string().contains("overflow"));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_page_size() {
        let result: Result<Aggregated<i64>> =
            fetch_all_pages(0, MAX_PAGES, |_, _| async {
                Ok::<_, anyhow::Error>(Page {
                    items: vec![],
                    total_count: 0,
                })
            }).await;
        assert!(result.is_err());
    }
}
