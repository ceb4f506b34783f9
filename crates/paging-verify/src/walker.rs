//! Page walker: follows continuation tokens until the server says it is done.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{ProtocolViolation, VerifyError};
use crate::identity::{ItemIdentity, ItemSet};
use crate::report::Violation;
use crate::search::{PageSize, PageToken, SearchPage};

/// Calls allowed per walk before the server is declared to never terminate.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Identity key of the items a search returns.
pub type KeyOf<S> = <<S as SearchPage>::Item as ItemIdentity>::Key;

/// Everything gathered by one complete walk.
#[derive(Debug, Clone)]
pub struct WalkResult<K> {
    pub page_size: PageSize,
    pub items: ItemSet<K>,
    /// Item count of each page, in call order.
    pub page_counts: Vec<usize>,
    pub duration: Duration,
}

impl<K: Ord + Clone> WalkResult<K> {
    /// Number of search calls issued.
    pub fn calls(&self) -> usize {
        self.page_counts.len()
    }

    /// Pages that are not full (or the last page when it overflows).
    ///
    /// Every page but the last must hold exactly `page_size` items; the last
    /// may hold anything from zero to `page_size`.
    pub fn shape_violations(&self) -> Vec<Violation> {
        let expected = self.page_size.as_usize();
        let page_count = self.page_counts.len();
        self.page_counts
            .iter()
            .enumerate()
            .filter(|&(index, &count)| {
                if index + 1 < page_count {
                    count != expected
                } else {
                    count > expected
                }
            })
            .map(|(index, &count)| {
                Violation::page_shape(self.page_size.get(), index, page_count, count)
            })
            .collect()
    }
}

/// Result of a single search call issued without a continuation token.
#[derive(Debug, Clone)]
pub struct SinglePage<K> {
    /// Requested size; `None` for the server default.
    pub page_size: Option<PageSize>,
    pub items: ItemSet<K>,
    /// Whether the response carried a continuation token.
    pub has_more: bool,
    pub duration: Duration,
}

impl<K: Ord + Clone> SinglePage<K> {
    /// Items in the response, duplicates included.
    pub fn item_count(&self) -> usize {
        self.items.delivered()
    }
}

/// Drives a [`SearchPage`] through complete walks.
///
/// Holds no state between walks; each call to [`PageWalker::walk`] starts a
/// fresh token chain.
pub struct PageWalker<'a, S: ?Sized> {
    search: &'a S,
    max_pages: usize,
}

impl<'a, S: SearchPage + ?Sized> PageWalker<'a, S> {
    pub fn new(search: &'a S) -> Self {
        Self {
            search,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Cap the number of calls per walk. Values below 1 are raised to 1.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Walk the whole collection selected by `filter`, `page_size` items at a time.
    ///
    /// Only one call is in flight at a time: each token returned is moved into
    /// the next call and never reused.
    pub async fn walk(
        &self,
        filter: &S::Filter,
        page_size: PageSize,
    ) -> Result<WalkResult<KeyOf<S>>, VerifyError> {
        let start = Instant::now();
        let mut items = ItemSet::new();
        let mut page_counts = Vec::new();
        let mut token: Option<PageToken> = None;

        debug!(
            "Starting walk of {} with page size {} (filter: {:?})",
            self.search.describe(),
            page_size,
            filter
        );

        loop {
            if page_counts.len() >= self.max_pages {
                warn!(
                    "Walk of {} with page size {} still had a continuation token after {} calls",
                    self.search.describe(),
                    page_size,
                    page_counts.len()
                );
                return Err(ProtocolViolation::IterationCapExceeded {
                    page_size: page_size.get(),
                    pages: page_counts.len(),
                }
                .into());
            }

            let page = self
                .search
                .search_page(filter, Some(page_size), token.take())
                .await?;

            page_counts.push(page.items.len());
            items.extend_from(&page.items);
            debug!(
                "Page {} of walk with page size {}: {} items, more={}",
                page_counts.len(),
                page_size,
                page.items.len(),
                page.has_more()
            );

            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let result = WalkResult {
            page_size,
            items,
            page_counts,
            duration: start.elapsed(),
        };

        if result.items.duplicates() > 0 {
            warn!(
                "Walk with page size {} absorbed {} duplicate items",
                page_size,
                result.items.duplicates()
            );
        }
        info!(
            "Walk of {} with page size {} complete: {} calls, {} distinct items in {:?}",
            self.search.describe(),
            page_size,
            result.calls(),
            result.items.len(),
            result.duration
        );

        Ok(result)
    }

    /// Issue exactly one call, without a continuation token.
    pub async fn fetch_page(
        &self,
        filter: &S::Filter,
        page_size: Option<PageSize>,
    ) -> Result<SinglePage<KeyOf<S>>, VerifyError> {
        let start = Instant::now();
        let page = self.search.search_page(filter, page_size, None).await?;

        let mut items = ItemSet::new();
        items.extend_from(&page.items);

        debug!(
            "Single page of {} (page size {}): {} items, more={}",
            self.search.describe(),
            page_size.map_or_else(|| "default".to_string(), |s| s.to_string()),
            page.items.len(),
            page.has_more()
        );

        Ok(SinglePage {
            page_size,
            items,
            has_more: page.has_more(),
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fault, MemoryCollection};

    fn size(n: u32) -> PageSize {
        PageSize::new(n).unwrap()
    }

    fn walk_result(page_size: u32, page_counts: Vec<usize>) -> WalkResult<u32> {
        WalkResult {
            page_size: size(page_size),
            items: ItemSet::new(),
            page_counts,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_shape_accepts_short_or_empty_last_page() {
        assert!(walk_result(3, vec![3, 3, 2]).shape_violations().is_empty());
        assert!(walk_result(3, vec![3, 3, 0]).shape_violations().is_empty());
        assert!(walk_result(1, vec![1; 11]).shape_violations().is_empty());
        assert!(walk_result(5, vec![0]).shape_violations().is_empty());
    }

    #[test]
    fn test_shape_flags_short_middle_and_oversized_last_page() {
        let violations = walk_result(3, vec![3, 2, 3, 4]).shape_violations();
        assert_eq!(
            violations,
            vec![
                Violation::page_shape(3, 1, 4, 2),
                Violation::page_shape(3, 3, 4, 4)
            ]
        );
    }

    #[tokio::test]
    async fn test_unit_stride_walk_of_eleven_items() {
        let collection = MemoryCollection::new((0u32..11).collect());
        let walker = PageWalker::new(&collection);

        let result = walker.walk(&(), PageSize::ONE).await.unwrap();

        assert_eq!(result.calls(), 11);
        assert_eq!(result.page_counts, vec![1; 11]);
        assert_eq!(result.items.len(), 11);
        assert_eq!(collection.calls(), 11);
    }

    #[tokio::test]
    async fn test_walk_follows_tokens_to_exhaustion() {
        let collection = MemoryCollection::new((0u32..11).collect());
        let walker = PageWalker::new(&collection);

        let result = walker.walk(&(), size(3)).await.unwrap();

        assert_eq!(result.page_counts, vec![3, 3, 3, 2]);
        assert_eq!(result.items.len(), 11);
        assert!(result.shape_violations().is_empty());
    }

    #[tokio::test]
    async fn test_walk_hits_iteration_cap() {
        let collection =
            MemoryCollection::new((0u32..4).collect()).with_fault(Fault::NeverTerminate);
        let walker = PageWalker::new(&collection).with_max_pages(25);

        let err = walker.walk(&(), size(2)).await.unwrap_err();

        assert_eq!(
            err,
            VerifyError::Protocol(ProtocolViolation::IterationCapExceeded {
                page_size: 2,
                pages: 25
            })
        );
        assert_eq!(collection.calls(), 25);
    }

    #[tokio::test]
    async fn test_walk_propagates_transport_error_without_retry() {
        let collection =
            MemoryCollection::new((0u32..10).collect()).with_fault(Fault::FailOnCall(2));
        let walker = PageWalker::new(&collection);

        let err = walker.walk(&(), size(3)).await.unwrap_err();

        assert!(matches!(err, VerifyError::Transport(_)));
        assert_eq!(collection.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_page_reports_token_presence() {
        let collection = MemoryCollection::new((0u32..11).collect());
        let walker = PageWalker::new(&collection);

        let partial = walker.fetch_page(&(), Some(size(4))).await.unwrap();
        assert_eq!(partial.item_count(), 4);
        assert!(partial.has_more);

        let whole = walker.fetch_page(&(), Some(size(22))).await.unwrap();
        assert_eq!(whole.item_count(), 11);
        assert!(!whole.has_more);
    }

    #[test]
    fn test_max_pages_floor() {
        let collection = MemoryCollection::new(vec![1u32]);
        assert_eq!(PageWalker::new(&collection).with_max_pages(0).max_pages(), 1);
    }
}
