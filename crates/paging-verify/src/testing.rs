//! In-memory paged collection with injectable server bugs.
//!
//! Used by the test suites to exercise the checker against well-behaved and
//! misbehaving servers without a network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::identity::ItemIdentity;
use crate::search::{Page, PageSize, PageToken, SearchPage};

const URL: &str = "memory://collection";

/// A server bug to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Always return a continuation token, even past the end.
    NeverTerminate,
    /// Fail the n-th call (1-based) with a transport error.
    FailOnCall(usize),
    /// Continuation tokens point one item too far, losing an item per page boundary.
    SkipBoundaryItem,
    /// Continuation tokens point one item back, repeating the last item of each page.
    RepeatBoundaryItem,
    /// The page holding the final items still carries a token; the next call is empty.
    TokenOnLastPage,
    /// Requests without a page size get at most this many items.
    DefaultPageSize(usize),
    /// Requested page sizes above this are silently clamped.
    MaxPageSize(usize),
}

/// A collection served from memory with offset tokens.
pub struct MemoryCollection<T> {
    items: Vec<T>,
    faults: Vec<Fault>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Option<u32>>>,
}

impl<T> MemoryCollection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            faults: Vec::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Search calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page sizes requested so far, in call order.
    pub fn requested_page_sizes(&self) -> Vec<Option<u32>> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn has(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn default_page_size(&self) -> Option<usize> {
        self.faults.iter().find_map(|f| match f {
            Fault::DefaultPageSize(n) => Some(*n),
            _ => None,
        })
    }

    fn max_page_size(&self) -> Option<usize> {
        self.faults.iter().find_map(|f| match f {
            Fault::MaxPageSize(n) => Some(*n),
            _ => None,
        })
    }

    fn parse_token(token: &PageToken) -> Result<usize, TransportError> {
        token
            .as_str()
            .strip_prefix("offset:")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| TransportError::Status {
                url: URL.to_string(),
                status: 400,
                body: format!("unknown page token '{}'", token.as_str()),
            })
    }

    fn token(offset: usize) -> Option<PageToken> {
        PageToken::from_wire(Some(format!("offset:{offset}")))
    }
}

#[async_trait]
impl<T> SearchPage for MemoryCollection<T>
where
    T: ItemIdentity + Clone + Send + Sync,
{
    type Filter = ();
    type Item = T;

    fn describe(&self) -> String {
        format!("in-memory collection of {} items", self.items.len())
    }

    async fn search_page(
        &self,
        _filter: &(),
        page_size: Option<PageSize>,
        page_token: Option<PageToken>,
    ) -> Result<Page<T>, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(page_size.map(PageSize::get));

        if self.has(Fault::FailOnCall(call)) {
            return Err(TransportError::Request {
                url: URL.to_string(),
                message: format!("injected failure on call {call}"),
            });
        }

        let len = self.items.len();
        let offset = match &page_token {
            Some(token) => Self::parse_token(token)?,
            None => 0,
        }
        .min(len);

        let mut limit = match page_size {
            Some(size) => size.as_usize(),
            None => self.default_page_size().unwrap_or(len),
        };
        if let Some(max) = self.max_page_size() {
            limit = limit.min(max);
        }

        let end = offset.saturating_add(limit).min(len);
        let items = self.items[offset..end].to_vec();
        let more = end < len;

        let next_page_token = if more {
            let next = if self.has(Fault::SkipBoundaryItem) {
                end + 1
            } else if self.has(Fault::RepeatBoundaryItem) {
                end.saturating_sub(1)
            } else {
                end
            };
            Self::token(next)
        } else if self.has(Fault::NeverTerminate)
            || (self.has(Fault::TokenOnLastPage) && !items.is_empty())
        {
            Self::token(end)
        } else {
            None
        };

        Ok(Page {
            items,
            next_page_token,
        })
    }
}
