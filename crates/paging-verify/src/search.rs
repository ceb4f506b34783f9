//! The search operation a server exposes, as seen by the checker.
//!
//! Everything the checker knows about the server goes through [`SearchPage`]:
//! one call takes a filter, an optional page size and an optional continuation
//! token, and returns a [`Page`] of items plus the next token.

use std::fmt;
use std::num::NonZeroU32;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, VerifyError};
use crate::identity::ItemIdentity;

/// A positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Page size 1.
    pub const ONE: PageSize = PageSize(NonZeroU32::MIN);

    /// Create a page size, rejecting zero.
    pub fn new(size: u32) -> Result<Self, VerifyError> {
        NonZeroU32::new(size)
            .map(PageSize)
            .ok_or_else(|| VerifyError::InvalidConfig("page size must be at least 1".to_string()))
    }

    /// Const constructor for literal sizes. Zero fails const evaluation.
    pub const fn new_const(size: u32) -> Self {
        match NonZeroU32::new(size) {
            Some(size) => PageSize(size),
            None => panic!("page size must be at least 1"),
        }
    }

    /// Page size for a collection of `count` items, if it fits and is non-zero.
    pub fn for_count(count: usize) -> Option<Self> {
        u32::try_from(count).ok().and_then(NonZeroU32::new).map(PageSize)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub fn as_usize(self) -> usize {
        self.0.get() as usize
    }

    /// Multiply, returning `None` on overflow.
    pub fn checked_mul(self, factor: u32) -> Option<Self> {
        NonZeroU32::new(factor)
            .and_then(|f| self.0.checked_mul(f))
            .map(PageSize)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = VerifyError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PageSize::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

/// Opaque continuation token.
///
/// Only the server knows what it means. The checker hands it back verbatim and
/// never compares two tokens, so no equality is provided.
#[derive(Clone)]
pub struct PageToken(String);

impl PageToken {
    /// Wrap a raw token. An empty string means "no more pages" and yields `None`.
    pub fn from_wire(raw: Option<String>) -> Option<Self> {
        raw.filter(|s| !s.is_empty()).map(PageToken)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageToken({} bytes)", self.0.len())
    }
}

/// One search response.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<PageToken>,
}

impl<T> Page<T> {
    /// A page with no continuation token.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A server-side search operation that pages its results.
#[async_trait]
pub trait SearchPage: Send + Sync {
    /// Criteria selecting the collection. Identical on every call of a walk.
    type Filter: fmt::Debug + Send + Sync;

    /// Record type returned by the search.
    type Item: ItemIdentity + Send;

    /// Short human-readable name of the endpoint, used in logs and reports.
    fn describe(&self) -> String;

    /// Fetch one page.
    ///
    /// `page_size` of `None` leaves the size to the server's default.
    /// `page_token` of `None` starts from the beginning of the collection.
    async fn search_page(
        &self,
        filter: &Self::Filter,
        page_size: Option<PageSize>,
        page_token: Option<PageToken>,
    ) -> Result<Page<Self::Item>, TransportError>;
}
