//! Cursor pagination consistency checks for search APIs.
//!
//! This crate verifies a server's token-based paging contract: walking a
//! collection page by page yields the same items whatever the page size, an
//! unpaged query is a subset of the paged walk, and single pages sized to fit
//! (or overshoot) the collection come back complete and without a token.
//!
//! # Example
//!
//! ```ignore
//! use paging_verify::{CheckerConfig, ConsistencyChecker};
//!
//! let checker = ConsistencyChecker::new(&reads_search, CheckerConfig::default())?;
//! let report = checker.run(&filter).await;
//! assert!(report.is_success(), "{}", report.summary());
//! ```

pub mod args;
pub mod checker;
pub mod error;
pub mod identity;
pub mod report;
pub mod search;
pub mod testing;
pub mod walker;

pub use args::CheckArgs;
pub use checker::{gcd, CheckerConfig, ConsistencyChecker};
pub use error::{ProtocolViolation, TransportError, VerifyError};
pub use identity::{canonical_json, ItemIdentity, ItemSet};
pub use report::{ConsistencyReport, Outcome, Scenario, ScenarioReport, Violation};
pub use search::{Page, PageSize, PageToken, SearchPage};
pub use walker::{KeyOf, PageWalker, SinglePage, WalkResult, DEFAULT_MAX_PAGES};
