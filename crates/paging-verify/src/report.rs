//! Verification report types.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// The checks run against one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Walk with page size 1.
    UnitStride,
    /// One call with the server's default page size.
    Baseline,
    /// Two walks with relatively prime page sizes.
    CrossStride,
    /// One call with page size equal to the collection size.
    ExactFit,
    /// One call with page size twice the collection size.
    OverFit,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::UnitStride,
        Scenario::Baseline,
        Scenario::CrossStride,
        Scenario::ExactFit,
        Scenario::OverFit,
    ];
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::UnitStride => write!(f, "unit-stride"),
            Scenario::Baseline => write!(f, "baseline"),
            Scenario::CrossStride => write!(f, "cross-stride"),
            Scenario::ExactFit => write!(f, "exact-fit"),
            Scenario::OverFit => write!(f, "over-fit"),
        }
    }
}

/// A consistency property that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A page held the wrong number of items.
    PageShape {
        page_size: u32,
        page_index: usize,
        page_count: usize,
        actual: usize,
    },
    /// A single page held the wrong number of items.
    CountMismatch {
        page_size: u32,
        expected: usize,
        actual: usize,
    },
    /// Items present in `left` but absent from `right`.
    SetDifference {
        left: String,
        right: String,
        total: usize,
        sample: Vec<String>,
    },
    /// A single-page response still carried a continuation token.
    UnexpectedToken { page_size: u32 },
    /// The same item was delivered more than once.
    DuplicateItems {
        source: String,
        count: usize,
    },
    /// The collection returned no items at all.
    EmptyCollection,
}

impl Violation {
    pub fn page_shape(page_size: u32, page_index: usize, page_count: usize, actual: usize) -> Self {
        Violation::PageShape {
            page_size,
            page_index,
            page_count,
            actual,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::PageShape {
                page_size,
                page_index,
                page_count,
                actual,
            } => {
                let bound = if page_index + 1 == *page_count {
                    "at most"
                } else {
                    "exactly"
                };
                write!(
                    f,
                    "page {} of {} (page size {}) held {} items, expected {} {}",
                    page_index + 1,
                    page_count,
                    page_size,
                    actual,
                    bound,
                    page_size
                )
            }
            Violation::CountMismatch {
                page_size,
                expected,
                actual,
            } => write!(
                f,
                "single page of size {page_size} held {actual} items, expected {expected}"
            ),
            Violation::SetDifference {
                left,
                right,
                total,
                sample,
            } => {
                write!(f, "{total} items from {left} missing in {right}")?;
                if !sample.is_empty() {
                    write!(f, ": {}", sample.join(", "))?;
                    if sample.len() < *total {
                        write!(f, ", ...")?;
                    }
                }
                Ok(())
            }
            Violation::UnexpectedToken { page_size } => write!(
                f,
                "single page of size {page_size} returned a continuation token"
            ),
            Violation::DuplicateItems { source, count } => {
                write!(f, "{count} duplicate items delivered by {source}")
            }
            Violation::EmptyCollection => write!(f, "collection returned no items"),
        }
    }
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { violations: Vec<Violation> },
    /// A call failed or the server broke the protocol.
    Aborted { error: String },
    /// A prerequisite scenario did not produce what this one needs.
    Skipped { reason: String },
}

impl Outcome {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Failed { violations }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed { .. } => "FAILED",
            Outcome::Aborted { .. } => "ABORTED",
            Outcome::Skipped { .. } => "SKIPPED",
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Outcome::Failed { violations } => violations,
            _ => &[],
        }
    }
}

/// Report for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Page sizes requested; empty for the server-default baseline.
    pub page_sizes: Vec<u32>,
    /// Search calls issued.
    pub calls: usize,
    /// Distinct items gathered.
    pub items: usize,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ScenarioReport {
    pub fn skipped(scenario: Scenario, reason: impl Into<String>) -> Self {
        Self {
            scenario,
            page_sizes: Vec::new(),
            calls: 0,
            items: 0,
            duration: Duration::ZERO,
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }
}

/// Report for one collection.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    /// What was checked: endpoint and filter.
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
    #[serde(rename = "total_duration_secs", serialize_with = "serialize_secs")]
    pub total_duration: Duration,
}

impl ConsistencyReport {
    /// Report for a collection that could not be checked at all.
    pub fn aborted(target: impl Into<String>, error: impl fmt::Display) -> Self {
        let error = error.to_string();
        Self {
            target: target.into(),
            started_at: Utc::now(),
            scenarios: Scenario::ALL
                .iter()
                .map(|&scenario| ScenarioReport {
                    scenario,
                    page_sizes: Vec::new(),
                    calls: 0,
                    items: 0,
                    duration: Duration::ZERO,
                    outcome: Outcome::Aborted {
                        error: error.clone(),
                    },
                })
                .collect(),
            total_duration: Duration::ZERO,
        }
    }

    /// Every scenario passed.
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(|s| s.outcome.is_passed())
    }

    pub fn count(&self, label: &str) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.outcome.label() == label)
            .count()
    }

    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.scenario == scenario)
    }

    pub fn total_calls(&self) -> usize {
        self.scenarios.iter().map(|s| s.calls).sum()
    }

    pub fn summary(&self) -> String {
        if self.is_success() {
            format!(
                "Pagination check PASSED for {}: {}/{} scenarios passed in {:?}",
                self.target,
                self.scenarios.len(),
                self.scenarios.len(),
                self.total_duration
            )
        } else {
            format!(
                "Pagination check FAILED for {}: {} failed, {} aborted, {} skipped out of {} scenarios",
                self.target,
                self.count("FAILED"),
                self.count("ABORTED"),
                self.count("SKIPPED"),
                self.scenarios.len()
            )
        }
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
