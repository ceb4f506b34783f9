//! Consistency checker: runs the walks and compares what they gathered.

use std::fmt::Display;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::VerifyError;
use crate::identity::ItemSet;
use crate::report::{ConsistencyReport, Outcome, Scenario, ScenarioReport, Violation};
use crate::search::{PageSize, SearchPage};
use crate::walker::{KeyOf, PageWalker, SinglePage, WalkResult, DEFAULT_MAX_PAGES};

const DEFAULT_CROSS_STRIDE: (PageSize, PageSize) =
    (PageSize::new_const(3), PageSize::new_const(7));

/// Knobs for a consistency check.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Page sizes of the two cross-stride walks. Must be relatively prime.
    pub cross_stride: (PageSize, PageSize),
    /// Call cap per walk.
    pub max_pages: usize,
    /// Treat items delivered twice across pages of one walk as a violation.
    pub strict_duplicates: bool,
    /// Run the independent walks concurrently.
    pub concurrent: bool,
    /// Keys listed per set difference.
    pub max_reported_items: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            cross_stride: DEFAULT_CROSS_STRIDE,
            max_pages: DEFAULT_MAX_PAGES,
            strict_duplicates: false,
            concurrent: false,
            max_reported_items: 20,
        }
    }
}

impl CheckerConfig {
    pub fn validate(&self) -> Result<(), VerifyError> {
        let (a, b) = self.cross_stride;
        if a == b {
            return Err(VerifyError::InvalidConfig(format!(
                "cross-stride page sizes must differ, got {a} twice"
            )));
        }
        let divisor = gcd(a.get(), b.get());
        if divisor != 1 {
            return Err(VerifyError::InvalidConfig(format!(
                "cross-stride page sizes {a} and {b} are not relatively prime (common divisor {divisor})"
            )));
        }
        if self.max_pages == 0 {
            return Err(VerifyError::InvalidConfig(
                "max pages per walk must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Greatest common divisor.
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

type WalkOutcome<S> = Result<WalkResult<KeyOf<S>>, VerifyError>;
type PageOutcome<S> = Result<SinglePage<KeyOf<S>>, VerifyError>;

/// Runs every scenario against one collection and reports each independently.
pub struct ConsistencyChecker<'a, S: ?Sized> {
    search: &'a S,
    config: CheckerConfig,
}

impl<'a, S: SearchPage + ?Sized> ConsistencyChecker<'a, S> {
    pub fn new(search: &'a S, config: CheckerConfig) -> Result<Self, VerifyError> {
        config.validate()?;
        Ok(Self { search, config })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    fn walker(&self) -> PageWalker<'a, S> {
        PageWalker::new(self.search).with_max_pages(self.config.max_pages)
    }

    /// Check the collection selected by `filter`.
    ///
    /// Never fails as a whole: call failures abort only the scenario they hit.
    pub async fn run(&self, filter: &S::Filter) -> ConsistencyReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let target = format!("{} {:?}", self.search.describe(), filter);
        let walker = self.walker();
        let (size_a, size_b) = self.config.cross_stride;

        info!("Checking pagination consistency of {}", target);

        let (unit, baseline, walk_a, walk_b) = if self.config.concurrent {
            futures::join!(
                walker.walk(filter, PageSize::ONE),
                walker.fetch_page(filter, None),
                walker.walk(filter, size_a),
                walker.walk(filter, size_b),
            )
        } else {
            let unit = walker.walk(filter, PageSize::ONE).await;
            let baseline = walker.fetch_page(filter, None).await;
            let walk_a = walker.walk(filter, size_a).await;
            let walk_b = walker.walk(filter, size_b).await;
            (unit, baseline, walk_a, walk_b)
        };

        let mut scenarios = vec![
            self.unit_stride(&unit),
            self.baseline(&baseline, unit.as_ref().ok()),
            self.cross_stride((size_a, &walk_a), (size_b, &walk_b)),
        ];

        // The first complete paged walk stands in for the whole collection.
        let full = [&unit, &walk_a, &walk_b]
            .into_iter()
            .find_map(|walk| walk.as_ref().ok());
        scenarios.push(
            self.single_page(&walker, filter, Scenario::ExactFit, full, 1)
                .await,
        );
        scenarios.push(
            self.single_page(&walker, filter, Scenario::OverFit, full, 2)
                .await,
        );

        for scenario in &scenarios {
            log_scenario(scenario);
        }

        let report = ConsistencyReport {
            target,
            started_at,
            scenarios,
            total_duration: start.elapsed(),
        };
        info!("{}", report.summary());
        report
    }

    fn unit_stride(&self, unit: &WalkOutcome<S>) -> ScenarioReport {
        let walk = match unit {
            Ok(walk) => walk,
            Err(e) => return aborted(Scenario::UnitStride, vec![1], e),
        };

        let mut violations = walk.shape_violations();
        violations.extend(self.walk_duplicates(walk));

        walk_report(Scenario::UnitStride, walk, Outcome::from_violations(violations))
    }

    fn baseline(
        &self,
        baseline: &PageOutcome<S>,
        unit: Option<&WalkResult<KeyOf<S>>>,
    ) -> ScenarioReport {
        let page = match baseline {
            Ok(page) => page,
            Err(e) => return aborted(Scenario::Baseline, Vec::new(), e),
        };

        let mut violations = Vec::new();
        if page.items.is_empty() {
            violations.push(Violation::EmptyCollection);
        }
        if page.items.duplicates() > 0 {
            violations.push(Violation::DuplicateItems {
                source: "baseline page".to_string(),
                count: page.items.duplicates(),
            });
        }

        let outcome = match unit {
            Some(unit) => {
                violations.extend(self.difference(
                    "baseline",
                    &page.items,
                    &walk_name(unit.page_size),
                    &unit.items,
                ));
                Outcome::from_violations(violations)
            }
            None if violations.is_empty() => Outcome::Skipped {
                reason: "unit-stride walk did not complete; nothing to compare the baseline against"
                    .to_string(),
            },
            None => Outcome::Failed { violations },
        };

        ScenarioReport {
            scenario: Scenario::Baseline,
            page_sizes: Vec::new(),
            calls: 1,
            items: page.items.len(),
            duration: page.duration,
            outcome,
        }
    }

    fn cross_stride(
        &self,
        (size_a, walk_a): (PageSize, &WalkOutcome<S>),
        (size_b, walk_b): (PageSize, &WalkOutcome<S>),
    ) -> ScenarioReport {
        let page_sizes = vec![size_a.get(), size_b.get()];
        let (a, b) = match (walk_a, walk_b) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => {
                return aborted(Scenario::CrossStride, page_sizes, e)
            }
            (Err(e_a), Err(e_b)) => {
                return aborted(Scenario::CrossStride, page_sizes, format!("{e_a}; {e_b}"))
            }
        };

        let mut violations = a.shape_violations();
        violations.extend(b.shape_violations());
        violations.extend(self.walk_duplicates(a));
        violations.extend(self.walk_duplicates(b));

        let (name_a, name_b) = (walk_name(a.page_size), walk_name(b.page_size));
        violations.extend(self.difference(&name_a, &a.items, &name_b, &b.items));
        violations.extend(self.difference(&name_b, &b.items, &name_a, &a.items));

        ScenarioReport {
            scenario: Scenario::CrossStride,
            page_sizes,
            calls: a.calls() + b.calls(),
            items: a.items.len().max(b.items.len()),
            duration: a.duration + b.duration,
            outcome: Outcome::from_violations(violations),
        }
    }

    async fn single_page(
        &self,
        walker: &PageWalker<'a, S>,
        filter: &S::Filter,
        scenario: Scenario,
        full: Option<&WalkResult<KeyOf<S>>>,
        factor: u32,
    ) -> ScenarioReport {
        let Some(full) = full else {
            return ScenarioReport::skipped(scenario, "no paged walk completed");
        };
        let expected = full.items.len();
        let Some(page_size) = PageSize::for_count(expected).and_then(|s| s.checked_mul(factor))
        else {
            let reason = if expected == 0 {
                "collection is empty".to_string()
            } else {
                format!("page size for {expected} items x{factor} does not fit in u32")
            };
            return ScenarioReport::skipped(scenario, reason);
        };

        let page = match walker.fetch_page(filter, Some(page_size)).await {
            Ok(page) => page,
            Err(e) => return aborted(scenario, vec![page_size.get()], e),
        };

        let mut violations = Vec::new();
        if page.item_count() != expected {
            violations.push(Violation::CountMismatch {
                page_size: page_size.get(),
                expected,
                actual: page.item_count(),
            });
        }
        if page.items.duplicates() > 0 {
            violations.push(Violation::DuplicateItems {
                source: format!("page({page_size})"),
                count: page.items.duplicates(),
            });
        }
        let (full_name, page_name) = (walk_name(full.page_size), format!("page({page_size})"));
        violations.extend(self.difference(&full_name, &full.items, &page_name, &page.items));
        violations.extend(self.difference(&page_name, &page.items, &full_name, &full.items));
        if page.has_more {
            violations.push(Violation::UnexpectedToken {
                page_size: page_size.get(),
            });
        }

        ScenarioReport {
            scenario,
            page_sizes: vec![page_size.get()],
            calls: 1,
            items: page.items.len(),
            duration: page.duration,
            outcome: Outcome::from_violations(violations),
        }
    }

    fn walk_duplicates(&self, walk: &WalkResult<KeyOf<S>>) -> Option<Violation> {
        let count = walk.items.duplicates();
        (self.config.strict_duplicates && count > 0).then(|| Violation::DuplicateItems {
            source: walk_name(walk.page_size),
            count,
        })
    }

    /// Items of `left` missing from `right`, if any.
    fn difference(
        &self,
        left_name: &str,
        left: &ItemSet<KeyOf<S>>,
        right_name: &str,
        right: &ItemSet<KeyOf<S>>,
    ) -> Option<Violation> {
        let missing = left.missing_from(right);
        if missing.is_empty() {
            return None;
        }
        Some(Violation::SetDifference {
            left: left_name.to_string(),
            right: right_name.to_string(),
            total: missing.len(),
            sample: missing
                .iter()
                .take(self.config.max_reported_items)
                .map(|key| key.to_string())
                .collect(),
        })
    }
}

fn walk_name(page_size: PageSize) -> String {
    format!("walk({page_size})")
}

fn walk_report<K: Ord + Clone>(
    scenario: Scenario,
    walk: &WalkResult<K>,
    outcome: Outcome,
) -> ScenarioReport {
    ScenarioReport {
        scenario,
        page_sizes: vec![walk.page_size.get()],
        calls: walk.calls(),
        items: walk.items.len(),
        duration: walk.duration,
        outcome,
    }
}

fn aborted(scenario: Scenario, page_sizes: Vec<u32>, err: impl Display) -> ScenarioReport {
    ScenarioReport {
        scenario,
        page_sizes,
        calls: 0,
        items: 0,
        duration: Duration::ZERO,
        outcome: Outcome::Aborted {
            error: err.to_string(),
        },
    }
}

fn log_scenario(report: &ScenarioReport) {
    match &report.outcome {
        Outcome::Passed => info!(
            "Scenario '{}': passed ({} calls, {} items)",
            report.scenario, report.calls, report.items
        ),
        Outcome::Failed { violations } => {
            for violation in violations {
                error!("Scenario '{}': {}", report.scenario, violation);
            }
        }
        Outcome::Aborted { error: e } => error!("Scenario '{}' aborted: {}", report.scenario, e),
        Outcome::Skipped { reason } => warn!("Scenario '{}' skipped: {}", report.scenario, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: u32) -> PageSize {
        PageSize::new(n).unwrap()
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(3, 7), 1);
        assert_eq!(gcd(4, 6), 2);
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(1, 9), 1);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = CheckerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cross_stride, (size(3), size(7)));
    }

    #[test]
    fn test_rejects_sizes_with_common_divisor() {
        let config = CheckerConfig {
            cross_stride: (size(4), size(6)),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("common divisor 2"));
    }

    #[test]
    fn test_rejects_equal_sizes() {
        let config = CheckerConfig {
            cross_stride: (size(5), size(5)),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_max_pages() {
        let config = CheckerConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
