//! End-to-end consistency checks against well-behaved and buggy in-memory servers.

use paging_verify::testing::{Fault, MemoryCollection};
use paging_verify::{
    CheckerConfig, ConsistencyChecker, ConsistencyReport, Outcome, Scenario, Violation,
};

fn eleven_items() -> MemoryCollection<u32> {
    MemoryCollection::new((0..11).collect())
}

async fn check(collection: &MemoryCollection<u32>, config: CheckerConfig) -> ConsistencyReport {
    ConsistencyChecker::new(collection, config)
        .expect("valid config")
        .run(&())
        .await
}

fn outcome(report: &ConsistencyReport, scenario: Scenario) -> &Outcome {
    &report
        .scenario(scenario)
        .unwrap_or_else(|| panic!("scenario {scenario} missing"))
        .outcome
}

#[tokio::test]
async fn test_well_behaved_server_passes_every_scenario() {
    let collection = eleven_items();
    let report = check(&collection, CheckerConfig::default()).await;

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(report.scenarios.len(), 5);

    let unit = report.scenario(Scenario::UnitStride).unwrap();
    assert_eq!(unit.calls, 11);
    assert_eq!(unit.items, 11);

    let cross = report.scenario(Scenario::CrossStride).unwrap();
    assert_eq!(cross.page_sizes, vec![3, 7]);
    assert_eq!(cross.calls, 4 + 2);

    assert_eq!(report.scenario(Scenario::ExactFit).unwrap().page_sizes, vec![11]);
    assert_eq!(report.scenario(Scenario::OverFit).unwrap().page_sizes, vec![22]);
}

#[tokio::test]
async fn test_walks_run_in_order_with_one_call_per_token() {
    let collection = eleven_items();
    check(&collection, CheckerConfig::default()).await;

    let mut expected = vec![Some(1); 11];
    expected.push(None);
    expected.extend([Some(3); 4]);
    expected.extend([Some(7); 2]);
    expected.extend([Some(11), Some(22)]);
    assert_eq!(collection.requested_page_sizes(), expected);
}

#[tokio::test]
async fn test_concurrent_mode_reaches_same_verdict() {
    let collection = eleven_items();
    let config = CheckerConfig {
        concurrent: true,
        ..Default::default()
    };
    let report = check(&collection, config).await;

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(collection.calls(), 11 + 1 + 4 + 2 + 2);
}

#[tokio::test]
async fn test_capped_baseline_is_tolerated() {
    let collection = eleven_items().with_fault(Fault::DefaultPageSize(4));
    let report = check(&collection, CheckerConfig::default()).await;

    assert!(report.is_success(), "{}", report.summary());
    assert_eq!(report.scenario(Scenario::Baseline).unwrap().items, 4);
}

#[tokio::test]
async fn test_skipped_boundary_items_are_reported_per_scenario() {
    let collection = eleven_items().with_fault(Fault::SkipBoundaryItem);
    let report = check(&collection, CheckerConfig::default()).await;

    // Page size 1 drops every other item but every page is still full.
    assert_eq!(outcome(&report, Scenario::UnitStride), &Outcome::Passed);
    assert_eq!(report.scenario(Scenario::UnitStride).unwrap().items, 6);

    let baseline = outcome(&report, Scenario::Baseline).violations();
    assert_eq!(
        baseline,
        &[Violation::SetDifference {
            left: "baseline".to_string(),
            right: "walk(1)".to_string(),
            total: 5,
            sample: vec!["1", "3", "5", "7", "9"]
                .into_iter()
                .map(String::from)
                .collect(),
        }]
    );

    let cross = outcome(&report, Scenario::CrossStride).violations();
    assert_eq!(
        cross,
        &[Violation::SetDifference {
            left: "walk(7)".to_string(),
            right: "walk(3)".to_string(),
            total: 1,
            sample: vec!["3".to_string()],
        }]
    );

    let exact = outcome(&report, Scenario::ExactFit).violations();
    assert!(exact.contains(&Violation::UnexpectedToken { page_size: 6 }));
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_token_on_last_page_is_flagged_on_single_pages() {
    let collection = eleven_items().with_fault(Fault::TokenOnLastPage);
    let report = check(&collection, CheckerConfig::default()).await;

    // Eleven single-item pages then one empty terminator.
    let unit = report.scenario(Scenario::UnitStride).unwrap();
    assert_eq!(unit.outcome, Outcome::Passed);
    assert_eq!(unit.calls, 12);

    // A short page that still carries a token is not the last page.
    let cross = outcome(&report, Scenario::CrossStride).violations();
    assert!(cross.contains(&Violation::page_shape(3, 3, 5, 2)));
    assert!(cross.contains(&Violation::page_shape(7, 1, 3, 4)));

    assert_eq!(
        outcome(&report, Scenario::ExactFit).violations(),
        &[Violation::UnexpectedToken { page_size: 11 }]
    );
    assert_eq!(
        outcome(&report, Scenario::OverFit).violations(),
        &[Violation::UnexpectedToken { page_size: 22 }]
    );
}

#[tokio::test]
async fn test_clamped_page_size_breaks_shape_and_exact_fit() {
    let collection = eleven_items().with_fault(Fault::MaxPageSize(5));
    let report = check(&collection, CheckerConfig::default()).await;

    assert_eq!(outcome(&report, Scenario::UnitStride), &Outcome::Passed);

    let cross = outcome(&report, Scenario::CrossStride).violations();
    assert_eq!(
        cross,
        &[
            Violation::page_shape(7, 0, 3, 5),
            Violation::page_shape(7, 1, 3, 5)
        ]
    );

    let exact = outcome(&report, Scenario::ExactFit).violations();
    assert!(exact.contains(&Violation::CountMismatch {
        page_size: 11,
        expected: 11,
        actual: 5
    }));
    assert!(exact.contains(&Violation::UnexpectedToken { page_size: 11 }));
    assert!(exact
        .iter()
        .any(|v| matches!(v, Violation::SetDifference { total: 6, .. })));
}

#[tokio::test]
async fn test_never_terminating_server_aborts_walks_only() {
    let collection = MemoryCollection::new((0u32..5).collect()).with_fault(Fault::NeverTerminate);
    let config = CheckerConfig {
        max_pages: 50,
        ..Default::default()
    };
    let report = check(&collection, config).await;

    match outcome(&report, Scenario::UnitStride) {
        Outcome::Aborted { error } => assert!(error.contains("Protocol violation")),
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(matches!(
        outcome(&report, Scenario::Baseline),
        Outcome::Skipped { .. }
    ));
    assert!(matches!(
        outcome(&report, Scenario::CrossStride),
        Outcome::Aborted { .. }
    ));
    assert!(matches!(
        outcome(&report, Scenario::ExactFit),
        Outcome::Skipped { .. }
    ));
    assert!(matches!(
        outcome(&report, Scenario::OverFit),
        Outcome::Skipped { .. }
    ));
}

#[tokio::test]
async fn test_transport_failure_aborts_only_its_scenario() {
    let collection = eleven_items().with_fault(Fault::FailOnCall(1));
    let report = check(&collection, CheckerConfig::default()).await;

    assert!(matches!(
        outcome(&report, Scenario::UnitStride),
        Outcome::Aborted { .. }
    ));
    assert!(matches!(
        outcome(&report, Scenario::Baseline),
        Outcome::Skipped { .. }
    ));
    assert_eq!(outcome(&report, Scenario::CrossStride), &Outcome::Passed);
    // The page-size-3 walk stands in for the full collection.
    assert_eq!(outcome(&report, Scenario::ExactFit), &Outcome::Passed);
    assert_eq!(outcome(&report, Scenario::OverFit), &Outcome::Passed);
}

#[tokio::test]
async fn test_repeated_boundary_items_only_fail_in_strict_mode() {
    let lenient = eleven_items().with_fault(Fault::RepeatBoundaryItem);
    let config = CheckerConfig {
        max_pages: 100,
        ..Default::default()
    };
    let report = check(&lenient, config.clone()).await;
    assert_eq!(outcome(&report, Scenario::CrossStride), &Outcome::Passed);
    // With page size 1 the token never advances.
    assert!(matches!(
        outcome(&report, Scenario::UnitStride),
        Outcome::Aborted { .. }
    ));

    let strict = eleven_items().with_fault(Fault::RepeatBoundaryItem);
    let report = check(
        &strict,
        CheckerConfig {
            strict_duplicates: true,
            ..config
        },
    )
    .await;
    assert_eq!(
        outcome(&report, Scenario::CrossStride).violations(),
        &[
            Violation::DuplicateItems {
                source: "walk(3)".to_string(),
                count: 4
            },
            Violation::DuplicateItems {
                source: "walk(7)".to_string(),
                count: 1
            },
        ]
    );
    assert_eq!(outcome(&report, Scenario::ExactFit), &Outcome::Passed);
}

#[tokio::test]
async fn test_empty_collection() {
    let collection = MemoryCollection::<u32>::new(Vec::new());
    let report = check(&collection, CheckerConfig::default()).await;

    assert_eq!(outcome(&report, Scenario::UnitStride), &Outcome::Passed);
    assert_eq!(
        outcome(&report, Scenario::Baseline).violations(),
        &[Violation::EmptyCollection]
    );
    match outcome(&report, Scenario::ExactFit) {
        Outcome::Skipped { reason } => assert_eq!(reason, "collection is empty"),
        other => panic!("expected skip, got {other:?}"),
    }
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let collection = eleven_items().with_fault(Fault::TokenOnLastPage);
    let report = check(&collection, CheckerConfig::default()).await;

    let json = serde_json::to_value(&report).unwrap();
    let scenarios = json["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 5);
    assert_eq!(scenarios[0]["scenario"], "unit-stride");
    assert_eq!(scenarios[0]["status"], "passed");
    assert_eq!(scenarios[3]["status"], "failed");
    assert_eq!(scenarios[3]["violations"][0]["kind"], "unexpected_token");
}

#[test]
fn test_invalid_config_is_rejected_up_front() {
    let collection = eleven_items();
    let config = CheckerConfig {
        cross_stride: (
            paging_verify::PageSize::new(4).unwrap(),
            paging_verify::PageSize::new(6).unwrap(),
        ),
        ..Default::default()
    };
    assert!(ConsistencyChecker::new(&collection, config).is_err());
}
