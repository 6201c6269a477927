//! Test: connector failures stay local to their step

use crate::helpers::*;
use dragnet::core::{DomainType, ExecutionStatus, KeywordCategory, StepStatus};
use std::time::Duration;

#[tokio::test]
async fn test_seed_failure_is_recorded() {
    let registry = registry(vec![MockConnector::new(DomainType::Registry)
        .searches(&[KeywordCategory::CompanyName])
        .retrieves(&[KeywordCategory::PersonName])
        .fails("Acme", "registry unreachable")]);

    let result = run(registry, config("Acme", 2, &[DomainType::Registry])).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.total_steps, 1);
    assert_eq!(result.failed_steps, 1);
    assert_eq!(result.successful_steps, 0);

    let step = &result.steps[0];
    assert!(!step.success);
    assert_eq!(step.status(), StepStatus::Failed);
    assert_eq!(step.error.as_deref(), Some("transport error: registry unreachable"));
    assert!(step.output.is_empty());
    assert!(step.keywords_per_category.is_empty());
}

/// One source going down does not stop the others
#[tokio::test]
async fn test_failure_does_not_abort_run() {
    let registry = registry(vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .fails("Acme", "registry unreachable"),
        MockConnector::new(DomainType::News)
            .searches(&[KeywordCategory::PersonName])
            .retrieves(&[KeywordCategory::PersonName])
            .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")]),
        MockConnector::new(DomainType::Court)
            .searches(&[KeywordCategory::PersonName])
            .fails("John Doe", "court index unavailable"),
    ]);

    let domains = [DomainType::Registry, DomainType::News, DomainType::Court];
    let result = run(registry, config("Acme", 2, &domains)).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.total_steps, 4);
    assert_eq!(result.successful_steps, 2);
    assert_eq!(result.failed_steps, 2);

    let court_john = result
        .steps
        .iter()
        .find(|s| s.domain_type == DomainType::Court && s.search_parameter == "John Doe")
        .unwrap();
    assert_eq!(court_john.depth, 1);
    assert_eq!(court_john.error.as_deref(), Some("transport error: court index unavailable"));
    assert_run_invariants(&result);
}

/// A hung source fails its step after the per-step timeout
#[tokio::test]
async fn test_slow_connector_times_out() {
    let registry = registry(vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .with_delay(Duration::from_millis(1500)),
        MockConnector::new(DomainType::Court).searches(&[KeywordCategory::PersonName]),
    ]);

    let mut config = config("Acme", 1, &[DomainType::Registry, DomainType::Court]);
    config.step_timeout_secs = 1;

    let result = run(registry, config).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.steps[0].error.as_deref(), Some("Timeout after 1 seconds"));
    assert!(result.steps[1].success);
    assert_totals_consistent(&result);
}

/// An empty answer is a successful step with nothing to follow
#[tokio::test]
async fn test_no_matches_is_success() {
    let registry = registry(vec![MockConnector::new(DomainType::Registry)
        .searches(&[KeywordCategory::CompanyName])
        .retrieves(&[KeywordCategory::PersonName])]);

    let result = run(registry, config("Nobody Inc", 2, &[DomainType::Registry])).await;

    assert_eq!(result.successful_steps, 1);
    assert!(result.steps[0].output.is_empty());
    assert!(result.steps[0].keywords_per_category.is_empty());
}

fn crashing_registry() -> Vec<MockConnector> {
    vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .retrieves(&[KeywordCategory::PersonName])
            .panics("Acme"),
        MockConnector::new(DomainType::Court)
            .searches(&[KeywordCategory::PersonName])
            .retrieves(&[KeywordCategory::CompanyName]),
    ]
}

/// A connector that panics fails its own step, one call at a time
#[tokio::test]
async fn test_panicking_connector_fails_step_sequentially() {
    let domains = [DomainType::Registry, DomainType::Court];
    let result = run(registry(crashing_registry()), config("Acme", 2, &domains)).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.total_steps, 2);
    assert_eq!(result.steps[0].error.as_deref(), Some("connector panicked"));
    assert!(result.steps[1].success);
    assert_run_invariants(&result);
}

#[tokio::test]
async fn test_panicking_connector_fails_step_in_parallel_batch() {
    let domains = [DomainType::Registry, DomainType::Court];
    let mut config = config("Acme", 2, &domains);
    config.max_concurrent_steps = 2;

    let result = run(registry(crashing_registry()), config).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.failed_steps, 1);
    assert_eq!(result.steps[0].status(), StepStatus::Failed);
    assert!(result.steps[1].success);
}
