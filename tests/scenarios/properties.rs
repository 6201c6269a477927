//! Test: structural properties over a densely connected source graph

use crate::helpers::*;
use dragnet::connector::{extract_categories, DomainConnector};
use dragnet::core::{DomainType, KeywordCategory, PipelineResult};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use KeywordCategory::{Address, CompanyName, PersonName, TaxId};

const DOMAINS: [DomainType; 4] = [DomainType::Registry, DomainType::Court, DomainType::Tax, DomainType::News];

/// Four sources that keep pointing at each other
fn web() -> Vec<MockConnector> {
    vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[CompanyName])
            .retrieves(&[PersonName, TaxId])
            .finds("Acme", &[(PersonName, "John Doe"), (TaxId, "12.345.678/0001-90")])
            .finds("Doe Holdings", &[(PersonName, "John Doe"), (PersonName, "Mary Major")])
            .finds("Globex", &[(PersonName, "Jane Roe")]),
        MockConnector::new(DomainType::Court)
            .searches(&[PersonName, CompanyName])
            .retrieves(&[PersonName, CompanyName])
            .finds("John Doe", &[(CompanyName, "Doe Holdings"), (PersonName, "Richard Roe")])
            .finds("Acme", &[(CompanyName, "Globex")])
            .fails("Jane Roe", "court index unavailable"),
        MockConnector::new(DomainType::Tax)
            .searches(&[TaxId])
            .retrieves(&[CompanyName, PersonName, Address])
            .finds(
                "12.345.678/0001-90",
                &[(CompanyName, "Acme"), (CompanyName, "ACME Industries"), (PersonName, " John  Doe "), (Address, "1 Main St")],
            ),
        MockConnector::new(DomainType::News)
            .searches(&[PersonName])
            .retrieves(&[CompanyName, PersonName])
            .finds("John Doe", &[(CompanyName, "Initech"), (PersonName, "John Doe")])
            .finds("Mary Major", &[(CompanyName, "Doe Holdings")]),
    ]
}

async fn run_web(max_depth: u32, skip_duplicates: bool, concurrency: usize) -> PipelineResult {
    let mut config = config("Acme", max_depth, &DOMAINS);
    config.skip_duplicates = skip_duplicates;
    config.max_concurrent_steps = concurrency;
    run(registry(web()), config).await
}

#[tokio::test]
async fn test_invariants_hold_across_depths() {
    for max_depth in 0..=4 {
        let result = run_web(max_depth, true, 1).await;
        assert_run_invariants(&result);
    }
}

#[tokio::test]
async fn test_invariants_hold_without_duplicate_suppression() {
    let result = run_web(3, false, 1).await;
    assert_totals_consistent(&result);
    assert_depth_bound(&result);
    assert_parent_keywords(&result);
    assert!(result.steps.len() > run_web(3, true, 1).await.steps.len());
}

#[tokio::test]
async fn test_extracted_keywords_are_normalized() {
    let result = run_web(1, true, 1).await;
    let tax_step = result
        .steps
        .iter()
        .find(|s| s.domain_type == DomainType::Tax && s.depth == 1)
        .unwrap();

    assert_eq!(tax_step.keywords(PersonName), ["John Doe".to_string()]);
    assert_eq!(
        tax_step.keywords(CompanyName),
        ["Acme".to_string(), "ACME Industries".to_string()]
    );
    // Addresses are found but nothing searches by them
    assert_eq!(tax_step.keywords(Address).len(), 1);
    assert!(result.steps.iter().all(|s| s.category != Address));
}

/// Extraction over the same records always yields the same map
#[tokio::test]
async fn test_extraction_is_idempotent() {
    let result = run_web(2, true, 1).await;
    let connectors = web();

    for step in result.steps.iter().filter(|s| s.success) {
        let connector = connectors.iter().find(|c| c.domain_type() == step.domain_type).unwrap();
        let first = extract_categories(connector, &step.output);
        let second = extract_categories(connector, &step.output);
        assert_eq!(first, second);
        assert_eq!(first, step.keywords_per_category);
    }
}

fn discovered(result: &PipelineResult) -> BTreeSet<(DomainType, String, u32)> {
    result
        .steps
        .iter()
        .map(|s| (s.domain_type, s.search_parameter.to_lowercase(), s.depth))
        .collect()
}

/// Parallel batches explore exactly what the sequential walk explores
#[tokio::test]
async fn test_parallel_matches_sequential() {
    let sequential = run_web(3, true, 1).await;
    let parallel = run_web(3, true, 4).await;

    assert_run_invariants(&parallel);
    assert_eq!(discovered(&sequential), discovered(&parallel));
    assert_eq!(sequential.successful_steps, parallel.successful_steps);
    assert_eq!(sequential.failed_steps, parallel.failed_steps);
}

#[tokio::test]
async fn test_parallel_batches_respect_concurrency() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let connectors = web()
        .into_iter()
        .map(|c| c.with_delay(Duration::from_millis(50)).share_peak(&in_flight, &peak))
        .collect();

    let mut config = config("Acme", 1, &DOMAINS);
    config.max_concurrent_steps = 3;
    let result = run(registry(connectors), config).await;

    assert_run_invariants(&result);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak > 1, "expected overlapping searches, peak was {}", peak);
    assert!(peak <= 3, "concurrency bound exceeded, peak was {}", peak);
}

/// Sequential mode never overlaps connector calls
#[tokio::test]
async fn test_sequential_never_overlaps() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let connectors = web()
        .into_iter()
        .map(|c| c.with_delay(Duration::from_millis(10)).share_peak(&in_flight, &peak))
        .collect();

    let result = run(registry(connectors), config("Acme", 1, &DOMAINS)).await;

    assert_run_invariants(&result);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}
