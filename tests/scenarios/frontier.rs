//! Test: frontier seeding, expansion and termination

use crate::helpers::*;
use dragnet::core::{DomainType, ExecutionStatus, KeywordCategory};

/// A person name nobody can search ends the run at the seed
#[tokio::test]
async fn test_unsearchable_keywords_do_not_expand() {
    let registry = registry(vec![MockConnector::new(DomainType::Registry)
        .searches(&[KeywordCategory::CompanyName])
        .retrieves(&[KeywordCategory::PersonName])
        .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")])]);

    let result = run(registry, config("Acme", 2, &[DomainType::Registry])).await;

    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.steps.len(), 1);

    let seed = &result.steps[0];
    assert_eq!(seed.domain_type, DomainType::Registry);
    assert_eq!(seed.search_parameter, "Acme");
    assert_eq!(seed.category, KeywordCategory::CompanyName);
    assert!(seed.success);
    assert_eq!(seed.keywords(KeywordCategory::PersonName), ["John Doe".to_string()]);
    assert_eq!(result.max_depth_reached, 0);
    assert_run_invariants(&result);
}

/// A second domain accepting person names picks up the extracted name
#[tokio::test]
async fn test_keyword_expands_into_accepting_domain() {
    let domains = [DomainType::Registry, DomainType::Court];
    let result = run(registry(acme_and_court()), config("Acme", 2, &domains)).await;

    assert_eq!(result.status, ExecutionStatus::Completed);

    let seeds: Vec<_> = result.steps_at_depth(0).collect();
    assert_eq!(seeds.len(), 2);
    assert_eq!(seeds[0].domain_type, DomainType::Registry);
    assert_eq!(seeds[1].domain_type, DomainType::Court);
    assert_eq!(seeds[1].category, KeywordCategory::PersonName);

    let derived: Vec<_> = result.steps_at_depth(1).collect();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].domain_type, DomainType::Court);
    assert_eq!(derived[0].search_parameter, "John Doe");
    assert_eq!(derived[0].category, KeywordCategory::PersonName);
    assert_eq!(derived[0].parent_step_id, Some(seeds[0].id));

    assert_eq!(result.max_depth_reached, 1);
    assert_run_invariants(&result);
}

/// Depth zero runs the seeds and nothing else
#[tokio::test]
async fn test_max_depth_zero_runs_only_seeds() {
    let connectors = acme_and_court();
    let court_calls = connectors[1].calls();
    let domains = [DomainType::Registry, DomainType::Court];

    let result = run(registry(connectors), config("Acme", 0, &domains)).await;

    assert_eq!(result.steps.len(), 2);
    assert!(result.steps.iter().all(|s| s.depth == 0));
    // Keywords are still extracted, just never followed
    assert_eq!(result.steps[0].keywords(KeywordCategory::PersonName).len(), 1);
    assert_eq!(*court_calls.lock().unwrap(), vec!["Acme".to_string()]);
    assert_eq!(result.max_depth_reached, 0);
}

/// Steps run breadth-first: all of depth 0, then depth 1, and so on
#[tokio::test]
async fn test_breadth_first_order() {
    let domains = [DomainType::Registry, DomainType::Court, DomainType::News];
    let registry = registry(vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .retrieves(&[KeywordCategory::PersonName])
            .finds("Acme", &[(KeywordCategory::PersonName, "John Doe"), (KeywordCategory::PersonName, "Jane Roe")]),
        MockConnector::new(DomainType::Court)
            .searches(&[KeywordCategory::PersonName])
            .retrieves(&[KeywordCategory::CompanyName])
            .finds("John Doe", &[(KeywordCategory::CompanyName, "Doe Holdings")]),
        MockConnector::new(DomainType::News)
            .searches(&[KeywordCategory::PersonName, KeywordCategory::CompanyName])
            .retrieves(&[]),
    ]);

    let result = run(registry, config("Acme", 3, &domains)).await;

    let depths: Vec<u32> = result.steps.iter().map(|s| s.depth).collect();
    let mut sorted = depths.clone();
    sorted.sort();
    assert_eq!(depths, sorted, "steps must be recorded level by level");

    let executed: Vec<_> = result.steps.iter().filter_map(|s| s.started_at).collect();
    assert!(executed.windows(2).all(|w| w[0] <= w[1]));

    // "Doe Holdings" reaches news and registry at depth 2
    let depth_two: Vec<_> = result
        .steps_at_depth(2)
        .map(|s| (s.domain_type, s.search_parameter.as_str()))
        .collect();
    assert!(depth_two.contains(&(DomainType::Registry, "Doe Holdings")));
    assert!(depth_two.contains(&(DomainType::News, "Doe Holdings")));
    assert_run_invariants(&result);
}

/// A domain never receives keywords it produced itself
#[tokio::test]
async fn test_no_expansion_into_source_domain() {
    let registry = registry(vec![MockConnector::new(DomainType::News)
        .searches(&[KeywordCategory::PersonName])
        .retrieves(&[KeywordCategory::PersonName])
        .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")])]);

    let result = run(registry, config("Acme", 2, &[DomainType::News])).await;
    assert_eq!(result.steps.len(), 1);
}

#[tokio::test]
async fn test_expansion_into_source_domain_when_enabled() {
    let registry = registry(vec![MockConnector::new(DomainType::News)
        .searches(&[KeywordCategory::PersonName])
        .retrieves(&[KeywordCategory::PersonName])
        .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")])]);

    let mut config = config("Acme", 2, &[DomainType::News]);
    config.expand_into_source_domain = true;

    let result = run(registry, config).await;
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.steps[1].search_parameter, "John Doe");
    assert_eq!(result.steps[1].domain_type, DomainType::News);
}

fn cycle() -> Vec<MockConnector> {
    vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .retrieves(&[KeywordCategory::PersonName])
            .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")]),
        MockConnector::new(DomainType::Court)
            .searches(&[KeywordCategory::PersonName])
            .retrieves(&[KeywordCategory::CompanyName])
            .finds("John Doe", &[(KeywordCategory::CompanyName, "ACME")]),
    ]
}

/// The visited set ignores case, so a cycle back to the seed stops
#[tokio::test]
async fn test_duplicates_skipped_case_insensitively() {
    let domains = [DomainType::Registry, DomainType::Court];
    let result = run(registry(cycle()), config("Acme", 4, &domains)).await;

    let pairs: Vec<_> = result
        .steps
        .iter()
        .map(|s| (s.domain_type, s.search_parameter.as_str(), s.depth))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (DomainType::Registry, "Acme", 0),
            (DomainType::Court, "Acme", 0),
            (DomainType::Court, "John Doe", 1),
        ]
    );
    assert_run_invariants(&result);
}

/// Without duplicate suppression the cycle is bounded only by depth
#[tokio::test]
async fn test_duplicates_allowed() {
    let domains = [DomainType::Registry, DomainType::Court];
    let mut config = config("Acme", 2, &domains);
    config.skip_duplicates = false;

    let result = run(registry(cycle()), config).await;

    let registry_acme = result
        .steps
        .iter()
        .filter(|s| s.domain_type == DomainType::Registry && s.search_parameter.eq_ignore_ascii_case("acme"))
        .count();
    assert_eq!(registry_acme, 2);
    assert_eq!(result.max_depth_reached, 2);
    assert_run_invariants(&result);
}

/// The global ceiling stops admission even when keywords keep coming
#[tokio::test]
async fn test_step_ceiling() {
    let names: Vec<String> = (0..10).map(|i| format!("Person {}", i)).collect();
    let findings: Vec<_> = names.iter().map(|n| (KeywordCategory::PersonName, n.as_str())).collect();

    let registry = registry(vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .retrieves(&[KeywordCategory::PersonName])
            .finds("Acme", &findings),
        MockConnector::new(DomainType::Court).searches(&[KeywordCategory::PersonName]),
    ]);

    let mut config = config("Acme", 3, &[DomainType::Registry, DomainType::Court]);
    config.max_total_steps = 5;

    let result = run(registry, config).await;
    assert_eq!(result.steps.len(), 5);
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.steps.iter().all(|s| !s.is_pending()));
    assert_run_invariants(&result);
}

/// Domains listed in the configuration drive seeding order
#[tokio::test]
async fn test_seed_order_follows_configuration() {
    let domains = [DomainType::Court, DomainType::Registry];
    let result = run(registry(acme_and_court()), config("Acme", 0, &domains)).await;

    let seeded: Vec<_> = result.steps.iter().map(|s| s.domain_type).collect();
    assert_eq!(seeded, vec![DomainType::Court, DomainType::Registry]);
}
