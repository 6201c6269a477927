//! Test utility functions for dragnet

#![allow(dead_code)]

use async_trait::async_trait;
use dragnet::connector::{ConnectorError, ConnectorRegistry, DomainConnector, Record, WebResultRecord};
use dragnet::core::{DomainType, KeywordCategory, PipelineConfig, PipelineResult, RunDefaults, Settings};
use dragnet::execution::PipelineEngine;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Scripted connector
///
/// Every keyword maps to a canned answer: a list of `(category, value)`
/// findings or a transport failure. Unknown keywords return no matches.
/// Findings travel as web results whose snippet names the category.
pub struct MockConnector {
    domain: DomainType,
    searchable: Vec<KeywordCategory>,
    retrievable: Vec<KeywordCategory>,
    responses: HashMap<String, Result<Vec<Record>, ConnectorError>>,
    panics_on: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(domain: DomainType) -> Self {
        Self {
            domain,
            searchable: Vec::new(),
            retrievable: Vec::new(),
            responses: HashMap::new(),
            panics_on: HashSet::new(),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn searches(mut self, categories: &[KeywordCategory]) -> Self {
        self.searchable = categories.to_vec();
        self
    }

    pub fn retrieves(mut self, categories: &[KeywordCategory]) -> Self {
        self.retrievable = categories.to_vec();
        self
    }

    /// Answer `keyword` with one record per finding
    pub fn finds(mut self, keyword: &str, findings: &[(KeywordCategory, &str)]) -> Self {
        let records = findings
            .iter()
            .map(|(category, value)| {
                Record::WebResult(WebResultRecord {
                    title: value.to_string(),
                    url: format!("mock://{}/{}", self.domain, value),
                    snippet: Some(category.as_str().to_string()),
                })
            })
            .collect();
        self.responses.insert(keyword.to_lowercase(), Ok(records));
        self
    }

    /// Fail every search for `keyword`
    pub fn fails(mut self, keyword: &str, message: &str) -> Self {
        self.responses
            .insert(keyword.to_lowercase(), Err(ConnectorError::Transport(message.to_string())));
        self
    }

    /// Panic inside the search for `keyword`
    pub fn panics(mut self, keyword: &str) -> Self {
        self.panics_on.insert(keyword.to_lowercase());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Keywords searched so far, in call order
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    /// Shared high-water mark of concurrent searches
    pub fn share_peak(mut self, in_flight: &Arc<AtomicUsize>, peak: &Arc<AtomicUsize>) -> Self {
        self.in_flight = in_flight.clone();
        self.peak = peak.clone();
        self
    }
}

#[async_trait]
impl DomainConnector for MockConnector {
    fn domain_type(&self) -> DomainType {
        self.domain
    }

    fn searchable_categories(&self) -> &[KeywordCategory] {
        &self.searchable
    }

    fn retrievable_categories(&self) -> &[KeywordCategory] {
        &self.retrievable
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>, ConnectorError> {
        self.calls.lock().unwrap().push(query.to_string());
        if self.panics_on.contains(&query.to_lowercase()) {
            panic!("{} connector crashed on {:?}", self.domain, query);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses
            .get(&query.to_lowercase())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        match record {
            Record::WebResult(hit) if hit.snippet.as_deref() == Some(category.as_str()) => vec![hit.title.clone()],
            _ => Vec::new(),
        }
    }
}

/// Registry over the given connectors
pub fn registry(connectors: Vec<MockConnector>) -> Arc<ConnectorRegistry> {
    let mut registry = ConnectorRegistry::new();
    for connector in connectors {
        registry.register(Arc::new(connector));
    }
    Arc::new(registry)
}

/// Defaults with no courtesy delay
pub fn fast_defaults(domains: &[DomainType]) -> RunDefaults {
    RunDefaults {
        delay_between_steps_ms: 0,
        available_domains: domains.to_vec(),
        ..RunDefaults::default()
    }
}

pub fn fast_settings(domains: &[DomainType]) -> Settings {
    Settings {
        defaults: fast_defaults(domains),
        ..Settings::default()
    }
}

pub fn config(query: &str, max_depth: u32, domains: &[DomainType]) -> PipelineConfig {
    PipelineConfig::new(query, max_depth, true, &fast_defaults(domains))
}

/// Run a pipeline to completion in batch mode
pub async fn run(registry: Arc<ConnectorRegistry>, config: PipelineConfig) -> PipelineResult {
    let engine = PipelineEngine::new(registry);
    engine.check(&config).expect("configuration should be valid");
    engine.execute(config, Uuid::new_v4(), None).await
}

/// Registry finds people behind "Acme"; court searches people
pub fn acme_and_court() -> Vec<MockConnector> {
    vec![
        MockConnector::new(DomainType::Registry)
            .searches(&[KeywordCategory::CompanyName])
            .retrieves(&[KeywordCategory::PersonName])
            .finds("Acme", &[(KeywordCategory::PersonName, "John Doe")]),
        MockConnector::new(DomainType::Court)
            .searches(&[KeywordCategory::PersonName])
            .retrieves(&[KeywordCategory::CompanyName]),
    ]
}

/// Assert stats agree with the step list
pub fn assert_totals_consistent(result: &PipelineResult) {
    assert_eq!(result.total_steps, result.steps.len());
    assert_eq!(result.total_steps, result.successful_steps + result.failed_steps);
}

/// Assert no (domain, keyword) pair was searched twice
pub fn assert_no_duplicate_pairs(result: &PipelineResult) {
    let mut seen = HashSet::new();
    for step in &result.steps {
        assert!(
            seen.insert((step.domain_type, step.search_parameter.to_lowercase())),
            "duplicate step {} / {:?}",
            step.domain_type,
            step.search_parameter
        );
    }
}

/// Assert every derived step traces back to a keyword found one level up
pub fn assert_parent_keywords(result: &PipelineResult) {
    for step in result.steps.iter().filter(|s| s.depth > 0) {
        let parent = result
            .steps
            .iter()
            .find(|p| Some(p.id) == step.parent_step_id)
            .unwrap_or_else(|| panic!("step {:?} has no recorded parent", step.search_parameter));

        assert_eq!(parent.depth + 1, step.depth);
        assert!(
            parent.keywords(step.category).contains(&step.search_parameter),
            "{:?} not among the {} keywords of its parent",
            step.search_parameter,
            step.category
        );
    }
}

pub fn assert_depth_bound(result: &PipelineResult) {
    assert!(result.steps.iter().all(|s| s.depth <= result.config.max_depth));
    assert!(result.max_depth_reached <= result.config.max_depth);
}

/// All structural properties every finished run must satisfy
pub fn assert_run_invariants(result: &PipelineResult) {
    assert_totals_consistent(result);
    assert_depth_bound(result);
    assert_parent_keywords(result);
    if result.config.skip_duplicates {
        assert_no_duplicate_pairs(result);
    }
}
