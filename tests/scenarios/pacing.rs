//! Test: courtesy delay between steps

use crate::helpers::*;
use dragnet::core::{DomainType, KeywordCategory, PipelineConfig, PipelineResult};
use std::time::{Duration, Instant};

const DOMAINS: [DomainType; 3] = [DomainType::Registry, DomainType::Court, DomainType::News];
const DELAY: Duration = Duration::from_millis(150);

/// Three seeds that find nothing
fn quiet_sources() -> Vec<MockConnector> {
    vec![
        MockConnector::new(DomainType::Registry).searches(&[KeywordCategory::CompanyName]),
        MockConnector::new(DomainType::Court).searches(&[KeywordCategory::PersonName]),
        MockConnector::new(DomainType::News).searches(&[KeywordCategory::PersonName]),
    ]
}

fn paced(concurrency: usize) -> PipelineConfig {
    let mut config = config("Acme", 0, &DOMAINS);
    config.delay_between_steps = DELAY;
    config.max_concurrent_steps = concurrency;
    config
}

fn start_gaps(result: &PipelineResult) -> Vec<Duration> {
    let starts: Vec<_> = result.steps.iter().map(|s| s.started_at.unwrap()).collect();
    starts
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).to_std().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_delay_separates_sequential_steps() {
    let began = Instant::now();
    let result = run(registry(quiet_sources()), paced(1)).await;
    let elapsed = began.elapsed();

    assert_eq!(result.total_steps, 3);
    assert!(elapsed >= DELAY * 2, "three steps took only {:?}", elapsed);
    for gap in start_gaps(&result) {
        assert!(gap >= DELAY - Duration::from_millis(5), "steps started {:?} apart", gap);
    }
}

/// No pause before the first step
#[tokio::test]
async fn test_first_step_starts_without_delay() {
    let result = run(registry(quiet_sources()), paced(1)).await;

    let first = result.steps[0].started_at.unwrap();
    let lead = (first - result.started_at).to_std().unwrap_or_default();
    assert!(lead < DELAY, "first step waited {:?}", lead);
}

/// The delay is between batches, not between the steps of one batch
#[tokio::test]
async fn test_parallel_batch_is_not_delayed_internally() {
    let began = Instant::now();
    let result = run(registry(quiet_sources()), paced(3)).await;

    assert_eq!(result.total_steps, 3);
    assert!(began.elapsed() < DELAY, "single batch took {:?}", began.elapsed());
    for gap in start_gaps(&result) {
        assert!(gap < DELAY);
    }
}
