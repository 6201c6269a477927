//! Step scheduler - owns the frontier of pending searches

use crate::connector::ConnectorRegistry;
use crate::core::{DomainType, KeywordCategory, PipelineConfig, PipelineStep, StepOutcome};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

/// How many frontier entries are handed out at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingStrategy {
    /// One step at a time, in discovery order
    #[default]
    Sequential,

    /// Up to N same-depth steps against distinct domains
    LimitedParallel(usize),
}

impl SchedulingStrategy {
    pub fn from_concurrency(max_concurrent_steps: usize) -> Self {
        if max_concurrent_steps > 1 {
            SchedulingStrategy::LimitedParallel(max_concurrent_steps)
        } else {
            SchedulingStrategy::Sequential
        }
    }

    pub fn batch_size(&self) -> usize {
        match self {
            SchedulingStrategy::Sequential => 1,
            SchedulingStrategy::LimitedParallel(max) => (*max).max(1),
        }
    }
}

/// Breadth-first frontier over (domain, keyword) pairs
///
/// Steps are stored in discovery order and referred to by index. Every
/// mutation goes through `&mut self`, so the engine loop is the single
/// writer of the queue, the visited set and the step list.
pub struct StepScheduler {
    config: PipelineConfig,
    steps: Vec<PipelineStep>,
    queue: VecDeque<usize>,
    visited: HashSet<(DomainType, String)>,
    ceiling_reached: bool,
}

impl StepScheduler {
    /// Build the initial frontier: one seed step per available domain
    ///
    /// Domains without a registered connector are skipped.
    pub fn seed(config: PipelineConfig, pipeline_id: Uuid, registry: &ConnectorRegistry) -> Self {
        let mut scheduler = Self::empty(config);

        for domain in scheduler.config.available_domains.clone() {
            let Some(connector) = registry.get(domain) else {
                warn!("No connector registered for {}, skipping seed", domain);
                continue;
            };

            let step = PipelineStep::seed(pipeline_id, domain, &scheduler.config.query, connector.seed_category());
            scheduler.admit(step);
        }

        debug!("Seeded frontier with {} steps", scheduler.queue.len());
        scheduler
    }

    /// Rebuild scheduler state from a saved step list
    ///
    /// The visited set is reconstructed from every recorded (domain, keyword)
    /// pair and steps that never completed go back on the queue in discovery
    /// order.
    pub fn resume(config: PipelineConfig, steps: Vec<PipelineStep>) -> Self {
        let mut scheduler = Self::empty(config);

        for step in steps {
            scheduler.visited.insert(visit_key(step.domain_type, &step.search_parameter));
            if step.is_pending() {
                scheduler.queue.push_back(scheduler.steps.len());
            }
            scheduler.steps.push(step);
        }

        scheduler.ceiling_reached = scheduler.steps.len() >= scheduler.config.max_total_steps;
        debug!(
            "Resumed frontier: {} steps recorded, {} pending",
            scheduler.steps.len(),
            scheduler.queue.len()
        );
        scheduler
    }

    fn empty(config: PipelineConfig) -> Self {
        Self {
            config,
            steps: Vec::new(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            ceiling_reached: false,
        }
    }

    /// Next step in FIFO order
    pub fn next(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    /// Take a batch of same-depth steps against distinct domains
    ///
    /// The front step is always taken; the rest are picked from the same
    /// depth level in queue order, skipping domains already in the batch.
    pub fn next_batch(&mut self, limit: usize) -> Vec<usize> {
        let Some(first) = self.next() else {
            return Vec::new();
        };

        let depth = self.steps[first].depth;
        let mut domains = HashSet::from([self.steps[first].domain_type]);
        let mut taken = Vec::new();

        for (position, &candidate) in self.queue.iter().enumerate() {
            if taken.len() + 1 >= limit {
                break;
            }
            let step = &self.steps[candidate];
            if step.depth != depth {
                break;
            }
            if domains.insert(step.domain_type) {
                taken.push((position, candidate));
            }
        }

        for (position, _) in taken.iter().rev() {
            self.queue.remove(*position);
        }

        let mut batch = vec![first];
        batch.extend(taken.into_iter().map(|(_, candidate)| candidate));
        batch
    }

    pub fn step(&self, index: usize) -> &PipelineStep {
        &self.steps[index]
    }

    pub fn mark_started(&mut self, index: usize) {
        self.steps[index].mark_started();
    }

    /// Undo [`mark_started`](Self::mark_started) for steps that never ran
    pub fn release(&mut self, batch: &[usize]) {
        for &index in batch {
            self.steps[index].clear_started();
        }
    }

    /// Record a finished search on its step
    pub fn complete(&mut self, index: usize, outcome: StepOutcome) -> bool {
        self.steps[index].complete(outcome)
    }

    /// Derive child steps from a completed step's keywords
    ///
    /// For each extracted category, every available domain that accepts the
    /// category gets one step per keyword, unless the keyword is empty, the
    /// pair was already visited, the child would exceed `max_depth` or the
    /// global step ceiling is reached. Returns the number of admitted steps.
    pub fn expand(&mut self, index: usize, registry: &ConnectorRegistry) -> usize {
        let parent = &self.steps[index];
        if !parent.success || parent.depth + 1 > self.config.max_depth {
            return 0;
        }

        let mut children = Vec::new();
        for (category, keywords) in &parent.keywords_per_category {
            for domain in self.target_domains(parent.domain_type, *category, registry) {
                for keyword in keywords {
                    if keyword.trim().is_empty() {
                        continue;
                    }
                    children.push(PipelineStep::child(parent, domain, keyword, *category));
                }
            }
        }

        let mut admitted = 0;
        for child in children {
            if self.admit(child) {
                admitted += 1;
            }
        }
        if admitted > 0 {
            debug!(
                "Step {} / {:?} expanded into {} steps",
                self.steps[index].domain_type, self.steps[index].search_parameter, admitted
            );
        }
        admitted
    }

    /// Available domains that accept `category`, in configuration order
    fn target_domains(
        &self,
        source: DomainType,
        category: KeywordCategory,
        registry: &ConnectorRegistry,
    ) -> Vec<DomainType> {
        self.config
            .available_domains
            .iter()
            .copied()
            .filter(|domain| self.config.expand_into_source_domain || *domain != source)
            .filter(|domain| registry.get(*domain).is_some_and(|c| c.accepts(category)))
            .collect()
    }

    /// Check-then-mark and enqueue one step
    fn admit(&mut self, step: PipelineStep) -> bool {
        if self.steps.len() >= self.config.max_total_steps {
            if !self.ceiling_reached {
                warn!(
                    "Step ceiling of {} reached, no further steps will be admitted",
                    self.config.max_total_steps
                );
                self.ceiling_reached = true;
            }
            return false;
        }

        let fresh = self.visited.insert(visit_key(step.domain_type, &step.search_parameter));
        if !fresh && self.config.skip_duplicates {
            return false;
        }

        self.queue.push_back(self.steps.len());
        self.steps.push(step);
        true
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ceiling_reached(&self) -> bool {
        self.ceiling_reached
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// All steps in discovery order
    pub fn into_steps(self) -> Vec<PipelineStep> {
        self.steps
    }
}

fn visit_key(domain: DomainType, keyword: &str) -> (DomainType, String) {
    (domain, keyword.trim().to_lowercase())
}
