//! Main execution engine - drives the frontier until it drains

use crate::{
    connector::ConnectorRegistry,
    core::{ConfigError, ExecutionStatus, PipelineConfig, PipelineResult, PipelineStep, RunSummary, StepOutcome},
    execution::{SchedulingStrategy, StepExecutor, StepScheduler},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events pushed to a streaming client
///
/// Wire form is `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// A step is about to search
    StepStarted(PipelineStep),
    /// A step finished, successfully or not
    Step(PipelineStep),
    /// Final run statistics
    Summary(RunSummary),
    Error { message: String },
    /// Terminates the stream
    Complete,
}

impl ExecutionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::StepStarted(_) => "step_started",
            ExecutionEvent::Step(_) => "step",
            ExecutionEvent::Summary(_) => "summary",
            ExecutionEvent::Error { .. } => "error",
            ExecutionEvent::Complete => "complete",
        }
    }
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Where engine events go during one run
///
/// Handlers observe every event; the channel, when present, is the
/// streaming client. A closed channel or failed send cancels the run.
pub struct EventSink {
    handlers: Vec<EventHandler>,
    channel: Option<mpsc::Sender<ExecutionEvent>>,
}

impl EventSink {
    fn new(handlers: Vec<EventHandler>, channel: Option<mpsc::Sender<ExecutionEvent>>) -> Self {
        Self { handlers, channel }
    }

    fn is_disconnected(&self) -> bool {
        self.channel.as_ref().is_some_and(|tx| tx.is_closed())
    }

    /// Wait out the courtesy delay; false if the client left meanwhile
    async fn pause(&self, delay: Duration) -> bool {
        match &self.channel {
            Some(tx) => tokio::select! {
                _ = tokio::time::sleep(delay) => !tx.is_closed(),
                _ = tx.closed() => false,
            },
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    /// Deliver an event; false if the streaming client is gone
    async fn emit(&self, event: ExecutionEvent) -> bool {
        for handler in &self.handlers {
            handler(&event);
        }

        match &self.channel {
            Some(tx) => tx.send(event).await.is_ok(),
            None => true,
        }
    }
}

/// Main pipeline execution engine
pub struct PipelineEngine {
    registry: Arc<ConnectorRegistry>,
    event_handlers: Vec<EventHandler>,
}

impl PipelineEngine {
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        Self {
            registry,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.registry
    }

    /// Reject a configuration before any work starts
    pub fn check(&self, config: &PipelineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.registry.ensure_available(&config.available_domains)
    }

    /// Run a pipeline to completion
    ///
    /// With `events`, every step is pushed as it starts and finishes and the
    /// run stops as soon as the receiver goes away. The configuration is
    /// expected to have passed [`check`](Self::check).
    pub async fn execute(
        &self,
        config: PipelineConfig,
        pipeline_id: Uuid,
        events: Option<mpsc::Sender<ExecutionEvent>>,
    ) -> PipelineResult {
        info!(
            "Starting pipeline {} for {:?} (max depth {}, {} domains)",
            pipeline_id,
            config.query,
            config.max_depth,
            config.available_domains.len()
        );

        let scheduler = StepScheduler::seed(config.clone(), pipeline_id, &self.registry);
        let result = PipelineResult::new(pipeline_id, config);
        self.drive(scheduler, result, events).await
    }

    /// Continue a run from its saved steps
    ///
    /// Completed steps are kept as they are; pending ones are executed and
    /// expanded as if the run had never stopped.
    pub async fn resume(
        &self,
        previous: PipelineResult,
        events: Option<mpsc::Sender<ExecutionEvent>>,
    ) -> PipelineResult {
        info!("Resuming pipeline {} ({} steps recorded)", previous.id, previous.steps.len());

        let mut result = previous;
        let steps = std::mem::take(&mut result.steps);
        let scheduler = StepScheduler::resume(result.config.clone(), steps);
        result.completed_at = None;
        self.drive(scheduler, result, events).await
    }

    async fn drive(
        &self,
        mut scheduler: StepScheduler,
        mut result: PipelineResult,
        events: Option<mpsc::Sender<ExecutionEvent>>,
    ) -> PipelineResult {
        let sink = EventSink::new(self.event_handlers.clone(), events);
        let strategy = SchedulingStrategy::from_concurrency(result.config.max_concurrent_steps);
        let executor = StepExecutor::new(result.config.step_timeout_secs);
        let semaphore = Arc::new(Semaphore::new(strategy.batch_size()));
        let delay = result.config.delay_between_steps;
        let mut first = true;
        result.status = ExecutionStatus::Running;

        let status = loop {
            if sink.is_disconnected() {
                warn!("Stream receiver gone, cancelling pipeline {}", result.id);
                break ExecutionStatus::Cancelled;
            }

            if !scheduler.has_pending() {
                break ExecutionStatus::Completed;
            }

            if !first && !delay.is_zero() && !sink.pause(delay).await {
                warn!("Stream receiver gone during delay, cancelling pipeline {}", result.id);
                break ExecutionStatus::Cancelled;
            }
            first = false;

            let batch = scheduler.next_batch(strategy.batch_size());
            if !self.start_batch(&mut scheduler, &batch, &sink).await {
                scheduler.release(&batch);
                warn!("Stream receiver gone, cancelling pipeline {}", result.id);
                break ExecutionStatus::Cancelled;
            }

            let outcomes = self.run_batch(&scheduler, &batch, executor, &semaphore).await;

            let mut delivered = true;
            for (index, outcome) in batch.iter().copied().zip(outcomes) {
                // Expand even when undelivered so a resumed run still sees the children
                scheduler.complete(index, outcome);
                scheduler.expand(index, &self.registry);
                if delivered {
                    delivered = sink.emit(ExecutionEvent::Step(scheduler.step(index).clone())).await;
                }
            }

            if !delivered {
                warn!("Stream receiver gone, cancelling pipeline {}", result.id);
                break ExecutionStatus::Cancelled;
            }
        };

        result.finish(status, scheduler.into_steps());
        info!(
            "Pipeline {} finished: {} ({} steps, {} ok, {} failed, depth {})",
            result.id,
            result.status,
            result.total_steps,
            result.successful_steps,
            result.failed_steps,
            result.max_depth_reached
        );
        result
    }

    /// Mark a batch started and announce it
    async fn start_batch(&self, scheduler: &mut StepScheduler, batch: &[usize], sink: &EventSink) -> bool {
        for &index in batch {
            scheduler.mark_started(index);
            if !sink.emit(ExecutionEvent::StepStarted(scheduler.step(index).clone())).await {
                return false;
            }
        }
        true
    }

    /// Run the connector calls of one batch, returning outcomes in batch order
    ///
    /// Every call gets its own task, so a panicking connector fails its step
    /// instead of the run.
    async fn run_batch(
        &self,
        scheduler: &StepScheduler,
        batch: &[usize],
        executor: StepExecutor,
        semaphore: &Arc<Semaphore>,
    ) -> Vec<StepOutcome> {
        if batch.len() > 1 {
            debug!("Running batch of {} steps", batch.len());
        }

        let tasks: Vec<_> = batch
            .iter()
            .map(|&index| {
                let step = scheduler.step(index).clone();
                let connector = self.registry.get(step.domain_type).cloned();
                let semaphore = semaphore.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    executor.execute(connector.as_ref(), &step).await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (task, &index) in tasks.into_iter().zip(batch) {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let step = scheduler.step(index);
                    error!("Search task for {} / {:?} died: {}", step.domain_type, step.search_parameter, e);
                    StepOutcome::Failure { error: task_failure(&e) }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

fn task_failure(e: &JoinError) -> String {
    if e.is_panic() {
        "connector panicked".to_string()
    } else {
        "step task aborted".to_string()
    }
}
