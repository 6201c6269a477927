//! Run submission: batch (start + poll) and streaming delivery

use crate::core::{ExecutionStatus, PipelineConfig, PipelineResult, RunDefaults, RunSummary, Settings};
use crate::delivery::{PollResponse, StepsResponse};
use crate::error::PipelineError;
use crate::execution::{ExecutionEvent, PipelineEngine};
use crate::persistence::ResultStore;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A streaming run handed back to the caller
pub struct RunStream {
    pub pipeline_id: Uuid,
    /// Events in execution order, ending with `complete` unless cancelled
    pub events: mpsc::Receiver<ExecutionEvent>,
    /// Resolves to the final result once the run has stopped and been saved
    pub handle: JoinHandle<PipelineResult>,
}

/// How many unsaved-run errors are remembered for `poll`
const MAX_UNSAVED: usize = 64;

/// Bookkeeping shared between the service and its run tasks
#[derive(Default)]
struct Tracker {
    /// Runs whose task has not finished saving yet
    running: HashSet<Uuid>,
    /// Batch run tasks nobody has waited on yet
    handles: HashMap<Uuid, JoinHandle<PipelineResult>>,
    /// Runs that finished but could not be saved, oldest first
    unsaved: VecDeque<(Uuid, String)>,
}

impl Tracker {
    /// Forget a run whose task is done with it
    fn settle(&mut self, pipeline_id: Uuid, saved: &Result<(), String>) {
        self.running.remove(&pipeline_id);
        self.handles.remove(&pipeline_id);
        self.unsaved.retain(|(id, _)| *id != pipeline_id);

        if let Err(message) = saved {
            if self.unsaved.len() == MAX_UNSAVED {
                self.unsaved.pop_front();
            }
            self.unsaved.push_back((pipeline_id, message.clone()));
        }
    }

    fn unsaved(&self, pipeline_id: Uuid) -> Option<&str> {
        self.unsaved
            .iter()
            .find(|(id, _)| *id == pipeline_id)
            .map(|(_, message)| message.as_str())
    }
}

/// Front door for pipeline runs
///
/// Every run executes on its own task. Batch runs are detached from the
/// caller and become visible to `poll` only once they have finished and
/// been saved. Streaming runs stop as soon as the event receiver is dropped.
pub struct PipelineService {
    engine: Arc<PipelineEngine>,
    store: Arc<dyn ResultStore>,
    defaults: RunDefaults,
    event_buffer: usize,
    tracker: Arc<Mutex<Tracker>>,
}

impl PipelineService {
    pub fn new(engine: Arc<PipelineEngine>, store: Arc<dyn ResultStore>, settings: &Settings) -> Self {
        Self {
            engine,
            store,
            defaults: settings.defaults.clone(),
            event_buffer: settings.stream.event_buffer.max(1),
            tracker: Arc::new(Mutex::new(Tracker::default())),
        }
    }

    pub fn defaults(&self) -> &RunDefaults {
        &self.defaults
    }

    /// Build and check the configuration for a run
    pub fn prepare(&self, query: &str, max_depth: u32, skip_duplicates: bool) -> Result<PipelineConfig, PipelineError> {
        let config = PipelineConfig::new(query, max_depth, skip_duplicates, &self.defaults);
        self.engine.check(&config)?;
        Ok(config)
    }

    /// Start a batch run and return its id immediately
    pub fn start_run(&self, query: &str, max_depth: u32, skip_duplicates: bool) -> Result<Uuid, PipelineError> {
        let config = self.prepare(query, max_depth, skip_duplicates)?;
        self.start_with(config)
    }

    /// Start a batch run from an explicit configuration
    pub fn start_with(&self, config: PipelineConfig) -> Result<Uuid, PipelineError> {
        self.engine.check(&config)?;

        let pipeline_id = Uuid::new_v4();
        let engine = self.engine.clone();
        let fallback = PipelineResult::new(pipeline_id, config.clone());
        self.spawn_run(fallback, async move { engine.execute(config, pipeline_id, None).await });

        info!("Accepted batch run {}", pipeline_id);
        Ok(pipeline_id)
    }

    /// Re-run the pending part of a saved run under the same id
    pub async fn resume_run(&self, pipeline_id: Uuid) -> Result<Uuid, PipelineError> {
        if lock(&self.tracker).running.contains(&pipeline_id) {
            return Err(PipelineError::NotReady(pipeline_id));
        }

        let previous = self
            .store
            .load_result(pipeline_id)
            .await
            .map_err(PipelineError::Persistence)?
            .ok_or(PipelineError::NotFound(pipeline_id))?;
        self.engine.check(&previous.config)?;

        let engine = self.engine.clone();
        let fallback = previous.clone();
        self.spawn_run(fallback, async move { engine.resume(previous, None).await });

        info!("Resuming run {}", pipeline_id);
        Ok(pipeline_id)
    }

    /// Start a streaming run
    ///
    /// Events arrive as `step_started` / `step` pairs, then `summary`, an
    /// `error` if the run died or could not be saved, and finally `complete`.
    /// Dropping the receiver cancels the run; a cancelled run sends nothing
    /// further.
    pub fn stream_run(&self, query: &str, max_depth: u32, skip_duplicates: bool) -> Result<RunStream, PipelineError> {
        let config = self.prepare(query, max_depth, skip_duplicates)?;
        self.stream_with(config)
    }

    /// Start a streaming run from an explicit configuration
    pub fn stream_with(&self, config: PipelineConfig) -> Result<RunStream, PipelineError> {
        self.engine.check(&config)?;

        let pipeline_id = Uuid::new_v4();
        let (tx, events) = mpsc::channel(self.event_buffer);
        let engine = self.engine.clone();
        let store = self.store.clone();
        let tracker = self.tracker.clone();
        let fallback = PipelineResult::new(pipeline_id, config.clone());

        lock(&tracker).running.insert(pipeline_id);
        let handle = tokio::spawn(async move {
            let sender = tx.clone();
            let result = guarded(fallback, async move { engine.execute(config, pipeline_id, Some(sender)).await }).await;
            let saved = persist(store.as_ref(), &tracker, &result).await;

            if result.status == ExecutionStatus::Cancelled {
                return result;
            }

            let mut tail = vec![ExecutionEvent::Summary(result.summary())];
            if result.status == ExecutionStatus::Failed {
                tail.push(ExecutionEvent::Error {
                    message: "pipeline stopped unexpectedly".to_string(),
                });
            }
            if let Err(message) = saved {
                tail.push(ExecutionEvent::Error { message });
            }
            tail.push(ExecutionEvent::Complete);

            for event in tail {
                if tx.send(event).await.is_err() {
                    warn!("Stream receiver for {} gone before the final events", pipeline_id);
                    break;
                }
            }
            result
        });

        info!("Accepted streaming run {}", pipeline_id);
        Ok(RunStream {
            pipeline_id,
            events,
            handle,
        })
    }

    /// Spawn a detached batch run
    ///
    /// The handle is registered under the tracker lock before the task can
    /// settle, so a finished task always removes its own entry.
    fn spawn_run<F>(&self, fallback: PipelineResult, run: F)
    where
        F: Future<Output = PipelineResult> + Send + 'static,
    {
        let pipeline_id = fallback.id;
        let store = self.store.clone();
        let tracker = self.tracker.clone();

        let mut guard = lock(&self.tracker);
        guard.running.insert(pipeline_id);
        let handle = tokio::spawn(async move {
            let result = guarded(fallback, run).await;
            let _ = persist(store.as_ref(), &tracker, &result).await;
            result
        });
        guard.handles.insert(pipeline_id, handle);
    }

    /// Wait for a batch run to finish
    ///
    /// Runs that already settled, or were not started by this service
    /// instance, are read back from the store.
    pub async fn wait(&self, pipeline_id: Uuid) -> Result<PipelineResult, PipelineError> {
        let handle = lock(&self.tracker).handles.remove(&pipeline_id);

        match handle {
            Some(handle) => handle.await.map_err(|e| {
                error!("Run task {} failed: {}", pipeline_id, e);
                lock(&self.tracker).running.remove(&pipeline_id);
                PipelineError::Aborted(pipeline_id)
            }),
            None => match self.store.load_result(pipeline_id).await {
                Ok(Some(result)) => Ok(result),
                Ok(None) => Err(self.missing(pipeline_id)),
                Err(e) => Err(PipelineError::Persistence(e)),
            },
        }
    }

    /// Runs accepted by this service that have not been saved yet
    pub fn active_runs(&self) -> usize {
        lock(&self.tracker).running.len()
    }

    /// Snapshot of a finished run
    pub async fn poll(&self, pipeline_id: Uuid) -> Result<PollResponse, PipelineError> {
        match self.store.load_result(pipeline_id).await {
            Ok(Some(result)) => Ok(PollResponse::new(result)),
            Ok(None) => Err(self.missing(pipeline_id)),
            Err(e) => Err(PipelineError::Persistence(e)),
        }
    }

    /// Steps of a finished run in discovery order
    pub async fn list_steps(&self, pipeline_id: Uuid) -> Result<StepsResponse, PipelineError> {
        let steps = self
            .store
            .list_steps(pipeline_id)
            .await
            .map_err(PipelineError::Persistence)?;

        if steps.is_empty() {
            let known = self
                .store
                .load_result(pipeline_id)
                .await
                .map_err(PipelineError::Persistence)?
                .is_some();
            if !known {
                return Err(self.missing(pipeline_id));
            }
        }

        Ok(StepsResponse::new(pipeline_id, steps))
    }

    /// Most recent runs first
    pub async fn history(&self, limit: usize) -> Result<Vec<RunSummary>, PipelineError> {
        self.store.list_results(limit).await.map_err(PipelineError::Persistence)
    }

    /// Why a run is not in the store
    fn missing(&self, pipeline_id: Uuid) -> PipelineError {
        let tracker = lock(&self.tracker);
        if tracker.running.contains(&pipeline_id) {
            PipelineError::NotReady(pipeline_id)
        } else if let Some(message) = tracker.unsaved(pipeline_id) {
            PipelineError::Persistence(anyhow::anyhow!("{}", message))
        } else {
            PipelineError::NotFound(pipeline_id)
        }
    }
}

/// Save a finished run and clear it from the running set
async fn persist(store: &dyn ResultStore, tracker: &Mutex<Tracker>, result: &PipelineResult) -> Result<(), String> {
    let saved = store.save_result(result).await.map(|_| ()).map_err(|e| {
        error!("Failed to save pipeline {}: {:#}", result.id, e);
        format!("{:#}", e)
    });

    lock(tracker).settle(result.id, &saved);
    saved
}

/// Drive a run on its own task so a panic ends in a failed result
async fn guarded<F>(fallback: PipelineResult, run: F) -> PipelineResult
where
    F: Future<Output = PipelineResult> + Send + 'static,
{
    match tokio::spawn(run).await {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline {} task died: {}", fallback.id, e);
            let mut failed = fallback;
            let steps = std::mem::take(&mut failed.steps);
            failed.finish(ExecutionStatus::Failed, steps);
            failed
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
