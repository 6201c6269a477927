//! Persistence layer for pipeline results

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteResultStore;

use crate::core::{PipelineResult, PipelineStep, RunSummary};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Snapshot store for finished runs
///
/// Runs are written once, when they finish; there is no incremental
/// checkpointing of in-flight runs.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Save (or replace) a run and all of its steps
    async fn save_result(&self, result: &PipelineResult) -> Result<Uuid>;

    /// Load a run by ID
    async fn load_result(&self, pipeline_id: Uuid) -> Result<Option<PipelineResult>>;

    /// Steps of one run in discovery order; empty for unknown runs
    async fn list_steps(&self, pipeline_id: Uuid) -> Result<Vec<PipelineStep>>;

    /// Most recent runs first
    async fn list_results(&self, limit: usize) -> Result<Vec<RunSummary>>;
}

/// In-memory persistence (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryStore {
    results: RwLock<HashMap<Uuid, PipelineResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResultStore for InMemoryStore {
    async fn save_result(&self, result: &PipelineResult) -> Result<Uuid> {
        self.results.write().await.insert(result.id, result.clone());
        Ok(result.id)
    }

    async fn load_result(&self, pipeline_id: Uuid) -> Result<Option<PipelineResult>> {
        Ok(self.results.read().await.get(&pipeline_id).cloned())
    }

    async fn list_steps(&self, pipeline_id: Uuid) -> Result<Vec<PipelineStep>> {
        Ok(self
            .results
            .read()
            .await
            .get(&pipeline_id)
            .map(|r| r.steps.clone())
            .unwrap_or_default())
    }

    async fn list_results(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let results = self.results.read().await;
        let mut summaries: Vec<RunSummary> = results.values().map(RunSummary::from).collect();
        summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        summaries.truncate(limit);
        Ok(summaries)
    }
}
