//! Pipeline run accumulator and statistics

use crate::core::{ExecutionStatus, PipelineConfig, PipelineStep, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything a run discovered, in discovery order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Execution ID
    pub id: Uuid,

    pub status: ExecutionStatus,

    /// All steps, in the order the scheduler admitted them
    pub steps: Vec<PipelineStep>,

    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub max_depth_reached: u32,

    /// Copy of the run configuration
    pub config: PipelineConfig,

    pub started_at: DateTime<Utc>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineResult {
    /// Create an empty result for an accepted run that has not started yet
    pub fn new(id: Uuid, config: PipelineConfig) -> Self {
        Self {
            id,
            status: ExecutionStatus::Pending,
            steps: Vec::new(),
            total_steps: 0,
            successful_steps: 0,
            failed_steps: 0,
            max_depth_reached: 0,
            config,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Close the run with the given status, recomputing statistics from the step list
    pub fn finish(&mut self, status: ExecutionStatus, steps: Vec<PipelineStep>) {
        self.steps = steps;
        self.status = status;
        self.completed_at = Some(Utc::now());
        self.recompute_stats();
    }

    /// Recompute counters by scanning the step list
    ///
    /// Steps that never ran (abandoned on cancellation) count toward
    /// `total_steps` and as failed, so the totals always add up.
    pub fn recompute_stats(&mut self) {
        self.total_steps = self.steps.len();
        self.successful_steps = self
            .steps
            .iter()
            .filter(|s| s.status() == StepStatus::Succeeded)
            .count();
        self.failed_steps = self.total_steps - self.successful_steps;
        self.max_depth_reached = self.steps.iter().map(|s| s.depth).max().unwrap_or(0);
    }

    /// Steps at one depth, in discovery order
    pub fn steps_at_depth(&self, depth: u32) -> impl Iterator<Item = &PipelineStep> {
        self.steps.iter().filter(move |s| s.depth == depth)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from(self)
    }
}

/// Compact view of a run for summaries and history listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub query: String,
    pub status: ExecutionStatus,
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub max_depth_reached: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&PipelineResult> for RunSummary {
    fn from(result: &PipelineResult) -> Self {
        Self {
            id: result.id,
            query: result.config.query.clone(),
            status: result.status,
            total_steps: result.total_steps,
            successful_steps: result.successful_steps,
            failed_steps: result.failed_steps,
            max_depth_reached: result.max_depth_reached,
            started_at: result.started_at,
            completed_at: result.completed_at,
        }
    }
}
