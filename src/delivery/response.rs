//! Response envelopes for the thin HTTP / CLI layer

use crate::core::{PipelineResult, PipelineStep};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `{success, data}` answer to a poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub success: bool,
    pub data: PipelineResult,
}

impl PollResponse {
    pub fn new(data: PipelineResult) -> Self {
        Self { success: true, data }
    }
}

/// `{success, pipeline_id, steps, count}` answer to a steps listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepsResponse {
    pub success: bool,
    pub pipeline_id: Uuid,
    pub steps: Vec<PipelineStep>,
    pub count: usize,
}

impl StepsResponse {
    pub fn new(pipeline_id: Uuid, steps: Vec<PipelineStep>) -> Self {
        Self {
            success: true,
            pipeline_id,
            count: steps.len(),
            steps,
        }
    }
}

/// `{success: false, error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
        }
    }
}
