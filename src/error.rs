//! Errors surfaced to callers of the delivery layer

use crate::core::ConfigError;
use thiserror::Error;
use uuid::Uuid;

/// Failures a caller of the run submission / poll API can see
///
/// Connector failures never appear here: they are recorded on the step
/// that hit them and the run carries on.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Rejected before any background work started
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pipeline {0} not found")]
    NotFound(Uuid),

    /// The run exists but has not finished yet
    #[error("pipeline {0} is still running")]
    NotReady(Uuid),

    /// The run task died before producing a result
    #[error("pipeline {0} was aborted before finishing")]
    Aborted(Uuid),

    #[error("persistence error: {0:#}")]
    Persistence(anyhow::Error),
}

impl PipelineError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::NotReady(_) => "not_ready",
            PipelineError::Aborted(_) => "aborted",
            PipelineError::Persistence(_) => "persistence",
        }
    }
}
