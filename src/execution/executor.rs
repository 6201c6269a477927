//! Step executor - runs one search against its connector

use crate::connector::{extract_categories, ConnectorError, DomainConnector};
use crate::core::{PipelineStep, StepOutcome};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Executes a single step
///
/// Connector failures and timeouts become a failed outcome; they never
/// escape as errors, so one source going down cannot abort the run.
#[derive(Debug, Clone, Copy)]
pub struct StepExecutor {
    timeout_secs: u64,
}

impl StepExecutor {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    /// Search the step's keyword and extract categories from the result
    pub async fn execute(&self, connector: Option<&Arc<dyn DomainConnector>>, step: &PipelineStep) -> StepOutcome {
        let Some(connector) = connector else {
            let error = ConnectorError::NotConfigured(step.domain_type);
            warn!("Step {} failed: {}", step.id, error);
            return StepOutcome::Failure { error: error.to_string() };
        };

        info!(
            "Searching {} for {:?} ({}, depth {})",
            step.domain_type, step.search_parameter, step.category, step.depth
        );

        let result = match timeout(
            Duration::from_secs(self.timeout_secs),
            connector.search(&step.search_parameter),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::Timeout(self.timeout_secs)),
        };

        match result {
            Ok(records) => {
                let keywords = extract_categories(connector.as_ref(), &records);
                debug!(
                    "{} returned {} records, {} keyword categories for {:?}",
                    step.domain_type,
                    records.len(),
                    keywords.len(),
                    step.search_parameter
                );
                StepOutcome::Success { records, keywords }
            }
            Err(e) => {
                warn!("{} search for {:?} failed: {}", step.domain_type, step.search_parameter, e);
                StepOutcome::Failure { error: e.to_string() }
            }
        }
    }
}
