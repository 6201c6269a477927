//! Step domain model

use crate::connector::Record;
use crate::core::{DomainType, KeywordCategory, KeywordMap, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One search of one keyword against one domain
///
/// Created pending by the scheduler, completed exactly once by the engine,
/// immutable afterwards. Failed steps stay in the result for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Unique step identifier
    pub id: Uuid,

    /// Run this step belongs to
    pub pipeline_id: Uuid,

    /// Step whose keywords produced this one (None for seeds)
    #[serde(default)]
    pub parent_step_id: Option<Uuid>,

    pub domain_type: DomainType,

    /// The keyword searched
    pub search_parameter: String,

    /// Category of `search_parameter`; the domain's seed category at depth 0
    pub category: KeywordCategory,

    /// 0 for seed steps
    pub depth: u32,

    pub success: bool,

    /// Set only when the search failed
    #[serde(default)]
    pub error: Option<String>,

    /// Connector records, opaque to the engine
    #[serde(default)]
    pub output: Vec<Record>,

    /// Keywords extracted from `output`
    #[serde(default)]
    pub keywords_per_category: KeywordMap,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// What a finished search produced
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Success {
        records: Vec<Record>,
        keywords: KeywordMap,
    },
    Failure {
        error: String,
    },
}

impl PipelineStep {
    /// Create a depth-0 step searching the run's query
    pub fn seed(pipeline_id: Uuid, domain: DomainType, query: &str, category: KeywordCategory) -> Self {
        Self::pending(pipeline_id, None, domain, query.to_string(), category, 0)
    }

    /// Create a step derived from a keyword found by `parent`
    pub fn child(parent: &PipelineStep, domain: DomainType, keyword: &str, category: KeywordCategory) -> Self {
        Self::pending(
            parent.pipeline_id,
            Some(parent.id),
            domain,
            keyword.to_string(),
            category,
            parent.depth + 1,
        )
    }

    fn pending(
        pipeline_id: Uuid,
        parent_step_id: Option<Uuid>,
        domain_type: DomainType,
        search_parameter: String,
        category: KeywordCategory,
        depth: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline_id,
            parent_step_id,
            domain_type,
            search_parameter,
            category,
            depth,
            success: false,
            error: None,
            output: Vec::new(),
            keywords_per_category: KeywordMap::new(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> StepStatus {
        if self.completed_at.is_none() {
            StepStatus::Pending
        } else if self.success {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status() == StepStatus::Pending
    }

    /// Record the moment the connector call begins
    pub fn mark_started(&mut self) {
        if self.is_pending() {
            self.started_at = Some(Utc::now());
        }
    }

    /// Forget a start that never reached the connector
    pub fn clear_started(&mut self) {
        if self.is_pending() {
            self.started_at = None;
        }
    }

    /// Apply the search outcome
    ///
    /// Returns false (and leaves the step untouched) if it was already completed.
    pub fn complete(&mut self, outcome: StepOutcome) -> bool {
        if !self.is_pending() {
            warn!("Step {} ({} / {}) already completed, ignoring outcome", self.id, self.domain_type, self.search_parameter);
            return false;
        }

        let now = Utc::now();
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }

        match outcome {
            StepOutcome::Success { records, keywords } => {
                self.success = true;
                self.error = None;
                self.output = records;
                self.keywords_per_category = keywords;
            }
            StepOutcome::Failure { error } => {
                self.success = false;
                self.error = Some(error);
                self.output = Vec::new();
                self.keywords_per_category = KeywordMap::new();
            }
        }
        self.completed_at = Some(now);
        true
    }

    /// Keywords of one category extracted by this step
    pub fn keywords(&self, category: KeywordCategory) -> &[String] {
        self.keywords_per_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of extracted keywords across categories
    pub fn keyword_count(&self) -> usize {
        self.keywords_per_category.values().map(Vec::len).sum()
    }
}
