//! dragnet - keyword-driven investigation pipeline over public-record sources

pub mod cli;
pub mod connector;
pub mod core;
pub mod delivery;
pub mod error;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use connector::{ConnectorError, ConnectorRegistry, DomainConnector, FixtureSource, Record, RecordSource};
pub use core::{DomainType, ExecutionStatus, KeywordCategory, PipelineConfig, PipelineResult, PipelineStep, Settings};
pub use delivery::{PipelineService, RunStream};
pub use error::PipelineError;
pub use execution::{ExecutionEvent, PipelineEngine, SchedulingStrategy};
pub use persistence::{InMemoryStore, ResultStore};
