//! Pipeline execution engine

pub mod engine;
pub mod executor;
pub mod scheduler;

pub use engine::{EventHandler, ExecutionEvent, PipelineEngine};
pub use executor::StepExecutor;
pub use scheduler::{SchedulingStrategy, StepScheduler};
