//! Delivery adapters: detached batch runs polled by id, and live streaming

pub mod response;
pub mod service;

pub use response::{ErrorResponse, PollResponse, StepsResponse};
pub use service::{PipelineService, RunStream};
