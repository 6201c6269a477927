//! Scenario-based tests for the pipeline engine

#[path = "../helpers.rs"]
mod helpers;

mod failures;
mod frontier;
mod pacing;
mod properties;
