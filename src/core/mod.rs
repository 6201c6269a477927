//! Core domain models for Dragnet
//!
//! This module defines the fundamental data structures that represent
//! pipeline runs, steps, and their configuration.

pub mod category;
pub mod config;
pub mod result;
pub mod state;
pub mod step;

pub use category::*;
pub use config::{ConfigError, PipelineConfig, RunDefaults, Settings};
pub use result::*;
pub use state::*;
pub use step::*;
