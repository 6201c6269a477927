//! Connector error types

use crate::core::DomainType;
use thiserror::Error;

/// A single source failed; recorded on the step, never fatal to the run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("{domain} returned a '{found}' record where '{expected}' was expected")]
    UnexpectedRecord {
        domain: DomainType,
        expected: &'static str,
        found: &'static str,
    },

    #[error("no source configured for {0}")]
    NotConfigured(DomainType),
}
