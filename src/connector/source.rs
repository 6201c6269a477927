//! Transport seam between connectors and their backing sources
//!
//! Connectors decide *what* to ask and how to read the answer; a
//! [`RecordSource`] decides *how* the question reaches the outside world
//! (scraper, search API, fixture file). The engine never sees this layer.

use crate::connector::{ConnectorError, Record};
use crate::core::DomainType;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A single lookup against a backing source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub domain: DomainType,
    /// The bare keyword the pipeline is searching
    pub keyword: String,
    /// The query actually sent (keyword plus any augmentation)
    pub query: String,
}

impl SourceRequest {
    /// Request whose query is the keyword itself
    pub fn plain(domain: DomainType, keyword: &str) -> Self {
        Self {
            domain,
            keyword: keyword.to_string(),
            query: keyword.to_string(),
        }
    }
}

/// Fetches raw records for a connector
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Return all records matching the request; an empty list means no matches
    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<Record>, ConnectorError>;
}

/// Reject responses holding records of a foreign kind
///
/// A connector either returns a clean list of its own records or an error,
/// never a mixture.
pub fn ensure_kind(
    domain: DomainType,
    expected: &'static str,
    records: Vec<Record>,
) -> Result<Vec<Record>, ConnectorError> {
    if let Some(foreign) = records.iter().find(|r| r.kind() != expected) {
        return Err(ConnectorError::UnexpectedRecord {
            domain,
            expected,
            found: foreign.kind(),
        });
    }
    Ok(records)
}

/// A fixture entry: either canned records or a canned failure
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FixtureEntry {
    Failure { error: String },
    Records(Vec<Record>),
}

/// Record source backed by a YAML/JSON fixture file
///
/// Layout: `domain -> keyword -> [records] | {error: "..."}`. Keywords are
/// matched case-insensitively; unknown keywords yield no matches.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    entries: HashMap<DomainType, HashMap<String, FixtureEntry>>,
}

impl FixtureSource {
    /// Load fixtures from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid fixture file {}", path.display()))
    }

    /// Parse fixtures from YAML (JSON is accepted as well)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: HashMap<DomainType, HashMap<String, FixtureEntry>> = serde_yaml::from_str(yaml)?;
        let entries = raw
            .into_iter()
            .map(|(domain, by_keyword)| {
                let normalized = by_keyword
                    .into_iter()
                    .map(|(keyword, entry)| (fixture_key(&keyword), entry))
                    .collect();
                (domain, normalized)
            })
            .collect();
        Ok(Self { entries })
    }

    /// Number of keyword entries across all domains
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fixture_key(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

#[async_trait]
impl RecordSource for FixtureSource {
    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<Record>, ConnectorError> {
        debug!("Fixture lookup {} / {:?} (query {:?})", request.domain, request.keyword, request.query);

        let entry = self
            .entries
            .get(&request.domain)
            .and_then(|by_keyword| by_keyword.get(&fixture_key(&request.keyword)));

        match entry {
            Some(FixtureEntry::Records(records)) => Ok(records.clone()),
            Some(FixtureEntry::Failure { error }) => Err(ConnectorError::Transport(error.clone())),
            None => Ok(Vec::new()),
        }
    }
}
