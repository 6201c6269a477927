//! Run configuration and application settings from YAML

use crate::core::DomainType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Deepest expansion a run may request
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Reasons a run is rejected before any step executes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("at least one domain must be available")]
    NoDomains,

    #[error("domain '{0}' listed more than once")]
    DuplicateDomain(DomainType),

    #[error("no connector registered for domain '{0}'")]
    UnknownDomain(DomainType),

    #[error("max depth {requested} exceeds the limit of {limit}")]
    DepthTooLarge { requested: u32, limit: u32 },

    #[error("{name} must be greater than zero")]
    InvalidLimit { name: &'static str },
}

/// Immutable settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed search string
    pub query: String,

    /// Deepest depth a step may have (seeds are depth 0)
    pub max_depth: u32,

    /// Ceiling on connector calls in flight at once
    pub max_concurrent_steps: usize,

    /// Courtesy pause between consecutive steps
    #[serde(with = "duration_ms", rename = "delay_between_steps_ms")]
    pub delay_between_steps: Duration,

    /// Suppress repeated (domain, keyword) searches
    pub skip_duplicates: bool,

    /// Domains seeded and eligible for expansion, in seeding order
    pub available_domains: Vec<DomainType>,

    /// Hard cap on the number of steps admitted to the frontier
    pub max_total_steps: usize,

    /// Per-step connector timeout in seconds
    pub step_timeout_secs: u64,

    /// Allow a step's keywords to be searched again on its own domain
    #[serde(default)]
    pub expand_into_source_domain: bool,
}

impl PipelineConfig {
    /// Build a run configuration from defaults plus the per-call arguments
    pub fn new(query: impl Into<String>, max_depth: u32, skip_duplicates: bool, defaults: &RunDefaults) -> Self {
        Self {
            query: query.into().trim().to_string(),
            max_depth,
            max_concurrent_steps: defaults.max_concurrent_steps,
            delay_between_steps: Duration::from_millis(defaults.delay_between_steps_ms),
            skip_duplicates,
            available_domains: defaults.available_domains.clone(),
            max_total_steps: defaults.max_total_steps,
            step_timeout_secs: defaults.step_timeout_secs,
            expand_into_source_domain: defaults.expand_into_source_domain,
        }
    }

    /// Restrict the run to the given domains
    pub fn with_domains(mut self, domains: Vec<DomainType>) -> Self {
        self.available_domains = domains;
        self
    }

    /// Validate the shape of the configuration
    ///
    /// Connector availability is checked separately by the registry, since
    /// the configuration alone does not know which connectors exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }

        if self.available_domains.is_empty() {
            return Err(ConfigError::NoDomains);
        }

        let mut seen = HashSet::new();
        for domain in &self.available_domains {
            if !seen.insert(*domain) {
                return Err(ConfigError::DuplicateDomain(*domain));
            }
        }

        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::DepthTooLarge {
                requested: self.max_depth,
                limit: MAX_DEPTH_LIMIT,
            });
        }

        if self.max_concurrent_steps == 0 {
            return Err(ConfigError::InvalidLimit { name: "max_concurrent_steps" });
        }
        if self.max_total_steps == 0 {
            return Err(ConfigError::InvalidLimit { name: "max_total_steps" });
        }
        if self.step_timeout_secs == 0 {
            return Err(ConfigError::InvalidLimit { name: "step_timeout_secs" });
        }

        Ok(())
    }
}

/// Defaults applied to every run submitted without explicit overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub max_depth: u32,
    pub max_concurrent_steps: usize,
    pub delay_between_steps_ms: u64,
    pub skip_duplicates: bool,
    pub available_domains: Vec<DomainType>,
    pub max_total_steps: usize,
    pub step_timeout_secs: u64,
    pub expand_into_source_domain: bool,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent_steps: 1,
            delay_between_steps_ms: 1000,
            skip_duplicates: true,
            available_domains: DomainType::ALL.to_vec(),
            max_total_steps: 200,
            step_timeout_secs: 60,
            expand_into_source_domain: false,
        }
    }
}

/// `storage` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file (defaults to the platform data dir)
    pub database_path: Option<PathBuf>,
}

/// `sources` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Fixture file backing every connector
    pub fixtures: Option<PathBuf>,
}

/// `stream` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Capacity of the bounded event queue between executor and receiver
    pub event_buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self { event_buffer: 16 }
    }
}

/// Application settings loaded from `dragnet.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub defaults: RunDefaults,
    pub storage: StorageSettings,
    pub sources: SourceSettings,
    pub stream: StreamSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from an explicit path, or the default location if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// `<config dir>/dragnet/dragnet.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dragnet").join("dragnet.yaml"))
    }

    /// Validate the settings by validating a probe run built from the defaults
    pub fn validate(&self) -> Result<()> {
        if self.stream.event_buffer == 0 {
            anyhow::bail!("stream.event_buffer must be greater than zero");
        }

        let probe = PipelineConfig::new("probe", self.defaults.max_depth, self.defaults.skip_duplicates, &self.defaults);
        probe.validate().context("Invalid run defaults")?;
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
