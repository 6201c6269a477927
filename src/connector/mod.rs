//! Domain connectors: one per external data source
//!
//! The engine only ever talks to [`DomainConnector`]; how a connector reaches
//! its backing source is hidden behind [`RecordSource`].

pub mod court;
pub mod error;
pub mod extract;
pub mod news;
pub mod record;
pub mod source;
pub mod tax;
pub mod trademark;
pub mod web_search;

use crate::core::{ConfigError, DomainType, KeywordCategory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use court::CourtConnector;
pub use error::ConnectorError;
pub use extract::extract_categories;
pub use news::NewsConnector;
pub use record::*;
pub use source::{FixtureSource, RecordSource, SourceRequest};
pub use tax::TaxConnector;
pub use trademark::TrademarkConnector;
pub use web_search::{SearchOptions, WebSearchConnector, WebSearchMode};

/// Capability interface every data source implements
#[async_trait]
pub trait DomainConnector: Send + Sync {
    /// Which domain this connector serves
    fn domain_type(&self) -> DomainType;

    /// Categories this connector accepts as search input
    fn searchable_categories(&self) -> &[KeywordCategory];

    /// Categories this connector can find in its own results
    fn retrievable_categories(&self) -> &[KeywordCategory];

    /// Category the run's seed query is treated as for this domain
    fn seed_category(&self) -> KeywordCategory {
        self.searchable_categories()
            .first()
            .copied()
            .unwrap_or(KeywordCategory::CompanyName)
    }

    /// Whether keywords of `category` may be searched here
    fn accepts(&self, category: KeywordCategory) -> bool {
        self.searchable_categories().contains(&category)
    }

    /// Search the backing source
    ///
    /// Returns the full record list or an error, never a partial mix. An
    /// empty list is a valid "no matches".
    async fn search(&self, query: &str) -> Result<Vec<Record>, ConnectorError>;

    /// Candidate keywords of `category` in one record
    ///
    /// Must be pure and total: unknown categories or foreign record kinds
    /// yield an empty list.
    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String>;
}

/// Domain identifier -> connector instance
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<DomainType, Arc<dyn DomainConnector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in connector on top of one record source
    pub fn with_source(source: Arc<dyn RecordSource>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TrademarkConnector::new(source.clone())));
        registry.register(Arc::new(CourtConnector::new(source.clone())));
        registry.register(Arc::new(TaxConnector::new(source.clone())));
        registry.register(Arc::new(NewsConnector::new(source.clone())));
        for mode in WebSearchMode::ALL {
            registry.register(Arc::new(WebSearchConnector::new(mode, source.clone())));
        }
        registry
    }

    /// Register a connector, replacing any previous one for the same domain
    pub fn register(&mut self, connector: Arc<dyn DomainConnector>) {
        self.connectors.insert(connector.domain_type(), connector);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, connector: Arc<dyn DomainConnector>) -> Self {
        self.register(connector);
        self
    }

    pub fn get(&self, domain: DomainType) -> Option<&Arc<dyn DomainConnector>> {
        self.connectors.get(&domain)
    }

    pub fn contains(&self, domain: DomainType) -> bool {
        self.connectors.contains_key(&domain)
    }

    /// Registered domains in canonical order
    pub fn domains(&self) -> Vec<DomainType> {
        let mut domains: Vec<_> = self.connectors.keys().copied().collect();
        domains.sort();
        domains
    }

    /// Fail if any requested domain has no connector
    pub fn ensure_available(&self, domains: &[DomainType]) -> Result<(), ConfigError> {
        match domains.iter().find(|d| !self.contains(**d)) {
            Some(missing) => Err(ConfigError::UnknownDomain(*missing)),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("domains", &self.domains())
            .finish()
    }
}
