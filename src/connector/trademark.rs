//! Trademark registry connector

use crate::connector::source::ensure_kind;
use crate::connector::{ConnectorError, DomainConnector, Record, RecordSource, SourceRequest};
use crate::core::{DomainType, KeywordCategory};
use async_trait::async_trait;
use std::sync::Arc;

const SEARCHABLE: &[KeywordCategory] = &[KeywordCategory::CompanyName];
const RETRIEVABLE: &[KeywordCategory] = &[KeywordCategory::CompanyName, KeywordCategory::TaxId];

/// Searches the registry by company / mark name and yields holders
pub struct TrademarkConnector {
    source: Arc<dyn RecordSource>,
}

impl TrademarkConnector {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl DomainConnector for TrademarkConnector {
    fn domain_type(&self) -> DomainType {
        DomainType::Registry
    }

    fn searchable_categories(&self) -> &[KeywordCategory] {
        SEARCHABLE
    }

    fn retrievable_categories(&self) -> &[KeywordCategory] {
        RETRIEVABLE
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>, ConnectorError> {
        let records = self
            .source
            .fetch(&SourceRequest::plain(DomainType::Registry, query))
            .await?;
        ensure_kind(DomainType::Registry, "trademark", records)
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        let Record::Trademark(mark) = record else {
            return Vec::new();
        };

        match category {
            KeywordCategory::CompanyName => vec![mark.holder.clone()],
            KeywordCategory::TaxId => mark.holder_tax_id.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }
}
