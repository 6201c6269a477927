//! Court-case index connector

use crate::connector::source::ensure_kind;
use crate::connector::{ConnectorError, DomainConnector, PartyKind, Record, RecordSource, SourceRequest};
use crate::core::{DomainType, KeywordCategory};
use async_trait::async_trait;
use std::sync::Arc;

const SEARCHABLE: &[KeywordCategory] = &[KeywordCategory::PersonName, KeywordCategory::CompanyName];
const RETRIEVABLE: &[KeywordCategory] = &[KeywordCategory::PersonName, KeywordCategory::CompanyName];

/// Searches lawsuits by party name and yields the other parties
pub struct CourtConnector {
    source: Arc<dyn RecordSource>,
}

impl CourtConnector {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl DomainConnector for CourtConnector {
    fn domain_type(&self) -> DomainType {
        DomainType::Court
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
            .fetch(&SourceRequest::plain(DomainType::Court, query))
            .await?;
        ensure_kind(DomainType::Court, "lawsuit", records)
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        let Record::Lawsuit(lawsuit) = record else {
            return Vec::new();
        };

        let wanted = match category {
            KeywordCategory::PersonName => PartyKind::Person,
            KeywordCategory::CompanyName => PartyKind::Company,
            _ => return Vec::new(),
        };

        lawsuit
            .parties
            .iter()
            .filter(|party| party.kind == wanted)
            .map(|party| party.name.clone())
            .collect()
    }
}
