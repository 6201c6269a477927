//! Tax registry connector

use crate::connector::source::ensure_kind;
use crate::connector::{ConnectorError, DomainConnector, Record, RecordSource, SourceRequest};
use crate::core::{DomainType, KeywordCategory};
use async_trait::async_trait;
use std::sync::Arc;

const SEARCHABLE: &[KeywordCategory] = &[KeywordCategory::TaxId];
const RETRIEVABLE: &[KeywordCategory] = &[
    KeywordCategory::CompanyName,
    KeywordCategory::PersonName,
    KeywordCategory::Address,
    KeywordCategory::TaxId,
];

/// Looks up registrations by tax id and yields names, partners and addresses
pub struct TaxConnector {
    source: Arc<dyn RecordSource>,
}

impl TaxConnector {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl DomainConnector for TaxConnector {
    fn domain_type(&self) -> DomainType {
        DomainType::Tax
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
            .fetch(&SourceRequest::plain(DomainType::Tax, query))
            .await?;
        ensure_kind(DomainType::Tax, "tax_registration", records)
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        let Record::TaxRegistration(registration) = record else {
            return Vec::new();
        };

        match category {
            KeywordCategory::CompanyName => std::iter::once(registration.legal_name.clone())
                .chain(registration.trade_name.iter().cloned())
                .collect(),
            KeywordCategory::PersonName => registration.partners.clone(),
            KeywordCategory::Address => registration.address.iter().cloned().collect(),
            KeywordCategory::TaxId => vec![registration.tax_id.clone()],
            KeywordCategory::SocialHandle => Vec::new(),
        }
    }
}
