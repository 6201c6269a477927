//! News site connector

use crate::connector::source::ensure_kind;
use crate::connector::{ConnectorError, DomainConnector, Record, RecordSource, SourceRequest};
use crate::core::{DomainType, KeywordCategory};
use async_trait::async_trait;
use std::sync::Arc;

const SEARCHABLE: &[KeywordCategory] = &[KeywordCategory::PersonName, KeywordCategory::CompanyName];
const RETRIEVABLE: &[KeywordCategory] = &[KeywordCategory::PersonName, KeywordCategory::CompanyName];

pub struct NewsConnector {
    source: Arc<dyn RecordSource>,
}

impl NewsConnector {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl DomainConnector for NewsConnector {
    fn domain_type(&self) -> DomainType {
        DomainType::News
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
            .fetch(&SourceRequest::plain(DomainType::News, query))
            .await?;
        ensure_kind(DomainType::News, "article", records)
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        match (record, category) {
            (Record::Article(article), KeywordCategory::PersonName) => article.people.clone(),
            (Record::Article(article), KeywordCategory::CompanyName) => article.organizations.clone(),
            _ => Vec::new(),
        }
    }
}
