//! Keyword extraction: the bridge from connector output to the next frontier

use crate::connector::{DomainConnector, Record};
use crate::core::KeywordMap;
use std::collections::HashSet;

/// Aggregate category -> keywords over a batch of records
///
/// For each record and each category the connector can *retrieve*, ask the
/// connector for candidate strings. Candidates are whitespace-normalized,
/// empties dropped, and deduplicated per category (case-insensitive,
/// first-seen spelling wins). Categories with no keywords are omitted.
///
/// Pure: the same connector and records always yield the same map.
pub fn extract_categories(connector: &dyn DomainConnector, records: &[Record]) -> KeywordMap {
    let mut keywords = KeywordMap::new();

    for &category in connector.retrievable_categories() {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for record in records {
            for candidate in connector.data_by_category(record, category) {
                let keyword = normalize_keyword(&candidate);
                if keyword.is_empty() {
                    continue;
                }
                if seen.insert(keyword.to_lowercase()) {
                    found.push(keyword);
                }
            }
        }

        if !found.is_empty() {
            keywords.insert(category, found);
        }
    }

    keywords
}

/// Trim and collapse internal whitespace
pub fn normalize_keyword(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
