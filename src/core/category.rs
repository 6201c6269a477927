//! Domain identifiers and keyword categories

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One external data source the pipeline can search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    /// Trademark / company-name registry
    Registry,
    /// Court-case index
    Court,
    /// Tax registry
    Tax,
    /// News site
    News,
    /// General web search, fraud vocabulary
    WebFraud,
    /// General web search, restricted to social networks
    WebSocial,
    /// General web search, restricted to document file types
    WebFiletype,
    /// General web search for a social handle
    WebHandle,
}

impl DomainType {
    /// Every known domain, in default seeding order
    pub const ALL: [DomainType; 8] = [
        DomainType::Registry,
        DomainType::Court,
        DomainType::Tax,
        DomainType::News,
        DomainType::WebFraud,
        DomainType::WebSocial,
        DomainType::WebFiletype,
        DomainType::WebHandle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Registry => "registry",
            DomainType::Court => "court",
            DomainType::Tax => "tax",
            DomainType::News => "news",
            DomainType::WebFraud => "web_fraud",
            DomainType::WebSocial => "web_social",
            DomainType::WebFiletype => "web_filetype",
            DomainType::WebHandle => "web_handle",
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        DomainType::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == needle)
            .ok_or_else(|| format!("unknown domain: {}", s))
    }
}

/// Semantic class of an extracted keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    CompanyName,
    PersonName,
    Address,
    TaxId,
    SocialHandle,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 5] = [
        KeywordCategory::CompanyName,
        KeywordCategory::PersonName,
        KeywordCategory::Address,
        KeywordCategory::TaxId,
        KeywordCategory::SocialHandle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordCategory::CompanyName => "company_name",
            KeywordCategory::PersonName => "person_name",
            KeywordCategory::Address => "address",
            KeywordCategory::TaxId => "tax_id",
            KeywordCategory::SocialHandle => "social_handle",
        }
    }
}

impl fmt::Display for KeywordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeywordCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        KeywordCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown keyword category: {}", s))
    }
}

/// Category -> deduplicated keywords, iterated in category order
pub type KeywordMap = BTreeMap<KeywordCategory, Vec<String>>;
