//! Typed records returned by the connectors

use serde::{Deserialize, Serialize};

/// One record returned by a connector search
///
/// The engine stores these verbatim and never looks inside; only the
/// owning connector knows how to pull keywords out of its own variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Trademark(TrademarkRecord),
    Lawsuit(LawsuitRecord),
    TaxRegistration(TaxRegistrationRecord),
    Article(ArticleRecord),
    WebResult(WebResultRecord),
}

impl Record {
    /// Wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Trademark(_) => "trademark",
            Record::Lawsuit(_) => "lawsuit",
            Record::TaxRegistration(_) => "tax_registration",
            Record::Article(_) => "article",
            Record::WebResult(_) => "web_result",
        }
    }
}

/// Trademark registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrademarkRecord {
    pub process_number: String,
    pub mark: String,
    /// Registered holder (company or person)
    pub holder: String,
    #[serde(default)]
    pub holder_tax_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

/// Whether a court party is a natural or legal person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Person,
    Company,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub kind: PartyKind,
    /// e.g. plaintiff, defendant
    #[serde(default)]
    pub role: Option<String>,
}

/// Court-case index entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawsuitRecord {
    pub case_number: String,
    pub court: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub parties: Vec<Party>,
}

/// Tax registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRegistrationRecord {
    pub tax_id: String,
    pub legal_name: String,
    #[serde(default)]
    pub trade_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Partners / administrators on record
    #[serde(default)]
    pub partners: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// News article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

/// General web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResultRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
}
