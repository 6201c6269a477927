//! General web search, parameterized into dorking modes
//!
//! Every mode runs the same underlying search call; what differs is the
//! fixed augmentation layered on top of the keyword, described by
//! [`SearchOptions`].

use crate::connector::source::ensure_kind;
use crate::connector::{ConnectorError, DomainConnector, Record, RecordSource, SourceRequest};
use crate::core::{DomainType, KeywordCategory};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

const FRAUD_TERMS: &[&str] = &[
    "fraud",
    "scam",
    "lawsuit",
    "complaint",
    "investigation",
    "money laundering",
];

const SOCIAL_SITES: &[&str] = &[
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "x.com",
    "twitter.com",
    "tiktok.com",
];

const DOCUMENT_FILETYPES: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "csv"];

/// Profile paths that carry a handle as their first path segment
const PROFILE_PREFIXES: &[&str] = &[
    "linkedin.com/in/",
    "linkedin.com/company/",
    "facebook.com/",
    "instagram.com/",
    "x.com/",
    "twitter.com/",
    "tiktok.com/@",
];

/// Path segments that are site sections, not handles
const RESERVED_SEGMENTS: &[&str] = &[
    "search", "share", "sharer", "hashtag", "explore", "home", "login", "p", "pages", "groups",
    "intent", "i", "watch", "reel", "stories", "events",
];

/// Augmentation applied to a search term before it is sent
///
/// Rendered form: `"term" (a OR b) site:x OR site:y filetype:pdf inurl:z -w`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// At least one of these must appear
    pub include_any: Vec<String>,
    /// None of these may appear
    pub exclude: Vec<String>,
    /// Restrict to these sites
    pub sites: Vec<String>,
    /// Restrict to these file types
    pub filetypes: Vec<String>,
    /// Each must appear in the URL
    pub in_url: Vec<String>,
}

impl SearchOptions {
    /// Render the operator query for `term`
    pub fn render(&self, term: &str) -> String {
        let mut parts = vec![quote(term)];

        if !self.include_any.is_empty() {
            let terms: Vec<String> = self.include_any.iter().map(|t| quote_phrase(t)).collect();
            parts.push(format!("({})", terms.join(" OR ")));
        }

        if !self.sites.is_empty() {
            let sites: Vec<String> = self.sites.iter().map(|s| format!("site:{}", s)).collect();
            parts.push(sites.join(" OR "));
        }

        if !self.filetypes.is_empty() {
            let types: Vec<String> = self.filetypes.iter().map(|t| format!("filetype:{}", t)).collect();
            parts.push(types.join(" OR "));
        }

        parts.extend(self.in_url.iter().map(|u| format!("inurl:{}", u)));
        parts.extend(self.exclude.iter().map(|w| format!("-{}", quote_phrase(w))));

        parts.join(" ")
    }
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.trim().replace('"', ""))
}

/// Quote only multi-word phrases
fn quote_phrase(term: &str) -> String {
    if term.contains(char::is_whitespace) {
        quote(term)
    } else {
        term.to_string()
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The four augmentation policies of the web-search family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebSearchMode {
    Fraud,
    SocialMedia,
    Filetype,
    Handle,
}

impl WebSearchMode {
    pub const ALL: [WebSearchMode; 4] = [
        WebSearchMode::Fraud,
        WebSearchMode::SocialMedia,
        WebSearchMode::Filetype,
        WebSearchMode::Handle,
    ];

    pub fn domain_type(self) -> DomainType {
        match self {
            WebSearchMode::Fraud => DomainType::WebFraud,
            WebSearchMode::SocialMedia => DomainType::WebSocial,
            WebSearchMode::Filetype => DomainType::WebFiletype,
            WebSearchMode::Handle => DomainType::WebHandle,
        }
    }

    /// Fixed augmentation for `keyword` under this mode
    pub fn options(self, keyword: &str) -> SearchOptions {
        match self {
            WebSearchMode::Fraud => SearchOptions {
                include_any: owned(FRAUD_TERMS),
                ..Default::default()
            },
            WebSearchMode::SocialMedia => SearchOptions {
                sites: owned(SOCIAL_SITES),
                ..Default::default()
            },
            WebSearchMode::Filetype => SearchOptions {
                filetypes: owned(DOCUMENT_FILETYPES),
                ..Default::default()
            },
            WebSearchMode::Handle => SearchOptions {
                sites: owned(SOCIAL_SITES),
                in_url: vec![keyword.trim().trim_start_matches('@').to_string()],
                ..Default::default()
            },
        }
    }

    fn searchable(self) -> &'static [KeywordCategory] {
        match self {
            WebSearchMode::Fraud => &[KeywordCategory::CompanyName, KeywordCategory::PersonName],
            WebSearchMode::SocialMedia => &[KeywordCategory::PersonName, KeywordCategory::CompanyName],
            WebSearchMode::Filetype => &[KeywordCategory::CompanyName, KeywordCategory::TaxId],
            WebSearchMode::Handle => &[KeywordCategory::SocialHandle],
        }
    }

    fn retrievable(self) -> &'static [KeywordCategory] {
        match self {
            WebSearchMode::Filetype => &[KeywordCategory::SocialHandle, KeywordCategory::TaxId],
            _ => &[KeywordCategory::SocialHandle],
        }
    }
}

pub struct WebSearchConnector {
    mode: WebSearchMode,
    source: Arc<dyn RecordSource>,
}

impl WebSearchConnector {
    pub fn new(mode: WebSearchMode, source: Arc<dyn RecordSource>) -> Self {
        Self { mode, source }
    }

    pub fn mode(&self) -> WebSearchMode {
        self.mode
    }

    /// Build the request for `keyword` with explicit augmentation
    pub fn request(&self, keyword: &str, options: &SearchOptions) -> SourceRequest {
        SourceRequest {
            domain: self.mode.domain_type(),
            keyword: keyword.to_string(),
            query: options.render(keyword),
        }
    }
}

#[async_trait]
impl DomainConnector for WebSearchConnector {
    fn domain_type(&self) -> DomainType {
        self.mode.domain_type()
    }

    fn searchable_categories(&self) -> &[KeywordCategory] {
        self.mode.searchable()
    }

    fn retrievable_categories(&self) -> &[KeywordCategory] {
        self.mode.retrievable()
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>, ConnectorError> {
        let request = self.request(query, &self.mode.options(query));
        let records = self.source.fetch(&request).await?;
        ensure_kind(self.mode.domain_type(), "web_result", records)
    }

    fn data_by_category(&self, record: &Record, category: KeywordCategory) -> Vec<String> {
        let Record::WebResult(result) = record else {
            return Vec::new();
        };
        let snippet = result.snippet.as_deref().unwrap_or_default();

        match category {
            KeywordCategory::SocialHandle => {
                let mut handles: Vec<String> = profile_handle(&result.url).into_iter().collect();
                handles.extend(mentions(&result.title));
                handles.extend(mentions(snippet));
                handles
            }
            KeywordCategory::TaxId if self.mode == WebSearchMode::Filetype => {
                let mut ids = tax_ids(&result.title);
                ids.extend(tax_ids(snippet));
                ids
            }
            _ => Vec::new(),
        }
    }
}

fn mention_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?:^|[^\w@.])@([A-Za-z0-9_.]{2,30})\b").ok())
        .as_ref()
}

/// Formatted CNPJ (`12.345.678/0001-90`) or EIN (`12-3456789`)
fn tax_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}\b|\b\d{2}-\d{7}\b").ok())
        .as_ref()
}

fn mentions(text: &str) -> Vec<String> {
    let Some(pattern) = mention_pattern() else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .map(|caps| format!("@{}", caps[1].trim_end_matches('.')))
        .collect()
}

fn tax_ids(text: &str) -> Vec<String> {
    let Some(pattern) = tax_id_pattern() else {
        return Vec::new();
    };
    pattern.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Handle from a social profile URL, e.g. `https://www.linkedin.com/in/jdoe`
fn profile_handle(url: &str) -> Option<String> {
    let lower = url.to_lowercase();
    let rest = lower
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let tail = PROFILE_PREFIXES.iter().find_map(|prefix| rest.strip_prefix(prefix))?;
    let segment = tail
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('@');

    if segment.is_empty() || RESERVED_SEGMENTS.contains(&segment) {
        return None;
    }
    Some(format!("@{}", segment))
}
