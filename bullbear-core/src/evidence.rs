//! Evidence bundle — the aggregated research snapshot handed to every
//! participant. Built once by the research stage, read-only afterward.
//!
//! Partial population is legal: any category the provider could not serve
//! stays at its empty default, and the bundle itself never fails to build.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Loosely-shaped row returned by the structured research accessors
/// (earnings events, insider transactions, institutional positions).
pub type Record = BTreeMap<String, serde_json::Value>;

/// One ranked excerpt from a document collection, with provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentExcerpt {
    /// Originating firm, filing type, or collection name.
    pub source: String,
    /// Document title or heading, when the collection carries one.
    pub title: String,
    /// The excerpt body.
    pub content: String,
    /// Remaining provenance fields as returned by the search service.
    #[serde(default)]
    pub fields: Record,
}

/// Aggregated research snapshot for one ticker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Subject ticker, uppercased.
    pub ticker: String,
    /// Company display name, falls back to the ticker.
    pub company_name: String,

    // Structured categories.
    pub metrics: Record,
    pub earnings_history: Vec<Record>,
    pub technical_indicators: Record,
    pub sentiment: Record,
    pub insider_activity: Vec<Record>,
    pub institutional_holdings: Vec<Record>,

    // Unstructured categories.
    pub analyst_reports: Vec<DocumentExcerpt>,
    pub earnings_transcripts: Vec<DocumentExcerpt>,
    pub sec_filings: Vec<DocumentExcerpt>,
}

impl EvidenceBundle {
    /// Empty bundle for a ticker; categories fill in as fetches resolve.
    pub fn new(ticker: &str) -> Self {
        let ticker = ticker.to_uppercase();
        Self {
            company_name: ticker.clone(),
            ticker,
            ..Self::default()
        }
    }

    /// Whether every category is still at its empty default.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
            && self.earnings_history.is_empty()
            && self.technical_indicators.is_empty()
            && self.sentiment.is_empty()
            && self.insider_activity.is_empty()
            && self.institutional_holdings.is_empty()
            && self.analyst_reports.is_empty()
            && self.earnings_transcripts.is_empty()
            && self.sec_filings.is_empty()
    }

    /// Number of populated categories, for progress logging.
    pub fn populated_categories(&self) -> usize {
        [
            !self.metrics.is_empty(),
            !self.earnings_history.is_empty(),
            !self.technical_indicators.is_empty(),
            !self.sentiment.is_empty(),
            !self.insider_activity.is_empty(),
            !self.institutional_holdings.is_empty(),
            !self.analyst_reports.is_empty(),
            !self.earnings_transcripts.is_empty(),
            !self.sec_filings.is_empty(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }
}

/// Pull a display string out of a record field, tolerating any JSON shape.
pub fn field_str(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    }
}
