//! Research provider interface and the one-shot research stage.
//!
//! The stage fetches all nine evidence categories for the ticker; each
//! fetch is isolated, so a failing category is recorded as a session error
//! descriptor and left at its empty default. The stage itself never fails —
//! the debate proceeds on whatever evidence survived.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ResearchConfig;
use crate::error::EngineError;
use crate::events::DebateEvent;
use crate::evidence::{DocumentExcerpt, EvidenceBundle, Record};
use crate::participants::{Participant, TurnDelta};
use crate::state::{Actor, SessionState};

/// Errors from a research-provider call. Always isolated per category.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("service returned {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("response payload could not be parsed: {0}")]
    MalformedResponse(String),
}

/// Structured-plus-semantic research capability, keyed by ticker.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn metrics(&self, ticker: &str) -> Result<Record, ResearchError>;
    async fn earnings_history(&self, ticker: &str, limit: usize)
        -> Result<Vec<Record>, ResearchError>;
    async fn technical_indicators(&self, ticker: &str) -> Result<Record, ResearchError>;
    async fn sentiment(&self, ticker: &str) -> Result<Record, ResearchError>;
    async fn insider_activity(&self, ticker: &str, limit: usize)
        -> Result<Vec<Record>, ResearchError>;
    async fn institutional_holdings(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<Record>, ResearchError>;

    /// Free-text semantic search over one document collection, filterable
    /// by ticker, returning ranked excerpts with provenance.
    async fn search(
        &self,
        collection: &str,
        query: &str,
        ticker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError>;

    async fn search_analyst_reports(
        &self,
        query: &str,
        ticker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        self.search("analyst_reports", query, ticker, limit).await
    }

    async fn search_earnings_transcripts(
        &self,
        query: &str,
        ticker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        self.search("earnings_transcripts", query, ticker, limit).await
    }

    async fn search_sec_filings(
        &self,
        query: &str,
        ticker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        self.search("sec_filings", query, ticker, limit).await
    }

    /// Diagnostic query log accumulated by the provider, drained by the
    /// research stage and passed through as opaque events.
    fn drain_query_log(&self) -> Vec<serde_json::Value> {
        Vec::new()
    }
}

/// One-shot evidence-gathering step that runs before argumentation.
pub struct ResearchStage {
    provider: Arc<dyn ResearchProvider>,
}

impl ResearchStage {
    pub fn new(provider: Arc<dyn ResearchProvider>) -> Self {
        Self { provider }
    }
}

/// Resolve one category fetch: populate on success, record a descriptor and
/// keep the empty default on failure.
fn resolve<T>(
    result: Result<T, ResearchError>,
    category: &'static str,
    slot: &mut T,
    len: impl Fn(&T) -> usize,
    errors: &mut Vec<String>,
    events: &mut Vec<DebateEvent>,
) {
    match result {
        Ok(value) => {
            events.push(DebateEvent::CategoryFetched {
                category: category.to_string(),
                ok: true,
                items: len(&value),
                timestamp: Utc::now(),
            });
            *slot = value;
        }
        Err(e) => {
            warn!(category, error = %e, "research category fetch failed");
            errors.push(format!("Error getting {category}: {e}"));
            events.push(DebateEvent::CategoryFetched {
                category: category.to_string(),
                ok: false,
                items: 0,
                timestamp: Utc::now(),
            });
        }
    }
}

#[async_trait]
impl Participant for ResearchStage {
    fn name(&self) -> &'static str {
        "research"
    }

    async fn act(&self, state: &SessionState) -> Result<TurnDelta, EngineError> {
        let ticker = state.ticker.as_str();
        let mut bundle = EvidenceBundle::new(ticker);
        let mut errors = Vec::new();
        let mut events = Vec::new();

        let report_query = format!("{ticker} outlook growth risks");
        let transcript_query = format!("{ticker} guidance outlook");
        let filing_query = format!("{ticker} material events");

        // Category fetches are independent; issue them concurrently and
        // merge only once all have resolved.
        let (
            metrics,
            earnings,
            technicals,
            sentiment,
            insiders,
            institutions,
            reports,
            transcripts,
            filings,
        ) = tokio::join!(
            self.provider.metrics(ticker),
            self.provider.earnings_history(ticker, 4),
            self.provider.technical_indicators(ticker),
            self.provider.sentiment(ticker),
            self.provider.insider_activity(ticker, 5),
            self.provider.institutional_holdings(ticker, 5),
            self.provider
                .search_analyst_reports(&report_query, Some(ticker), 5),
            self.provider
                .search_earnings_transcripts(&transcript_query, Some(ticker), 3),
            self.provider
                .search_sec_filings(&filing_query, Some(ticker), 3),
        );

        resolve(metrics, "metrics", &mut bundle.metrics, Record::len, &mut errors, &mut events);
        resolve(
            earnings,
            "earnings history",
            &mut bundle.earnings_history,
            Vec::len,
            &mut errors,
            &mut events,
        );
        resolve(
            technicals,
            "technical indicators",
            &mut bundle.technical_indicators,
            Record::len,
            &mut errors,
            &mut events,
        );
        resolve(sentiment, "sentiment", &mut bundle.sentiment, Record::len, &mut errors, &mut events);
        resolve(
            insiders,
            "insider activity",
            &mut bundle.insider_activity,
            Vec::len,
            &mut errors,
            &mut events,
        );
        resolve(
            institutions,
            "institutional holdings",
            &mut bundle.institutional_holdings,
            Vec::len,
            &mut errors,
            &mut events,
        );
        resolve(
            reports,
            "analyst reports",
            &mut bundle.analyst_reports,
            Vec::len,
            &mut errors,
            &mut events,
        );
        resolve(
            transcripts,
            "earnings transcripts",
            &mut bundle.earnings_transcripts,
            Vec::len,
            &mut errors,
            &mut events,
        );
        resolve(
            filings,
            "sec filings",
            &mut bundle.sec_filings,
            Vec::len,
            &mut errors,
            &mut events,
        );

        if let Some(name) = bundle.metrics.get("COMPANY_NAME").and_then(|v| v.as_str()) {
            bundle.company_name = name.to_string();
        }

        for detail in self.provider.drain_query_log() {
            events.push(DebateEvent::ProviderQuery {
                detail,
                timestamp: Utc::now(),
            });
        }

        debug!(
            ticker,
            populated = bundle.populated_categories(),
            failed = errors.len(),
            "research stage complete"
        );

        let mut delta = TurnDelta::route(Actor::Bull);
        delta.evidence = Some(bundle);
        delta.errors = errors;
        delta.events = events;
        Ok(delta)
    }
}

/// Reqwest-backed provider for a research REST service.
///
/// Structured categories are plain GETs; document collections are searched
/// through one POST endpoint per collection. Every request is appended to
/// an internal query log surfaced through [`ResearchProvider::drain_query_log`].
pub struct HttpResearchProvider {
    config: ResearchConfig,
    client: reqwest::Client,
    query_log: Mutex<Vec<serde_json::Value>>,
}

impl HttpResearchProvider {
    pub fn new(config: ResearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self {
            config,
            client,
            query_log: Mutex::new(Vec::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ResearchConfig::default())
    }

    fn log_query(&self, detail: serde_json::Value) {
        if let Ok(mut log) = self.query_log.lock() {
            log.push(detail);
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ResearchError> {
        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.get(&url);
        if let Some(ref key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResearchError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            self.log_query(serde_json::json!({"path": path, "status": status}));
            return Err(ResearchError::ServiceError { status, body });
        }

        self.log_query(serde_json::json!({"path": path, "status": 200}));
        response
            .json()
            .await
            .map_err(|e| ResearchError::MalformedResponse(e.to_string()))
    }

    fn as_record(value: serde_json::Value) -> Result<Record, ResearchError> {
        serde_json::from_value(value)
            .map_err(|e| ResearchError::MalformedResponse(e.to_string()))
    }

    fn as_records(value: serde_json::Value) -> Result<Vec<Record>, ResearchError> {
        serde_json::from_value(value)
            .map_err(|e| ResearchError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl ResearchProvider for HttpResearchProvider {
    async fn metrics(&self, ticker: &str) -> Result<Record, ResearchError> {
        Self::as_record(self.get_json(&format!("/research/{ticker}/metrics")).await?)
    }

    async fn earnings_history(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Self::as_records(
            self.get_json(&format!("/research/{ticker}/earnings?limit={limit}"))
                .await?,
        )
    }

    async fn technical_indicators(&self, ticker: &str) -> Result<Record, ResearchError> {
        Self::as_record(self.get_json(&format!("/research/{ticker}/technicals")).await?)
    }

    async fn sentiment(&self, ticker: &str) -> Result<Record, ResearchError> {
        Self::as_record(self.get_json(&format!("/research/{ticker}/sentiment")).await?)
    }

    async fn insider_activity(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Self::as_records(
            self.get_json(&format!("/research/{ticker}/insiders?limit={limit}"))
                .await?,
        )
    }

    async fn institutional_holdings(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Self::as_records(
            self.get_json(&format!("/research/{ticker}/institutions?limit={limit}"))
                .await?,
        )
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        ticker: Option<&str>,
        limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        let url = format!(
            "{}/search/{collection}",
            self.config.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "query": query,
            "ticker": ticker,
            "limit": limit,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResearchError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            self.log_query(serde_json::json!({
                "collection": collection, "query": query, "status": status,
            }));
            return Err(ResearchError::ServiceError { status, body: text });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ResearchError::MalformedResponse(e.to_string()))?;

        let rows = payload
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        self.log_query(serde_json::json!({
            "collection": collection, "query": query, "status": 200, "results": rows.len(),
        }));

        let excerpts = rows
            .into_iter()
            .map(|row| {
                let mut fields: Record = serde_json::from_value(row).unwrap_or_default();
                DocumentExcerpt {
                    source: take_str(&mut fields, &["source", "FIRM", "FILING_TYPE"]),
                    title: take_str(&mut fields, &["title", "REPORT_TITLE", "FILING_DESCRIPTION"]),
                    content: take_str(
                        &mut fields,
                        &["content", "REPORT_CONTENT", "TRANSCRIPT_CONTENT", "FILING_CONTENT"],
                    ),
                    fields,
                }
            })
            .collect();

        Ok(excerpts)
    }

    fn drain_query_log(&self) -> Vec<serde_json::Value> {
        self.query_log
            .lock()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }
}

/// Remove the first present key from a record, returning its string form.
fn take_str(fields: &mut Record, keys: &[&str]) -> String {
    for key in keys {
        if let Some(value) = fields.remove(*key) {
            return match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
        }
    }
    String::new()
}
