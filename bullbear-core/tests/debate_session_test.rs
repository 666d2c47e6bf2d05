//! Mocked debate integration tests — full session loops with deterministic
//! oracle and provider stand-ins (no network calls).
//!
//! Covers: router ↔ participants ↔ parser ↔ research isolation running
//! together, the streaming entry point, and abort behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use bullbear_core::evidence::Record;
use bullbear_core::{
    run_debate, Actor, Debate, DebateConfig, DocumentExcerpt, EngineError, OracleError,
    Recommendation, ReasoningOracle, ResearchError, ResearchProvider, SessionUpdate, Speaker,
};

/// Oracle that returns the same canned text for every call and counts calls.
struct CannedOracle {
    response: String,
    calls: AtomicUsize,
}

impl CannedOracle {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl ReasoningOracle for CannedOracle {
    async fn complete(
        &self,
        _prompt: &str,
        _role_instruction: Option<&str>,
    ) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Oracle that fails after a configured number of successful calls.
struct FlakyOracle {
    succeed_for: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ReasoningOracle for FlakyOracle {
    async fn complete(
        &self,
        _prompt: &str,
        _role_instruction: Option<&str>,
    ) -> Result<String, OracleError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.succeed_for {
            Ok("ARGUMENT: fine\nCONFIDENCE: 0.7".to_string())
        } else {
            Err(OracleError::RequestFailed("connection reset".into()))
        }
    }
}

/// Provider whose every category resolves empty.
struct EmptyProvider;

#[async_trait]
impl ResearchProvider for EmptyProvider {
    async fn metrics(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(Record::new())
    }
    async fn earnings_history(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Ok(Vec::new())
    }
    async fn technical_indicators(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(Record::new())
    }
    async fn sentiment(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(Record::new())
    }
    async fn insider_activity(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Ok(Vec::new())
    }
    async fn institutional_holdings(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Ok(Vec::new())
    }
    async fn search(
        &self,
        _collection: &str,
        _query: &str,
        _ticker: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        Ok(Vec::new())
    }
}

/// Provider that serves data everywhere except earnings history.
struct NoEarningsProvider;

fn one_record(key: &str, value: &str) -> Record {
    let mut record = Record::new();
    record.insert(key.to_string(), serde_json::Value::String(value.into()));
    record
}

#[async_trait]
impl ResearchProvider for NoEarningsProvider {
    async fn metrics(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(one_record("COMPANY_NAME", "XYZ Corp"))
    }
    async fn earnings_history(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Err(ResearchError::ServiceError {
            status: 503,
            body: "earnings store offline".into(),
        })
    }
    async fn technical_indicators(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(one_record("RSI_14", "55"))
    }
    async fn sentiment(&self, _ticker: &str) -> Result<Record, ResearchError> {
        Ok(one_record("OVERALL_SENTIMENT", "Neutral"))
    }
    async fn insider_activity(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Ok(vec![one_record("INSIDER_NAME", "J. Doe")])
    }
    async fn institutional_holdings(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, ResearchError> {
        Ok(vec![one_record("INSTITUTION_NAME", "Big Fund")])
    }
    async fn search(
        &self,
        collection: &str,
        _query: &str,
        _ticker: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<DocumentExcerpt>, ResearchError> {
        Ok(vec![DocumentExcerpt {
            source: collection.to_string(),
            title: "doc".into(),
            content: "excerpt".into(),
            fields: Record::new(),
        }])
    }
}

// ── Reference scenario: one round, empty provider, empty oracle ────────

#[tokio::test]
async fn single_round_session_reaches_verdict() {
    let state = run_debate(
        Arc::new(CannedOracle::empty()),
        Arc::new(EmptyProvider),
        "xyz",
        None,
        1,
    )
    .await
    .unwrap();

    assert_eq!(state.ticker, "XYZ");
    assert_eq!(state.next_actor, Actor::End);
    assert_eq!(state.round_index, 1);

    // Bull, bear, and the moderator summary; the judge adds no argument.
    assert_eq!(state.arguments.len(), 3);
    assert_eq!(state.arguments[0].speaker, Speaker::Bull);
    assert_eq!(state.arguments[1].speaker, Speaker::Bear);
    assert_eq!(state.arguments[2].speaker, Speaker::Moderator);

    // Both advocate arguments were fact-checked.
    assert_eq!(state.fact_checks.len(), 2);
    assert_eq!(state.fact_checks[0].subject_speaker, Speaker::Bull);
    assert_eq!(state.fact_checks[1].subject_speaker, Speaker::Bear);

    // Empty oracle text falls back to the documented defaults.
    let verdict = state.verdict.expect("terminal state carries a verdict");
    assert_eq!(verdict.recommendation, Recommendation::Hold);
    assert_eq!(verdict.confidence, 0.5);
    assert_eq!(verdict.bull_score, 50.0);
    assert_eq!(verdict.bear_score, 50.0);
    assert!(!verdict.key_factors.is_empty());
    assert!(!verdict.risks.is_empty());
}

// ── Multi-round accounting ─────────────────────────────────────────────

#[tokio::test]
async fn three_round_session_accumulates_history() {
    let oracle = Arc::new(CannedOracle::new(
        "ARGUMENT: case\nEVIDENCE: data point\nCONFIDENCE: 0.8",
    ));
    let state = run_debate(oracle.clone(), Arc::new(EmptyProvider), "NVDA", None, 3)
        .await
        .unwrap();

    assert_eq!(state.round_index, 3);
    assert_eq!(state.next_actor, Actor::End);

    // Three arguments per round: bull, bear, moderator summary.
    assert_eq!(state.arguments.len(), 9);
    assert!(state.arguments.len() >= 2 * state.round_index.min(state.round_limit) as usize);

    // Two fact-checks per moderator turn.
    assert_eq!(state.fact_checks.len(), 6);
    assert!(state.verdict.is_some());

    // 3 bull + 3 bear + 3 moderator turns of (1 summary + 2 checks) + judge.
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 16);

    // Fact-check subjects always refer to arguments appended earlier.
    for check in &state.fact_checks {
        assert!(state
            .arguments
            .iter()
            .any(|a| a.speaker == check.subject_speaker));
    }
}

#[tokio::test]
async fn advocates_alternate_between_opening_and_rebuttal() {
    let oracle = Arc::new(CannedOracle::new("ARGUMENT: steady\nCONFIDENCE: 0.6"));
    let state = run_debate(oracle, Arc::new(EmptyProvider), "NVDA", None, 2)
        .await
        .unwrap();

    let speakers: Vec<Speaker> = state.arguments.iter().map(|a| a.speaker).collect();
    assert_eq!(
        speakers,
        vec![
            Speaker::Bull,
            Speaker::Bear,
            Speaker::Moderator,
            Speaker::Bull,
            Speaker::Bear,
            Speaker::Moderator,
        ]
    );
}

// ── Evidence isolation ─────────────────────────────────────────────────

#[tokio::test]
async fn failed_earnings_category_degrades_to_empty() {
    let state = run_debate(
        Arc::new(CannedOracle::empty()),
        Arc::new(NoEarningsProvider),
        "XYZ",
        None,
        1,
    )
    .await
    .unwrap();

    let bundle = state.evidence.expect("research stage always sets evidence");
    assert!(bundle.earnings_history.is_empty());
    assert_eq!(bundle.populated_categories(), 8);
    assert_eq!(bundle.company_name, "XYZ Corp");

    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].contains("earnings history"));
    // The session still ran to completion.
    assert!(state.verdict.is_some());
}

// ── Oracle failure aborts the session ──────────────────────────────────

#[tokio::test]
async fn oracle_failure_aborts_and_names_the_turn() {
    // Research succeeds, bull succeeds, bear's call fails.
    let oracle = Arc::new(FlakyOracle {
        succeed_for: 1,
        calls: AtomicUsize::new(0),
    });
    let mut debate = Debate::new(
        oracle,
        Arc::new(EmptyProvider),
        "XYZ",
        None,
        DebateConfig { round_limit: 2 },
    );

    let err = debate.run().await.unwrap_err();
    match err {
        EngineError::Oracle { participant, .. } => assert_eq!(participant, "bear"),
        other => panic!("expected oracle abort, got {other}"),
    }

    // The bull's merged turn survives; no verdict was issued.
    assert_eq!(debate.state().arguments.len(), 1);
    assert!(debate.state().verdict.is_none());
    assert!(!debate.state().is_complete());
}

// ── Streaming entry point ──────────────────────────────────────────────

#[tokio::test]
async fn streaming_yields_each_turn_then_final_state() {
    let debate = Debate::new(
        Arc::new(CannedOracle::empty()),
        Arc::new(EmptyProvider),
        "XYZ",
        None,
        DebateConfig { round_limit: 1 },
    );

    let mut rx = debate.into_stream();
    let mut turn_names = Vec::new();
    let mut final_state = None;

    while let Some(update) = rx.recv().await {
        match update {
            SessionUpdate::Turn(turn) => turn_names.push(turn.participant),
            SessionUpdate::Finished(state) => final_state = Some(state),
            SessionUpdate::Failed(e) => panic!("session failed: {e}"),
        }
    }

    assert_eq!(
        turn_names,
        vec!["research", "bull", "bear", "moderator", "judge"]
    );
    let state = final_state.expect("stream ends with the final state");
    assert_eq!(state.next_actor, Actor::End);
    assert!(state.verdict.is_some());
}

#[tokio::test]
async fn streaming_surfaces_failures() {
    let debate = Debate::new(
        Arc::new(FlakyOracle {
            succeed_for: 0,
            calls: AtomicUsize::new(0),
        }),
        Arc::new(EmptyProvider),
        "XYZ",
        None,
        DebateConfig { round_limit: 1 },
    );

    let mut rx = debate.into_stream();
    let mut saw_failure = false;
    while let Some(update) = rx.recv().await {
        if let SessionUpdate::Failed(EngineError::Oracle { participant, .. }) = update {
            assert_eq!(participant, "bull");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

// ── Export shape ───────────────────────────────────────────────────────

#[tokio::test]
async fn export_is_flat_and_serializable() {
    let state = run_debate(
        Arc::new(CannedOracle::new("ARGUMENT: case\nCONFIDENCE: 0.8")),
        Arc::new(EmptyProvider),
        "nvda",
        Some("Is NVDA a buy at these levels?"),
        1,
    )
    .await
    .unwrap();

    let export = state.export();
    assert_eq!(export.ticker, "NVDA");
    assert_eq!(export.question, "Is NVDA a buy at these levels?");
    assert_eq!(export.arguments.len(), state.arguments.len());
    assert!(export.verdict.is_some());

    let json = serde_json::to_value(&export).unwrap();
    assert!(json.get("ticker").is_some());
    assert!(json["arguments"][0].get("speaker").is_some());
    assert!(json["arguments"][0].get("content").is_some());
    // The flat record carries no evidence payloads.
    assert!(json.get("evidence").is_none());
}

// ── Diagnostics ────────────────────────────────────────────────────────

#[tokio::test]
async fn diagnostics_record_turns_without_polluting_state() {
    let mut debate = Debate::new(
        Arc::new(CannedOracle::empty()),
        Arc::new(EmptyProvider),
        "XYZ",
        None,
        DebateConfig { round_limit: 1 },
    );
    debate.run().await.unwrap();

    let events = debate.take_diagnostics();
    // Session start/finish, nine category fetches, and five turns.
    assert!(events.len() >= 16);
    // Error descriptors stay empty — diagnostics live in the sink.
    assert!(debate.state().errors.is_empty());
}
