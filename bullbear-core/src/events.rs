//! Diagnostics events — the typed side-channel for observability.
//!
//! Query logs and turn telemetry are kept out of the domain state; the
//! driver owns a [`DiagnosticsSink`] and records events into it. Only the
//! session's own `errors` descriptor strings live on the domain state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::Actor;

/// Diagnostic events emitted while a session runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    /// A session started.
    SessionStarted {
        session_id: String,
        ticker: String,
        round_limit: u32,
        timestamp: DateTime<Utc>,
    },

    /// One participant turn completed.
    TurnCompleted {
        actor: Actor,
        arguments_added: usize,
        fact_checks_added: usize,
        next_actor: Actor,
        round_index: u32,
        timestamp: DateTime<Utc>,
    },

    /// One research category resolved (successfully or not).
    CategoryFetched {
        category: String,
        ok: bool,
        items: usize,
        timestamp: DateTime<Utc>,
    },

    /// Opaque pass-through from the research provider's query log. Not
    /// interpreted by the engine.
    ProviderQuery {
        detail: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// The session reached its terminal state.
    SessionFinished {
        session_id: String,
        steps: u32,
        timestamp: DateTime<Utc>,
    },
}

/// Append-only collector for [`DebateEvent`]s.
#[derive(Debug, Default)]
pub struct DiagnosticsSink {
    events: Vec<DebateEvent>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    pub fn record(&mut self, event: DebateEvent) {
        self.events.push(event);
    }

    /// All recorded events in order.
    pub fn events(&self) -> &[DebateEvent] {
        &self.events
    }

    /// Drain the recorded events, leaving the sink empty.
    pub fn take(&mut self) -> Vec<DebateEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accumulates_in_order() {
        let mut sink = DiagnosticsSink::new();
        sink.record(DebateEvent::SessionStarted {
            session_id: "s-1".into(),
            ticker: "NVDA".into(),
            round_limit: 3,
            timestamp: Utc::now(),
        });
        sink.record(DebateEvent::CategoryFetched {
            category: "metrics".into(),
            ok: true,
            items: 1,
            timestamp: Utc::now(),
        });
        assert_eq!(sink.events().len(), 2);
        let drained = sink.take();
        assert_eq!(drained.len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn events_serialize_tagged() {
        let event = DebateEvent::TurnCompleted {
            actor: Actor::Bull,
            arguments_added: 1,
            fact_checks_added: 0,
            next_actor: Actor::Bear,
            round_index: 0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"turn_completed\""));
        assert!(json.contains("\"actor\":\"bull\""));
    }
}
