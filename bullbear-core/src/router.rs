//! Debate driver — the generic loop that walks the routing cursor.
//!
//! # Session flow
//!
//! ```text
//! Research → Bull → Bear → Moderator ─┬─ rounds left → Bull (next round)
//!                                     └─ limit hit   → Judge → End
//! ```
//!
//! The driver holds no branching logic: each participant returns a tagged
//! routing decision in its [`TurnDelta`], and the driver merges deltas —
//! records append, scalars overwrite — until the cursor reaches `End`. A
//! hard step ceiling derived from the round limit fails the session closed
//! if the routing rules are ever miswired.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::DebateConfig;
use crate::error::EngineError;
use crate::events::{DebateEvent, DiagnosticsSink};
use crate::oracle::ReasoningOracle;
use crate::participants::{Advocate, Judge, Moderator, Participant, TurnDelta};
use crate::research::{ResearchProvider, ResearchStage};
use crate::state::{Actor, SessionState};

/// One completed turn, for progressive display.
#[derive(Debug, Clone)]
pub struct TurnUpdate {
    /// Which station ran.
    pub actor: Actor,
    /// The participant's stable name.
    pub participant: &'static str,
    /// The merged delta, as reported by the participant.
    pub delta: TurnDelta,
}

/// Items yielded by the streaming entry point.
#[derive(Debug)]
pub enum SessionUpdate {
    /// A turn completed and was merged.
    Turn(TurnUpdate),
    /// The session reached its terminal state.
    Finished(Box<SessionState>),
    /// The session aborted; the state is left as of the last merged turn.
    Failed(EngineError),
}

/// The debate session driver.
pub struct Debate {
    state: SessionState,
    config: DebateConfig,
    research: Box<dyn Participant>,
    bull: Box<dyn Participant>,
    bear: Box<dyn Participant>,
    moderator: Box<dyn Participant>,
    judge: Box<dyn Participant>,
    sink: DiagnosticsSink,
    steps: u32,
}

impl Debate {
    /// Wire a session against an oracle and a research provider.
    pub fn new(
        oracle: Arc<dyn ReasoningOracle>,
        provider: Arc<dyn ResearchProvider>,
        ticker: &str,
        question: Option<&str>,
        config: DebateConfig,
    ) -> Self {
        let state = SessionState::new(ticker, question, config.round_limit);
        Self::with_participants(
            state,
            config,
            Box::new(ResearchStage::new(provider)),
            Box::new(Advocate::bull(oracle.clone())),
            Box::new(Advocate::bear(oracle.clone())),
            Box::new(Moderator::new(oracle.clone())),
            Box::new(Judge::new(oracle)),
        )
    }

    /// Bind explicit participants to the routing graph. The driver treats
    /// them uniformly; tests use this to inject deliberately broken ones.
    pub fn with_participants(
        state: SessionState,
        config: DebateConfig,
        research: Box<dyn Participant>,
        bull: Box<dyn Participant>,
        bear: Box<dyn Participant>,
        moderator: Box<dyn Participant>,
        judge: Box<dyn Participant>,
    ) -> Self {
        Self {
            state,
            config,
            research,
            bull,
            bear,
            moderator,
            judge,
            sink: DiagnosticsSink::new(),
            steps: 0,
        }
    }

    /// Current session snapshot.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Consume the driver, returning the final state.
    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Drain accumulated diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<DebateEvent> {
        self.sink.take()
    }

    /// Steps executed so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    fn participant_for(&self, actor: Actor) -> Option<&dyn Participant> {
        match actor {
            Actor::Research => Some(self.research.as_ref()),
            Actor::Bull => Some(self.bull.as_ref()),
            Actor::Bear => Some(self.bear.as_ref()),
            Actor::Moderator => Some(self.moderator.as_ref()),
            Actor::Judge => Some(self.judge.as_ref()),
            Actor::End => None,
        }
    }

    /// Run one turn and merge its delta. Returns `None` once terminal.
    pub async fn step(&mut self) -> Result<Option<TurnUpdate>, EngineError> {
        let actor = self.state.next_actor;
        if actor.is_terminal() {
            return Ok(None);
        }

        let ceiling = self.config.step_ceiling();
        if self.steps >= ceiling {
            warn!(steps = self.steps, ceiling, "step ceiling hit, failing closed");
            return Err(EngineError::RoutingExhausted {
                steps: self.steps,
                ceiling,
            });
        }
        self.steps += 1;

        let (name, delta) = {
            let Some(participant) = self.participant_for(actor) else {
                return Ok(None);
            };
            (participant.name(), participant.act(&self.state).await?)
        };
        let update = TurnUpdate {
            actor,
            participant: name,
            delta: delta.clone(),
        };
        self.apply(delta);

        self.sink.record(DebateEvent::TurnCompleted {
            actor,
            arguments_added: update.delta.arguments.len(),
            fact_checks_added: update.delta.fact_checks.len(),
            next_actor: self.state.next_actor,
            round_index: self.state.round_index,
            timestamp: chrono::Utc::now(),
        });
        info!(actor = %actor, status = %self.state.status_line(), "turn merged");

        Ok(Some(update))
    }

    /// Additive merge for records, overwrite for scalars.
    fn apply(&mut self, delta: TurnDelta) {
        let TurnDelta {
            arguments,
            fact_checks,
            evidence,
            verdict,
            round_index,
            next_actor,
            errors,
            events,
        } = delta;

        self.state.arguments.extend(arguments);
        self.state.fact_checks.extend(fact_checks);
        self.state.errors.extend(errors);
        if let Some(bundle) = evidence {
            self.state.evidence = Some(bundle);
        }
        if let Some(verdict) = verdict {
            self.state.verdict = Some(verdict);
        }
        if let Some(round) = round_index {
            self.state.round_index = round;
        }
        if let Some(next) = next_actor {
            self.state.next_actor = next;
        }
        for event in events {
            self.sink.record(event);
        }
    }

    /// Drive the session to its terminal state.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.sink.record(DebateEvent::SessionStarted {
            session_id: self.state.id.clone(),
            ticker: self.state.ticker.clone(),
            round_limit: self.state.round_limit,
            timestamp: chrono::Utc::now(),
        });

        while self.step().await?.is_some() {}

        self.sink.record(DebateEvent::SessionFinished {
            session_id: self.state.id.clone(),
            steps: self.steps,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Streaming variant: yields one update per completed turn, then a
    /// terminal `Finished` (or `Failed`) item carrying the final state.
    pub fn into_stream(mut self) -> mpsc::Receiver<SessionUpdate> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            loop {
                match self.step().await {
                    Ok(Some(update)) => {
                        if tx.send(SessionUpdate::Turn(update)).await.is_err() {
                            return;
                        }
                    }
                    Ok(None) => {
                        let _ = tx
                            .send(SessionUpdate::Finished(Box::new(self.into_state())))
                            .await;
                        return;
                    }
                    Err(e) => {
                        let _ = tx.send(SessionUpdate::Failed(e)).await;
                        return;
                    }
                }
            }
        });
        rx
    }
}

/// Convenience entry point: run a full session and return the final state.
pub async fn run_debate(
    oracle: Arc<dyn ReasoningOracle>,
    provider: Arc<dyn ResearchProvider>,
    ticker: &str,
    question: Option<&str>,
    round_limit: u32,
) -> Result<SessionState, EngineError> {
    let mut debate = Debate::new(oracle, provider, ticker, question, DebateConfig { round_limit });
    debate.run().await?;
    Ok(debate.into_state())
}
