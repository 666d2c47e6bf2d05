//! Debate participants — the four turn-taking behaviors plus the shared
//! contract they implement.
//!
//! A participant receives a snapshot of the session, performs its oracle
//! calls, and returns a [`TurnDelta`]: records to append, scalars to
//! overwrite, and the tagged routing decision naming the next actor. All
//! branching lives here; the driver loop in [`crate::router`] only merges.

pub mod advocate;
pub mod judge;
pub mod moderator;

pub use advocate::Advocate;
pub use judge::Judge;
pub use moderator::Moderator;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::events::DebateEvent;
use crate::evidence::EvidenceBundle;
use crate::state::{Actor, Argument, FactCheck, SessionState, Verdict};

/// One turn's worth of session changes.
///
/// Record collections are merged additively; `evidence`, `verdict`, and
/// `round_index` overwrite when set; `next_actor` always overwrites.
#[derive(Debug, Clone, Default)]
pub struct TurnDelta {
    pub arguments: Vec<Argument>,
    pub fact_checks: Vec<FactCheck>,
    pub evidence: Option<EvidenceBundle>,
    pub verdict: Option<Verdict>,
    pub round_index: Option<u32>,
    pub next_actor: Option<Actor>,
    /// Non-fatal error descriptors to append to the session.
    pub errors: Vec<String>,
    /// Diagnostics for the driver's sink; never merged into domain state.
    pub events: Vec<DebateEvent>,
}

impl TurnDelta {
    /// Empty delta routing to `next`.
    pub fn route(next: Actor) -> Self {
        Self {
            next_actor: Some(next),
            ..Self::default()
        }
    }
}

/// Shared shape of every turn-taking step, the research stage included.
#[async_trait]
pub trait Participant: Send + Sync {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Run one turn against a state snapshot.
    async fn act(&self, state: &SessionState) -> Result<TurnDelta, EngineError>;
}
