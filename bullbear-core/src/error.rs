//! Engine error taxonomy.
//!
//! Category (a) of the failure model — per-category research fetch errors —
//! never surfaces here: those are recorded as descriptor strings on the
//! session and the run continues. Everything below terminates the run.

use thiserror::Error;

use crate::oracle::OracleError;

/// Fatal errors from the debate engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An oracle call failed during a participant's turn. The participant
    /// name identifies which turn broke.
    #[error("oracle call failed during {participant} turn: {source}")]
    Oracle {
        participant: &'static str,
        #[source]
        source: OracleError,
    },

    /// The router exceeded its step ceiling — the routing rules are
    /// miswired. Reported distinctly from oracle failures so operators can
    /// tell "oracle broke" from "routing broke".
    #[error("routing exhausted: {steps} steps without reaching a verdict (ceiling {ceiling})")]
    RoutingExhausted { steps: u32, ceiling: u32 },
}

impl EngineError {
    /// Wrap an oracle failure with the turn it happened in.
    pub fn oracle(participant: &'static str, source: OracleError) -> Self {
        Self::Oracle {
            participant,
            source,
        }
    }
}
